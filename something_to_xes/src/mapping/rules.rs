use tracing::trace;

use super::{attribute_name::AttributeName, template::Template};
use crate::{error::ConversionError, record::Record};

///
/// A mapping rule deriving one output attribute from raw record fields
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    /// Output attribute
    pub target: AttributeName,
    /// Template producing the raw attribute value
    pub template: Template,
}

impl MappingRule {
    /// Create a mapping rule from an attribute name spec (e.g., `concept:name`) and a template string
    pub fn parse(target: &str, template: &str) -> Result<Self, ConversionError> {
        Ok(Self {
            target: AttributeName::parse(target),
            template: Template::compile(template)?,
        })
    }
}

///
/// Evaluates a set of [`MappingRule`]s against records
///
/// Each rule is evaluated independently: a rule referencing a missing field is skipped without
/// affecting the other rules.
///
/// Rules are kept in declaration order. Adding a rule for an already present target replaces
/// the template of the existing rule but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct AttributeMapper {
    rules: Vec<MappingRule>,
}

impl AttributeMapper {
    /// Mapper with the given rules (see [`AttributeMapper::add_rule`] for duplicate targets)
    pub fn new(rules: impl IntoIterator<Item = MappingRule>) -> Self {
        let mut mapper = Self::default();
        for r in rules {
            mapper.add_rule(r);
        }
        mapper
    }

    /// Add a rule; a rule for the same target replaces the earlier rule in place
    pub fn add_rule(&mut self, rule: MappingRule) {
        match self.rules.iter_mut().find(|r| r.target == rule.target) {
            Some(existing) => existing.template = rule.template,
            None => self.rules.push(rule),
        }
    }

    /// All rules in declaration order
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Whether there are no rules at all
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate all rules against `record`
    ///
    /// Returns the `(target, raw value)` pairs of every rule whose template could be evaluated.
    pub fn map<'a>(&'a self, record: &Record) -> Vec<(&'a AttributeName, String)> {
        self.rules
            .iter()
            .filter_map(|r| match r.template.evaluate(record) {
                Some(v) => Some((&r.target, v)),
                None => {
                    trace!(attribute = %r.target, template = %r.template, "Rule skipped: referenced field missing");
                    None
                }
            })
            .collect()
    }

    /// Extension prefixes referenced by the rules (first reference order, without duplicates)
    pub fn referenced_prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = Vec::new();
        for p in self.rules.iter().filter_map(|r| r.target.prefix.as_deref()) {
            if !prefixes.contains(&p) {
                prefixes.push(p);
            }
        }
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeMapper, MappingRule};
    use crate::{mapping::AttributeName, record};

    fn mapper(rules: &[(&str, &str)]) -> AttributeMapper {
        AttributeMapper::new(
            rules
                .iter()
                .map(|(t, v)| MappingRule::parse(t, v).unwrap()),
        )
    }

    #[test]
    fn test_rules_are_independent() {
        let m = mapper(&[
            ("concept:name", "%(activity)s"),
            ("org:resource", "%(user)s"),
            ("note", "fixed"),
        ]);
        let res = m.map(&record! {"activity" => "Register"});
        assert_eq!(
            res,
            vec![
                (&AttributeName::parse("concept:name"), "Register".to_string()),
                (&AttributeName::bare("note"), "fixed".to_string()),
            ]
        );
    }

    #[test]
    fn test_redeclared_target_keeps_position() {
        let m = mapper(&[
            ("concept:name", "%(a)s"),
            ("org:resource", "%(user)s"),
            ("concept:name", "%(b)s"),
        ]);
        assert_eq!(m.rules().len(), 2);
        assert_eq!(m.rules()[0].template.source(), "%(b)s");
        assert_eq!(m.referenced_prefixes(), vec!["concept", "org"]);
    }
}
