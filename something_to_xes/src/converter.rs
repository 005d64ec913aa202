use tracing::{debug, info};

use crate::{
    config::ConversionOptions,
    error::ConversionError,
    extensions::{Extension, ExtensionRegistry, CONCEPT_PREFIX},
    mapping::{AttributeMapper, AttributeName, MappingRule, Template, TraceRouter},
    pseudonym::{PseudonymContext, Pseudonymizer},
    record::{Record, RecordResult},
    typing::{TypeRegistry, TypedValue},
    xes::document::{TypedAttribute, XESDocument, XESEvent, XESTrace},
};

/// Key of the trace name attribute
pub const TRACE_NAME_KEY: &str = "concept:name";

fn is_trace_name(name: &AttributeName) -> bool {
    name.is(CONCEPT_PREFIX, "name")
}

///
/// Converts a sequence of records into an [`XESDocument`]
///
/// Conversion runs in two passes: all records are first pseudonymized and routed into their
/// traces; afterwards the (possibly truncated) trace table is mapped, typed and assembled.
///
/// All configuration errors (malformed templates, unknown extension prefixes, conflicting
/// type or extension declarations) are reported by [`Converter::new`].
///
/// ```rust
/// use something_to_xes::{record, ConversionOptions, Converter};
/// let options = ConversionOptions::default()
///     .with_trace_key("%(case)s")
///     .with_event_mapping("concept:name", "%(activity)s");
/// let mut converter = Converter::new(options).unwrap();
/// let doc = converter
///     .convert(vec![
///         Ok(record! {"case" => "1", "activity" => "Register"}),
///         Ok(record! {"case" => "2", "activity" => "Register"}),
///         Ok(record! {"case" => "1", "activity" => "Approve"}),
///     ])
///     .unwrap();
/// assert_eq!(doc.traces.len(), 2);
/// assert_eq!(doc.traces[0].events.len(), 2);
/// ```
#[derive(Debug)]
pub struct Converter {
    key_templates: Vec<Template>,
    trace_mapper: AttributeMapper,
    event_mapper: AttributeMapper,
    types: TypeRegistry,
    extensions: Vec<Extension>,
    pseudonymizer: Pseudonymizer,
    preserve: bool,
    max_traces: Option<usize>,
    date_format: Option<String>,
}

impl Converter {
    ///
    /// Create a converter, validating the configuration
    ///
    pub fn new(options: ConversionOptions) -> Result<Self, ConversionError> {
        let mut registry = ExtensionRegistry::default();
        for ext in options.extensions {
            registry.register(ext)?;
        }

        let mut types = TypeRegistry::default();
        for (name, elementary_type) in options.types {
            types.declare(AttributeName::parse(&name), elementary_type)?;
        }

        let mut event_mapper = AttributeMapper::default();
        for (name, template) in &options.event_mappings {
            event_mapper.add_rule(MappingRule::parse(name, template)?);
        }

        let mut key_templates = Vec::new();
        let mut trace_mapper = AttributeMapper::default();
        for (name, template) in &options.trace_mappings {
            let rule = MappingRule::parse(name, template)?;
            if is_trace_name(&rule.target) {
                key_templates.push(rule.template);
            } else {
                trace_mapper.add_rule(rule);
            }
        }
        // Most recently declared key template is tried first
        key_templates.reverse();

        let mut used_prefixes: Vec<&str> = event_mapper.referenced_prefixes();
        used_prefixes.extend(trace_mapper.referenced_prefixes());
        let extensions = registry.declarations(used_prefixes)?;

        let context = PseudonymContext::new(options.pseudonym_seed);
        let pseudonymizer = Pseudonymizer::new(options.pseudonymize, context);

        debug!(
            event_rules = event_mapper.rules().len(),
            trace_rules = trace_mapper.rules().len(),
            key_templates = key_templates.len(),
            "Converter configured"
        );
        Ok(Self {
            key_templates,
            trace_mapper,
            event_mapper,
            types,
            extensions,
            pseudonymizer,
            preserve: options.preserve,
            max_traces: options.max_traces,
            date_format: options.date_format,
        })
    }

    /// Extensions declared by every document this converter produces
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// The pseudonymizer (and its context) used by this converter
    pub fn pseudonymizer(&self) -> &Pseudonymizer {
        &self.pseudonymizer
    }

    ///
    /// Convert all records into an [`XESDocument`]
    ///
    /// The first failing record aborts the conversion.
    pub fn convert<I>(&mut self, records: I) -> Result<XESDocument, ConversionError>
    where
        I: IntoIterator<Item = RecordResult>,
    {
        let mut router = TraceRouter::new(self.key_templates.clone());
        let mut members: Vec<Vec<Record>> = Vec::new();
        let mut num_records = 0;
        for record in records {
            let mut record = record?;
            self.pseudonymizer.apply(&mut record)?;
            let trace_index = router.route(&record);
            if trace_index == members.len() {
                members.push(Vec::new());
            }
            members[trace_index].push(record);
            num_records += 1;
        }
        let keys = router.into_keys();
        let num_discovered = keys.len();
        info!(
            records = num_records,
            traces = num_discovered,
            "Routed records into traces"
        );

        let limit = self.max_traces.unwrap_or(usize::MAX);
        if num_discovered > limit {
            info!(
                max_traces = limit,
                dropped = num_discovered - limit,
                "Truncating to the first traces"
            );
        }
        let traces = keys
            .into_iter()
            .zip(members)
            .take(limit)
            .map(|(key, records)| self.assemble_trace(key, &records))
            .collect::<Result<Vec<_>, _>>()?;

        let document = XESDocument {
            extensions: self.extensions.clone(),
            traces,
        };
        info!(
            traces = document.traces.len(),
            events = document.num_events(),
            "Assembled document"
        );
        Ok(document)
    }

    /// Derive the trace-level raw values, checking that all members agree
    fn trace_values(
        &self,
        key: &str,
        records: &[Record],
    ) -> Result<Vec<Option<String>>, ConversionError> {
        let rules = self.trace_mapper.rules();
        let mut values: Vec<Option<String>> = vec![None; rules.len()];
        for record in records {
            for (rule, value) in rules.iter().zip(values.iter_mut()) {
                let Some(derived) = rule.template.evaluate(record) else {
                    continue;
                };
                match value {
                    Some(first) if *first != derived => {
                        return Err(ConversionError::TraceAttributeConflict {
                            trace: key.to_string(),
                            attribute: rule.target.clone(),
                            first: first.clone(),
                            second: derived,
                        });
                    }
                    Some(_) => {}
                    None => *value = Some(derived),
                }
            }
        }
        Ok(values)
    }

    fn encode(
        &self,
        name: &AttributeName,
        raw: &str,
    ) -> Result<Option<TypedAttribute>, ConversionError> {
        Ok(self
            .types
            .encode(name, raw, self.date_format.as_deref())?
            .map(|value| TypedAttribute::for_name(name, value)))
    }

    fn assemble_trace(&self, key: String, records: &[Record]) -> Result<XESTrace, ConversionError> {
        let values = self.trace_values(&key, records)?;
        let mut attributes = vec![TypedAttribute::new(TRACE_NAME_KEY, TypedValue::String(key))];
        for (rule, value) in self.trace_mapper.rules().iter().zip(values) {
            if let Some(raw) = value {
                attributes.extend(self.encode(&rule.target, &raw)?);
            }
        }
        let events = records
            .iter()
            .map(|r| self.assemble_event(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(XESTrace { attributes, events })
    }

    fn assemble_event(&self, record: &Record) -> Result<XESEvent, ConversionError> {
        let mut attributes = Vec::new();
        for (name, raw) in self.event_mapper.map(record) {
            attributes.extend(self.encode(name, &raw)?);
        }
        if self.preserve {
            attributes.extend(record.iter().map(|(field, value)| {
                TypedAttribute::new(field, TypedValue::String(value.unwrap_or_default().to_string()))
            }));
        }
        Ok(XESEvent { attributes })
    }
}

#[cfg(test)]
mod tests {
    use super::Converter;
    use crate::{
        error::ConversionError, pseudonym::PoolKind, record, typing::ElementaryType,
        typing::TypedValue, ConversionOptions,
    };

    #[test]
    fn test_single_default_trace() {
        let mut c = Converter::new(
            ConversionOptions::default().with_event_mapping("concept:name", "%(name)s"),
        )
        .unwrap();
        let doc = c
            .convert(vec![Ok(record! {"name" => "A"}), Ok(record! {"name" => "B"})])
            .unwrap();
        assert_eq!(doc.traces.len(), 1);
        assert_eq!(doc.traces[0].key(), Some(String::new()));
        assert_eq!(doc.traces[0].events.len(), 2);
    }

    #[test]
    fn test_trace_name_rule_routes() {
        let mut c =
            Converter::new(ConversionOptions::default().with_trace_mapping("concept:name", "%(name)s"))
                .unwrap();
        let doc = c
            .convert(vec![Ok(record! {"name" => "X"}), Ok(record! {"name" => "Y"})])
            .unwrap();
        let keys: Vec<_> = doc.traces.iter().filter_map(|t| t.key()).collect();
        assert_eq!(keys, vec!["X".to_string(), "Y".to_string()]);
        assert!(doc.traces.iter().all(|t| t.events.len() == 1));
    }

    #[test]
    fn test_latest_key_template_tried_first() {
        let mut c = Converter::new(
            ConversionOptions::default()
                .with_trace_key("%(case)s")
                .with_trace_key("%(case)s/%(sub)s"),
        )
        .unwrap();
        let doc = c
            .convert(vec![
                Ok(record! {"case" => "1", "sub" => "a"}),
                Ok(record! {"case" => "1"}),
            ])
            .unwrap();
        let keys: Vec<_> = doc.traces.iter().filter_map(|t| t.key()).collect();
        assert_eq!(keys, vec!["1/a".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_float_coercion() {
        let mut c = Converter::new(
            ConversionOptions::default().with_event_mapping("cost:total", "%(amount)s"),
        )
        .unwrap();
        let doc = c
            .convert(vec![
                Ok(record! {"amount" => "12.5"}),
                Ok(record! {"amount" => "abc"}),
            ])
            .unwrap();
        let events = &doc.traces[0].events;
        assert_eq!(
            events[0].get("cost:total").map(|a| &a.value),
            Some(&TypedValue::Float(12.5))
        );
        assert!(events[1].attributes.is_empty());
    }

    #[test]
    fn test_trace_attribute_conflict() {
        let mut c = Converter::new(
            ConversionOptions::default()
                .with_trace_key("%(case)s")
                .with_trace_mapping("org:group", "%(dept)s"),
        )
        .unwrap();
        // A member without the field does not take part in the comparison
        let doc = c
            .convert(vec![
                Ok(record! {"case" => "1", "dept" => "ER"}),
                Ok(record! {"case" => "1"}),
                Ok(record! {"case" => "1", "dept" => "ER"}),
            ])
            .unwrap();
        assert_eq!(
            doc.traces[0].get("org:group").map(|a| &a.value),
            Some(&TypedValue::String("ER".to_string()))
        );

        let res = c.convert(vec![
            Ok(record! {"case" => "1", "dept" => "ER"}),
            Ok(record! {"case" => "1", "dept" => "ICU"}),
        ]);
        match res {
            Err(ConversionError::TraceAttributeConflict {
                trace,
                first,
                second,
                ..
            }) => {
                assert_eq!(trace, "1");
                assert_eq!(first, "ER");
                assert_eq!(second, "ICU");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_prefix_is_rejected() {
        let res = Converter::new(ConversionOptions::default().with_event_mapping("foo:bar", "x"));
        assert!(matches!(res, Err(ConversionError::UnknownExtension(p)) if p == "foo"));
    }

    #[test]
    fn test_type_conflict_is_rejected() {
        let res = Converter::new(
            ConversionOptions::default().with_type("time:timestamp", ElementaryType::Int),
        );
        assert!(matches!(res, Err(ConversionError::TypeConflict { .. })));
    }

    #[test]
    fn test_extension_declarations() {
        let c = Converter::new(
            ConversionOptions::default()
                .with_event_mapping("time:timestamp", "%(ts)s")
                .with_event_mapping("org:resource", "%(user)s")
                .with_trace_mapping("cost:currency", "%(cur)s"),
        )
        .unwrap();
        let prefixes: Vec<&str> = c.extensions().iter().map(|e| e.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["time", "org", "cost", "concept"]);
    }

    #[test]
    fn test_preserve_appends_raw_fields() {
        let mut options = ConversionOptions::default().with_event_mapping("concept:name", "%(a)s");
        options.preserve = true;
        let mut c = Converter::new(options).unwrap();
        let mut r = record! {"a" => "Register", "b" => "2"};
        r.insert("c", None::<String>);
        let doc = c.convert(vec![Ok(r)]).unwrap();
        let keys: Vec<&str> = doc.traces[0].events[0]
            .attributes
            .iter()
            .map(|a| a.key.as_str())
            .collect();
        assert_eq!(keys, vec!["concept:name", "a", "b", "c"]);
        assert_eq!(
            doc.traces[0].events[0].get("c").map(|a| &a.value),
            Some(&TypedValue::String(String::new()))
        );
    }

    #[test]
    fn test_truncation_keeps_discovery_order() {
        let mut options = ConversionOptions::default().with_trace_key("%(case)s");
        options.max_traces = Some(2);
        let mut c = Converter::new(options).unwrap();
        let doc = c
            .convert(
                ["c", "a", "c", "b", "a"]
                    .into_iter()
                    .map(|case| Ok(record! {"case" => case})),
            )
            .unwrap();
        let keys: Vec<_> = doc.traces.iter().filter_map(|t| t.key()).collect();
        assert_eq!(keys, vec!["c".to_string(), "a".to_string()]);
        assert_eq!(doc.traces[0].events.len(), 2);
    }

    #[test]
    fn test_pseudonymized_before_routing() {
        let mut c = Converter::new(
            ConversionOptions::default()
                .with_trace_key("%(patient)s")
                .with_pseudonymized_field("patient", PoolKind::Name),
        )
        .unwrap();
        let doc = c
            .convert(vec![
                Ok(record! {"patient" => "Jens Baggesen"}),
                Ok(record! {"patient" => "Karen Blixen"}),
                Ok(record! {"patient" => "Jens Baggesen"}),
            ])
            .unwrap();
        assert_eq!(doc.traces.len(), 2);
        assert!(doc
            .traces
            .iter()
            .all(|t| !matches!(t.key().as_deref(), Some("Jens Baggesen") | Some("Karen Blixen"))));
        assert_eq!(doc.traces[0].events.len(), 2);
        let names = c
            .pseudonymizer()
            .context()
            .pool(PoolKind::Name)
            .unwrap()
            .assigned();
        assert_eq!(names, 2);
    }

    #[test]
    fn test_invalid_uuid_is_fatal() {
        let mut c =
            Converter::new(ConversionOptions::default().with_event_mapping("id:id", "%(id)s"))
                .unwrap();
        assert!(c
            .convert(vec![Ok(record! {"id" => "f81d4fae-7dec-11d0-a765-00a0c91e6bf6"})])
            .is_ok());
        assert!(matches!(
            c.convert(vec![Ok(record! {"id" => "not-a-uuid"})]),
            Err(ConversionError::InvalidUuid { .. })
        ));
    }
}
