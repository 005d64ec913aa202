use std::collections::HashMap;

use super::template::Template;
use crate::record::Record;

///
/// Assigns every record to exactly one trace
///
/// Key templates are tried in order; the first one that can be evaluated against a record yields
/// its trace key. The empty template is always tried last, so records matching none of the
/// templates end up in the trace with key `""`.
///
/// Trace keys are remembered in the order they are first produced (see [`TraceRouter::discovered_keys`]).
///
/// ```rust
/// use something_to_xes::{mapping::{Template, TraceRouter}, record};
/// let mut router = TraceRouter::new(vec![Template::compile("%(case)s").unwrap()]);
/// assert_eq!(router.route(&record! {"case" => "7"}), 0);
/// assert_eq!(router.route(&record! {"other" => "x"}), 1);
/// assert_eq!(router.discovered_keys(), &["7".to_string(), String::new()]);
/// ```
#[derive(Debug, Clone)]
pub struct TraceRouter {
    templates: Vec<Template>,
    keys: Vec<String>,
    key_index: HashMap<String, usize>,
}

impl TraceRouter {
    /// Router trying `templates` in the given order (most specific first), followed by the empty template
    pub fn new(templates: Vec<Template>) -> Self {
        let mut templates = templates;
        templates.push(Template::empty());
        Self {
            templates,
            keys: Vec::new(),
            key_index: HashMap::new(),
        }
    }

    /// Trace key for a record (without registering it)
    pub fn key_for(&self, record: &Record) -> String {
        self.templates
            .iter()
            .find_map(|t| t.evaluate(record))
            // The trailing empty template matches every record
            .unwrap_or_default()
    }

    /// Route a record, returning the discovery index of its trace
    ///
    /// The discovery index of a key is the number of distinct keys produced before it.
    pub fn route(&mut self, record: &Record) -> usize {
        let key = self.key_for(record);
        if let Some(i) = self.key_index.get(&key) {
            return *i;
        }
        let i = self.keys.len();
        self.key_index.insert(key.clone(), i);
        self.keys.push(key);
        i
    }

    /// Trace keys in discovery order
    pub fn discovered_keys(&self) -> &[String] {
        &self.keys
    }

    /// Key templates in the order they are tried (including the trailing empty template)
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Consume the router, returning the discovered keys
    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

impl Default for TraceRouter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
