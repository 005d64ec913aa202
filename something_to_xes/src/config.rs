use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConversionError, extensions::Extension, pseudonym::PoolKind, pseudonym::DEFAULT_SEED,
    typing::ElementaryType,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
///
/// Options for a conversion run
///
/// All fields are optional when deserializing; missing fields take their [`Default`] values.
///
/// ```rust
/// use something_to_xes::ConversionOptions;
/// let options: ConversionOptions = serde_json::from_str(
///     r#"{
///         "event_mappings": [["concept:name", "%(activity)s"], ["time:timestamp", "%(ts)s"]],
///         "trace_mappings": [["concept:name", "%(case)s"]],
///         "types": [["amount", "float"]],
///         "max_traces": 10
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(options.event_mappings.len(), 2);
/// assert!(!options.preserve);
/// ```
pub struct ConversionOptions {
    /// Event-level mapping rules: `(attribute name, template)`
    pub event_mappings: Vec<(String, String)>,
    /// Trace-level mapping rules: `(attribute name, template)`
    ///
    /// Rules targeting `concept:name` define the trace keys. Later rules are tried first.
    pub trace_mappings: Vec<(String, String)>,
    /// Type declarations: `(attribute name, elementary type)`
    pub types: Vec<(String, ElementaryType)>,
    /// Extensions to register in addition to the standard ones
    pub extensions: Vec<Extension>,
    /// Raw fields to pseudonymize: `(field, pool kind)`
    pub pseudonymize: Vec<(String, PoolKind)>,
    /// Emit all raw fields of each record as additional untyped attributes
    pub preserve: bool,
    /// Only emit the first `n` traces (in discovery order)
    pub max_traces: Option<usize>,
    /// Custom date format tried first when parsing `date` values
    ///
    /// See <https://docs.rs/chrono/latest/chrono/format/strftime/index.html> for all available specifiers.
    pub date_format: Option<String>,
    /// Seed of the pseudonym pools
    pub pseudonym_seed: u64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            event_mappings: Vec::new(),
            trace_mappings: Vec::new(),
            types: Vec::new(),
            extensions: Vec::new(),
            pseudonymize: Vec::new(),
            preserve: false,
            max_traces: None,
            date_format: None,
            pseudonym_seed: DEFAULT_SEED,
        }
    }
}

impl ConversionOptions {
    ///
    /// Load options from a JSON file
    ///
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConversionError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Add an event-level mapping rule
    pub fn with_event_mapping(mut self, name: &str, template: &str) -> Self {
        self.event_mappings
            .push((name.to_string(), template.to_string()));
        self
    }

    /// Add a trace-level mapping rule
    pub fn with_trace_mapping(mut self, name: &str, template: &str) -> Self {
        self.trace_mappings
            .push((name.to_string(), template.to_string()));
        self
    }

    /// Add a trace key template (shorthand for a trace-level `concept:name` rule)
    pub fn with_trace_key(self, template: &str) -> Self {
        self.with_trace_mapping("concept:name", template)
    }

    /// Declare the type of an attribute
    pub fn with_type(mut self, name: &str, elementary_type: ElementaryType) -> Self {
        self.types.push((name.to_string(), elementary_type));
        self
    }

    /// Pseudonymize a raw field
    pub fn with_pseudonymized_field(mut self, field: &str, kind: PoolKind) -> Self {
        self.pseudonymize.push((field.to_string(), kind));
        self
    }
}
