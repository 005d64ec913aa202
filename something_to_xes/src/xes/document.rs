use serde::{Deserialize, Serialize};

use crate::{extensions::Extension, mapping::AttributeName, typing::TypedValue};

///
/// A typed XES attribute (key + [`TypedValue`])
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedAttribute {
    /// Attribute key (e.g., `concept:name`)
    pub key: String,
    /// Typed value
    pub value: TypedValue,
}

impl TypedAttribute {
    /// Create a new attribute
    pub fn new(key: impl Into<String>, value: TypedValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Create a new attribute for an [`AttributeName`]
    pub fn for_name(name: &AttributeName, value: TypedValue) -> Self {
        Self::new(name.to_string(), value)
    }
}

/// Find an attribute by key
fn find_attribute<'a>(attributes: &'a [TypedAttribute], key: &str) -> Option<&'a TypedAttribute> {
    attributes.iter().find(|a| a.key == key)
}

///
/// A single event (list of attributes, in emission order)
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XESEvent {
    /// Event attributes
    pub attributes: Vec<TypedAttribute>,
}

impl XESEvent {
    /// Get an attribute by key
    pub fn get(&self, key: &str) -> Option<&TypedAttribute> {
        find_attribute(&self.attributes, key)
    }
}

///
/// A trace: trace-level attributes (`concept:name` first) followed by member events
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XESTrace {
    /// Trace-level attributes
    pub attributes: Vec<TypedAttribute>,
    /// Events of the trace, in arrival order
    pub events: Vec<XESEvent>,
}

impl XESTrace {
    /// Get a trace-level attribute by key
    pub fn get(&self, key: &str) -> Option<&TypedAttribute> {
        find_attribute(&self.attributes, key)
    }

    /// Key of the trace (the value of its `concept:name` attribute)
    pub fn key(&self) -> Option<String> {
        self.get("concept:name").map(|a| a.value.to_string())
    }
}

///
/// An assembled XES document, ready to be exported
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XESDocument {
    /// Declared extensions
    pub extensions: Vec<Extension>,
    /// Traces in discovery order
    pub traces: Vec<XESTrace>,
}

impl XESDocument {
    /// Total number of events over all traces
    pub fn num_events(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }
}
