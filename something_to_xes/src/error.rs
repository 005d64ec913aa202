//! Error type shared by all conversion stages
use std::fmt::Display;

use crate::mapping::attribute_name::AttributeName;

/// Fatal errors aborting a conversion run
///
/// Per-rule problems (a template referencing an absent field, a value that cannot be coerced
/// to its declared type) are not errors; they only cause the affected attribute to be skipped.
#[derive(Debug)]
pub enum ConversionError {
    /// IO Error
    Io(std::io::Error),
    /// CSV reading error
    Csv(csv::Error),
    /// XML reading or writing error
    Xml(quick_xml::Error),
    /// JSON (configuration) error
    Json(serde_json::Error),
    /// A template could not be compiled
    InvalidTemplate {
        /// The offending template
        template: String,
        /// What is wrong with it
        reason: String,
    },
    /// An element selector could not be compiled
    InvalidSelector {
        /// The offending selector expression
        selector: String,
        /// What is wrong with it
        reason: String,
    },
    /// An extension prefix was redeclared with a different name or URI
    ExtensionConflict {
        /// Prefix of the extension
        prefix: String,
        /// `(name, uri)` already bound to the prefix
        existing: (String, String),
        /// `(name, uri)` requested by the redeclaration
        requested: (String, String),
    },
    /// A mapping rule references a prefix that is not a registered extension
    UnknownExtension(String),
    /// An attribute was redeclared with a different elementary type
    TypeConflict {
        /// The attribute
        attribute: AttributeName,
        /// Currently registered type
        existing: String,
        /// Requested type
        requested: String,
    },
    /// A type name is not one of the elementary types
    UnknownType(String),
    /// A pseudonym pool kind is not known
    UnknownPoolKind(String),
    /// A finite pseudonym pool has no entries left
    PoolExhausted {
        /// Kind of the exhausted pool
        kind: String,
        /// Number of entries the pool started out with
        capacity: usize,
    },
    /// Members of one trace disagree on the value of a trace-level attribute
    TraceAttributeConflict {
        /// Key of the trace
        trace: String,
        /// The trace-level attribute
        attribute: AttributeName,
        /// Value derived from an earlier member record
        first: String,
        /// Diverging value derived from a later member record
        second: String,
    },
    /// A value for `id:id` is not a valid UUID
    InvalidUuid {
        /// The attribute
        attribute: AttributeName,
        /// The offending raw value
        value: String,
    },
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO Error: {e}"),
            Self::Csv(e) => write!(f, "CSV Error: {e}"),
            Self::Xml(e) => write!(f, "XML Error: {e}"),
            Self::Json(e) => write!(f, "JSON Error: {e}"),
            Self::InvalidTemplate { template, reason } => {
                write!(f, "Invalid template {template:?}: {reason}")
            }
            Self::InvalidSelector { selector, reason } => {
                write!(f, "Invalid selector {selector:?}: {reason}")
            }
            Self::ExtensionConflict {
                prefix,
                existing,
                requested,
            } => write!(
                f,
                "Extension prefix \"{prefix}\" is already bound to {} <{}>, cannot redeclare it as {} <{}>",
                existing.0, existing.1, requested.0, requested.1
            ),
            Self::UnknownExtension(prefix) => write!(
                f,
                "Prefix \"{prefix}\" does not specify a known XES extension"
            ),
            Self::TypeConflict {
                attribute,
                existing,
                requested,
            } => write!(
                f,
                "Attribute \"{attribute}\" already has type {existing}, cannot redeclare it as {requested}"
            ),
            Self::UnknownType(t) => write!(f, "Unknown attribute type \"{t}\""),
            Self::UnknownPoolKind(k) => write!(f, "Unknown pseudonym pool \"{k}\""),
            Self::PoolExhausted { kind, capacity } => write!(
                f,
                "Pseudonym pool \"{kind}\" is exhausted (all {capacity} substitutes are in use)"
            ),
            Self::TraceAttributeConflict {
                trace,
                attribute,
                first,
                second,
            } => write!(
                f,
                "Trace {trace:?}: trace attribute \"{attribute}\" differs between events ({first:?} vs. {second:?})"
            ),
            Self::InvalidUuid { attribute, value } => {
                write!(f, "Value {value:?} of \"{attribute}\" is not a valid UUID")
            }
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Xml(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for ConversionError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<quick_xml::Error> for ConversionError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
