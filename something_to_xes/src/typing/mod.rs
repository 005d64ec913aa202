//! Elementary XES types, the type registry and typed value encoding
use std::{collections::HashMap, fmt::Display, str::FromStr};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ConversionError, mapping::AttributeName};

/// Timestamp parsing and rendering
pub mod timestamp_utils;

use timestamp_utils::{format_xes_timestamp, parse_timestamp};

///
/// Elementary attribute types
///
/// [`ElementaryType::Uuid`] is internal: it cannot be declared by users and is only bound to
/// `id:id`, whose values the XES identity extension requires to be genuine UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementaryType {
    /// Text (the default)
    String,
    /// Timestamps
    Date,
    /// 64-bit integers
    Int,
    /// 64-bit floating point numbers
    Float,
    /// Booleans
    Boolean,
    /// Identifiers (kept verbatim)
    Id,
    /// Identifiers that must be valid UUIDs
    #[serde(skip)]
    Uuid,
}

impl ElementaryType {
    /// XES element name used for values of this type
    pub fn tag_name(&self) -> &'static str {
        match self {
            ElementaryType::String => "string",
            ElementaryType::Date => "date",
            ElementaryType::Int => "int",
            ElementaryType::Float => "float",
            ElementaryType::Boolean => "boolean",
            ElementaryType::Id | ElementaryType::Uuid => "id",
        }
    }

    ///
    /// Coerce a raw value into a typed value of this type
    ///
    /// Returns `Ok(None)` if the value cannot be coerced (the attribute is dropped).
    /// The only fatal case is a malformed value for [`ElementaryType::Uuid`].
    pub fn encode(
        &self,
        attribute: &AttributeName,
        raw: &str,
        date_format: Option<&str>,
    ) -> Result<Option<TypedValue>, ConversionError> {
        let value = match self {
            ElementaryType::String => Some(TypedValue::String(raw.to_string())),
            ElementaryType::Date => parse_timestamp(raw, date_format).map(TypedValue::Date),
            ElementaryType::Int => raw.trim().parse::<i64>().ok().map(TypedValue::Int),
            ElementaryType::Float => raw.trim().parse::<f64>().ok().map(TypedValue::Float),
            ElementaryType::Boolean => Some(TypedValue::Boolean(parse_boolean(raw))),
            ElementaryType::Id => Some(TypedValue::Id(raw.to_string())),
            ElementaryType::Uuid => match Uuid::parse_str(raw.trim()) {
                Ok(id) => Some(TypedValue::Uuid(id)),
                Err(_) => {
                    return Err(ConversionError::InvalidUuid {
                        attribute: attribute.clone(),
                        value: raw.to_string(),
                    })
                }
            },
        };
        if value.is_none() {
            debug!(%attribute, raw, elementary_type = %self, "Dropping attribute: value cannot be coerced");
        }
        Ok(value)
    }
}

/// Total boolean coercion: `true`, `1` and `yes` (any case) are true, everything else is false
pub fn parse_boolean(raw: &str) -> bool {
    let raw = raw.trim();
    ["true", "1", "yes"]
        .iter()
        .any(|t| raw.eq_ignore_ascii_case(t))
}

impl Display for ElementaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ElementaryType::Uuid => "uuid",
            other => other.tag_name(),
        };
        write!(f, "{s}")
    }
}

impl FromStr for ElementaryType {
    type Err = ConversionError;

    /// Parse a user-declarable type name (`uuid` is not declarable)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "date" => Ok(Self::Date),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "id" => Ok(Self::Id),
            _ => Err(ConversionError::UnknownType(s.to_string())),
        }
    }
}

///
/// A typed attribute value, ready to be written as XES
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum TypedValue {
    /// String values
    String(String),
    /// `DateTime` values
    Date(DateTime<FixedOffset>),
    /// Integer values
    Int(i64),
    /// Float values
    Float(f64),
    /// Boolean values
    Boolean(bool),
    /// Verbatim identifiers
    Id(String),
    /// UUID identifiers
    Uuid(Uuid),
}

impl TypedValue {
    /// XES element name for this value
    pub fn tag_name(&self) -> &'static str {
        self.elementary_type().tag_name()
    }

    /// Elementary type of this value
    pub fn elementary_type(&self) -> ElementaryType {
        match self {
            TypedValue::String(_) => ElementaryType::String,
            TypedValue::Date(_) => ElementaryType::Date,
            TypedValue::Int(_) => ElementaryType::Int,
            TypedValue::Float(_) => ElementaryType::Float,
            TypedValue::Boolean(_) => ElementaryType::Boolean,
            TypedValue::Id(_) => ElementaryType::Id,
            TypedValue::Uuid(_) => ElementaryType::Uuid,
        }
    }
}

impl Display for TypedValue {
    /// Rendering used for the XES `value` attribute
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::String(s) | TypedValue::Id(s) => write!(f, "{s}"),
            TypedValue::Date(dt) => write!(f, "{}", format_xes_timestamp(dt)),
            TypedValue::Int(i) => write!(f, "{i}"),
            // xs:double spelling of the special values
            TypedValue::Float(x) if x.is_nan() => write!(f, "NaN"),
            TypedValue::Float(x) if x.is_infinite() => {
                write!(f, "{}", if *x > 0.0 { "INF" } else { "-INF" })
            }
            TypedValue::Float(x) => write!(f, "{x}"),
            TypedValue::Boolean(b) => write!(f, "{b}"),
            TypedValue::Uuid(id) => write!(f, "{}", id.hyphenated()),
        }
    }
}

/// Types of the standard attributes of the built-in extensions
pub const STANDARD_ATTRIBUTE_TYPES: &[(&str, &str, ElementaryType)] = &[
    ("concept", "name", ElementaryType::String),
    ("concept", "instance", ElementaryType::String),
    ("lifecycle", "model", ElementaryType::String),
    ("lifecycle", "transition", ElementaryType::String),
    ("lifecycle", "state", ElementaryType::String),
    ("org", "resource", ElementaryType::String),
    ("org", "role", ElementaryType::String),
    ("org", "group", ElementaryType::String),
    ("time", "timestamp", ElementaryType::Date),
    ("semantic", "modelReference", ElementaryType::String),
    ("id", "id", ElementaryType::Uuid),
    ("cost", "total", ElementaryType::Float),
    ("cost", "amount", ElementaryType::Float),
    ("cost", "currency", ElementaryType::String),
    ("cost", "driver", ElementaryType::String),
    ("cost", "type", ElementaryType::String),
];

///
/// Maps attribute names to their [`ElementaryType`]
///
/// Unregistered attributes are strings. Entries can only be added, never changed:
/// redeclaring an attribute with the same type is a no-op, with a different type an error.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<AttributeName, ElementaryType>,
}

impl Default for TypeRegistry {
    /// Registry containing the [`STANDARD_ATTRIBUTE_TYPES`]
    fn default() -> Self {
        Self {
            types: STANDARD_ATTRIBUTE_TYPES
                .iter()
                .map(|(p, l, t)| (AttributeName::prefixed(*p, *l), *t))
                .collect(),
        }
    }
}

impl TypeRegistry {
    /// Declare the type of an attribute
    pub fn declare(
        &mut self,
        attribute: AttributeName,
        elementary_type: ElementaryType,
    ) -> Result<(), ConversionError> {
        match self.types.get(&attribute) {
            Some(existing) if *existing == elementary_type => Ok(()),
            Some(existing) => Err(ConversionError::TypeConflict {
                attribute,
                existing: existing.to_string(),
                requested: elementary_type.to_string(),
            }),
            None => {
                self.types.insert(attribute, elementary_type);
                Ok(())
            }
        }
    }

    /// Type of an attribute ([`ElementaryType::String`] if not declared)
    pub fn type_of(&self, attribute: &AttributeName) -> ElementaryType {
        self.types
            .get(attribute)
            .copied()
            .unwrap_or(ElementaryType::String)
    }

    /// Coerce a raw value for `attribute` according to its registered type
    pub fn encode(
        &self,
        attribute: &AttributeName,
        raw: &str,
        date_format: Option<&str>,
    ) -> Result<Option<TypedValue>, ConversionError> {
        self.type_of(attribute).encode(attribute, raw, date_format)
    }
}
