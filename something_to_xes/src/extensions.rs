//! XES extensions (namespace prefixes) and their registry
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

///
/// An XES extension: a namespace prefix bound to a display name and definition URI
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extension {
    /// Display name (e.g., `Concept`)
    pub name: String,
    /// Prefix used in attribute keys (e.g., `concept`)
    pub prefix: String,
    /// URI of the extension definition
    pub uri: String,
}

impl Extension {
    /// Create a new extension
    pub fn new(
        prefix: impl Into<String>,
        name: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// Prefix of the concept extension, which every output log declares
pub const CONCEPT_PREFIX: &str = "concept";

/// Standard XES extensions: `(prefix, name, uri)`
pub const STANDARD_EXTENSIONS: &[(&str, &str, &str)] = &[
    (
        "concept",
        "Concept",
        "http://www.xes-standard.org/concept.xesext",
    ),
    (
        "lifecycle",
        "Lifecycle",
        "http://www.xes-standard.org/lifecycle.xesext",
    ),
    (
        "org",
        "Organizational",
        "http://www.xes-standard.org/org.xesext",
    ),
    ("time", "Time", "http://www.xes-standard.org/time.xesext"),
    (
        "semantic",
        "Semantic",
        "http://www.xes-standard.org/semantic.xesext",
    ),
    (
        "id",
        "Identity",
        "http://www.xes-standard.org/identity.xesext",
    ),
    ("cost", "Cost", "http://www.xes-standard.org/cost.xesext"),
];

///
/// Registry of known extensions, keyed by prefix
///
/// Pre-populated with the [`STANDARD_EXTENSIONS`]. Bindings can be added but never changed.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Extension>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self {
            extensions: STANDARD_EXTENSIONS
                .iter()
                .map(|(p, n, u)| (p.to_string(), Extension::new(*p, *n, *u)))
                .collect(),
        }
    }
}

impl ExtensionRegistry {
    ///
    /// Register an extension
    ///
    /// Registering an identical extension again is a no-op; binding an already registered
    /// prefix to a different name or URI fails with [`ConversionError::ExtensionConflict`].
    pub fn register(&mut self, extension: Extension) -> Result<(), ConversionError> {
        match self.extensions.get(&extension.prefix) {
            Some(existing) if *existing == extension => Ok(()),
            Some(existing) => Err(ConversionError::ExtensionConflict {
                prefix: extension.prefix,
                existing: (existing.name.clone(), existing.uri.clone()),
                requested: (extension.name, extension.uri),
            }),
            None => {
                self.extensions
                    .insert(extension.prefix.clone(), extension);
                Ok(())
            }
        }
    }

    /// Get the extension bound to a prefix
    pub fn get(&self, prefix: &str) -> Option<&Extension> {
        self.extensions.get(prefix)
    }

    /// Get the extension bound to a prefix, failing with [`ConversionError::UnknownExtension`]
    pub fn lookup(&self, prefix: &str) -> Result<&Extension, ConversionError> {
        self.get(prefix)
            .ok_or_else(|| ConversionError::UnknownExtension(prefix.to_string()))
    }

    ///
    /// Extensions to declare in an output log
    ///
    /// These are the extensions of `used_prefixes` (in the given order, without duplicates),
    /// followed by the concept extension if it was not among them.
    pub fn declarations<'a>(
        &self,
        used_prefixes: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Extension>, ConversionError> {
        let mut res: Vec<Extension> = Vec::new();
        for p in used_prefixes {
            if res.iter().any(|e| e.prefix == p) {
                continue;
            }
            res.push(self.lookup(p)?.clone());
        }
        if !res.iter().any(|e| e.prefix == CONCEPT_PREFIX) {
            res.push(self.lookup(CONCEPT_PREFIX)?.clone());
        }
        Ok(res)
    }
}
