use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

///
/// Name of an output attribute: an optional extension prefix and a local name
///
/// `concept:name` has prefix `concept` and local name `name`, while `amount` has no prefix.
/// A missing prefix is distinct from every named prefix (including the empty one).
///
/// ```rust
/// use something_to_xes::mapping::AttributeName;
/// let n: AttributeName = "time:timestamp".parse().unwrap();
/// assert_eq!(n.prefix.as_deref(), Some("time"));
/// assert_eq!(n.to_string(), "time:timestamp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeName {
    /// Extension prefix (e.g., `concept`)
    pub prefix: Option<String>,
    /// Local name (e.g., `name`)
    pub local: String,
}

impl AttributeName {
    /// Attribute name with an extension prefix
    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Attribute name without a prefix
    pub fn bare(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// Parse `prefix:local` (split at the first `:`) or a bare `local`
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((prefix, local)) => Self::prefixed(prefix, local),
            None => Self::bare(spec),
        }
    }

    /// Whether this is the given `prefix:local` name
    pub fn is(&self, prefix: &str, local: &str) -> bool {
        self.prefix.as_deref() == Some(prefix) && self.local == local
    }
}

impl Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl FromStr for AttributeName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl TryFrom<String> for AttributeName {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self::parse(&value))
    }
}

impl From<AttributeName> for String {
    fn from(value: AttributeName) -> Self {
        value.to_string()
    }
}

impl From<&str> for AttributeName {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
