//! Flat input records and the sources producing them
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// CSV record source
pub mod csv_source;
/// Element selectors (XPath/CSS subset) for XML record sources
pub mod selector;
/// XML record source
pub mod xml_source;

#[doc(inline)]
pub use csv_source::{CSVRecordSource, CSVSourceOptions};
#[doc(inline)]
pub use selector::ElementSelector;
#[doc(inline)]
pub use xml_source::XMLRecordSource;

///
/// A flat input record: raw field names mapped to optional raw values
///
/// Fields keep the order in which the source produced them.
///
/// ```rust
/// use something_to_xes::record::Record;
/// let mut r = Record::default();
/// r.insert("name", Some("Jens"));
/// r.insert("note", None::<String>);
/// assert_eq!(r.get("name"), Some("Jens"));
/// assert_eq!(r.get("note"), None);
/// assert!(r.contains_field("note"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    /// Set a field, replacing the value of an existing field with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Option<impl Into<String>>) {
        let name = name.into();
        let value = value.map(Into::into);
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Value of a field
    ///
    /// Returns `None` if the field is missing or has no value.
    ///
    /// _Complexity_: Does linear lookup (i.e., in O(n)); records are expected to be small.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Mutable value of a field (the outer `None` means the field is missing)
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Whether the record has a field with this name (with or without a value)
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Iterate over all fields in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Option<V>)>>(iter: T) -> Self {
        let mut r = Record::default();
        for (k, v) in iter {
            r.insert(k, v);
        }
        r
    }
}

/// Shorthand for a fallible record produced by a record source
pub type RecordResult = Result<Record, ConversionError>;

///
/// Format of an input and how to read records from it
///
#[derive(Debug, Clone)]
pub enum InputFormat {
    /// CSV with a header row
    CSV(CSVSourceOptions),
    /// XML, one record per selected element
    XML(ElementSelector),
}

impl InputFormat {
    /// Lazily read records from `reader`
    pub fn records<'a, R: BufRead + 'a>(
        self,
        reader: R,
    ) -> Result<Box<dyn Iterator<Item = RecordResult> + 'a>, ConversionError> {
        let source: Box<dyn Iterator<Item = RecordResult> + 'a> = match self {
            InputFormat::CSV(options) => Box::new(CSVRecordSource::new(reader, options)?),
            InputFormat::XML(selector) => Box::new(XMLRecordSource::new(reader, selector)),
        };
        Ok(source)
    }
}

/// Create a [`Record`] where every field has a value
///
/// ```rust
/// use something_to_xes::record;
/// let r = record! { "name" => "A", "amount" => "12" };
/// assert_eq!(r.get("amount"), Some("12"));
/// ```
#[macro_export]
macro_rules! record {
    ($($k:expr => $v:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut r = $crate::record::Record::default();
        $( r.insert($k, Some($v)); )*
        r
    }};
}
