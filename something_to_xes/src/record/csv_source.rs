use std::io::Read;

use serde::{Deserialize, Serialize};

use super::{Record, RecordResult};
use crate::error::ConversionError;

/// Options for reading records from CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CSVSourceOptions {
    /// Field delimiter (default: `;`)
    pub delimiter: u8,
    /// Quote character (default: `"`)
    pub quote: u8,
    /// Trim whitespace around field names and values
    pub trim: bool,
}

impl Default for CSVSourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            quote: b'"',
            trim: false,
        }
    }
}

///
/// Lazily reads [`Record`]s from CSV data
///
/// The first row names the fields; every following row is one record. Rows shorter than the
/// header leave the remaining fields absent, surplus cells are ignored.
///
/// ```rust
/// use something_to_xes::record::{CSVRecordSource, CSVSourceOptions};
/// let data = "case;activity\n1;Register\n1;Approve\n";
/// let records: Vec<_> = CSVRecordSource::new(data.as_bytes(), CSVSourceOptions::default())
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].get("activity"), Some("Approve"));
/// ```
#[derive(Debug)]
pub struct CSVRecordSource<R> {
    reader: csv::Reader<R>,
    header: Vec<String>,
    row: csv::StringRecord,
    finished: bool,
}

impl<R: Read> CSVRecordSource<R> {
    /// Create a record source, directly reading the header row
    pub fn new(reader: R, options: CSVSourceOptions) -> Result<Self, ConversionError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .flexible(true)
            .trim(if options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .from_reader(reader);
        let header = reader.headers()?.iter().map(|h| h.to_string()).collect();
        Ok(Self {
            reader,
            header,
            row: csv::StringRecord::new(),
            finished: false,
        })
    }

    /// Field names from the header row
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl<R: Read> Iterator for CSVRecordSource<R> {
    type Item = RecordResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.read_record(&mut self.row) {
            Ok(true) => {
                let mut record = Record::default();
                for (name, value) in self.header.iter().zip(self.row.iter()) {
                    record.insert(name.as_str(), Some(value));
                }
                Some(Ok(record))
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }
}
