#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]
#![doc = include_str!("../README.md")]

/// Error type of all conversion stages
pub mod error;

/// Conversion options (JSON-configurable)
pub mod config;

/// Conversion pipeline: routing, mapping, typing and document assembly
pub mod converter;

/// XES extensions and the extension registry
pub mod extensions;

pub mod mapping;

pub mod pseudonym;

pub mod record;

pub mod typing;

/// Util module with smaller helper functions
pub mod utils;

///
/// XES documents and their export
///
pub mod xes {
    /// [`XESDocument`] struct and sub-structs
    pub mod document;
    /// XES Export
    pub mod export_xes;

    #[doc(inline)]
    pub use document::{TypedAttribute, XESDocument, XESEvent, XESTrace};
}

use std::path::Path;

#[doc(inline)]
pub use config::ConversionOptions;

#[doc(inline)]
pub use converter::Converter;

#[doc(inline)]
pub use error::ConversionError;

#[doc(inline)]
pub use record::{InputFormat, Record};

#[doc(inline)]
pub use xes::XESDocument;

#[doc(inline)]
pub use xes::export_xes::export_xes_to_path;

#[doc(inline)]
pub use xes::export_xes::export_xes_to_writer;

///
/// Convert records read from `reader` into an [`XESDocument`]
///
pub fn convert_reader<R: std::io::BufRead>(
    reader: R,
    format: InputFormat,
    options: ConversionOptions,
) -> Result<XESDocument, ConversionError> {
    let mut converter = Converter::new(options)?;
    converter.convert(format.records(reader)?)
}

///
/// Convert an input file into a XES file
///
/// `None` or `-` stand for stdin/stdout. Inputs are transparently gz-decompressed; outputs ending
/// with `.gz` are gz-compressed.
///
pub fn convert_path(
    input: Option<&Path>,
    output: Option<&Path>,
    format: InputFormat,
    options: ConversionOptions,
) -> Result<XESDocument, ConversionError> {
    // Configuration errors are reported before the input is opened
    let mut converter = Converter::new(options)?;
    let reader = utils::io_utils::open_input(input)?;
    let document = converter.convert(format.records(reader)?)?;
    utils::io_utils::write_document(&document, output)?;
    Ok(document)
}

#[cfg(test)]
mod tests;
