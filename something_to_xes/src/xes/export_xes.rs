use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use flate2::{write::GzEncoder, Compression};
use quick_xml::{events::BytesDecl, events::Event, Writer};

use super::document::{TypedAttribute, XESDocument};
use crate::{error::ConversionError, utils::io_utils::is_gz_path};

const OK: Result<(), std::io::Error> = Ok(());

/// Namespace of the XES log element
pub const XES_NAMESPACE: &str = "http://www.xes-standard.org/";

///
/// Export an [`XESDocument`] to a XML [`Writer`]
///
pub fn export_xes<W: Write>(
    writer: &mut Writer<W>,
    document: &XESDocument,
) -> Result<(), ConversionError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("log")
        .with_attributes(vec![("xes.version", "2.0"), ("xmlns", XES_NAMESPACE)])
        .write_inner_content(|w| {
            for ext in &document.extensions {
                w.create_element("extension")
                    .with_attributes(vec![
                        ("name", ext.name.as_str()),
                        ("prefix", ext.prefix.as_str()),
                        ("uri", ext.uri.as_str()),
                    ])
                    .write_empty()?;
            }
            for t in &document.traces {
                w.create_element("trace").write_inner_content(|w| {
                    for a in &t.attributes {
                        write_xes_attribute(w, a)?;
                    }
                    for e in &t.events {
                        w.create_element("event").write_inner_content(|w| {
                            for a in &e.attributes {
                                write_xes_attribute(w, a)?;
                            }
                            OK
                        })?;
                    }
                    OK
                })?;
            }
            OK
        })?;
    Ok(())
}

fn write_xes_attribute<T: Write>(w: &mut Writer<T>, a: &TypedAttribute) -> Result<(), std::io::Error> {
    let value = a.value.to_string();
    w.create_element(a.value.tag_name())
        .with_attributes(vec![("key", a.key.as_str()), ("value", value.as_str())])
        .write_empty()?;
    OK
}

///
/// Export an [`XESDocument`] to any [`std::io::Write`] (indented XML)
///
pub fn export_xes_to_writer<W: Write>(writer: W, document: &XESDocument) -> Result<(), ConversionError> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);
    export_xes(&mut xml_writer, document)?;
    xml_writer.into_inner().flush()?;
    Ok(())
}

/// Export an [`XESDocument`] to a [`File`], optionally gz-compressed
pub fn export_xes_to_file(
    document: &XESDocument,
    file: File,
    compress_gz: bool,
) -> Result<(), ConversionError> {
    if compress_gz {
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::fast());
        let mut xml_writer = Writer::new_with_indent(BufWriter::new(encoder), b' ', 2);
        export_xes(&mut xml_writer, document)?;
        let encoder = xml_writer
            .into_inner()
            .into_inner()
            .map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
        return Ok(());
    }
    export_xes_to_writer(BufWriter::new(file), document)
}

/// Export an [`XESDocument`] to a filepath
///
/// Automatically selects gz-compression if filepath ends with `.gz`
pub fn export_xes_to_path<P: AsRef<Path>>(
    document: &XESDocument,
    path: P,
) -> Result<(), ConversionError> {
    let is_gz = is_gz_path(path.as_ref());
    let file = File::create(path)?;
    export_xes_to_file(document, file, is_gz)
}
