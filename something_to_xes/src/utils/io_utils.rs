use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter},
    path::Path,
};

use flate2::bufread::GzDecoder;
use tracing::debug;

use crate::{
    error::ConversionError,
    xes::{
        document::XESDocument,
        export_xes::{export_xes_to_path, export_xes_to_writer},
    },
};

/// First two bytes of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether a path names a gz-compressed file (i.e., ends with `.gz`)
pub fn is_gz_path(path: &Path) -> bool {
    path.as_os_str()
        .to_str()
        .is_some_and(|p| p.ends_with(".gz"))
}

/// `None` and `-` stand for stdin/stdout
fn file_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.as_os_str() != "-")
}

///
/// Wrap `reader` in a gz decoder if it is gz-compressed
///
/// Compression is detected by the gzip magic bytes, or forced with `is_gz`.
pub fn decompress_if_gz<'a, R: BufRead + 'a>(
    mut reader: R,
    is_gz: bool,
) -> Result<Box<dyn BufRead + 'a>, ConversionError> {
    let is_gz = is_gz || reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gz {
        debug!("Reading gz-compressed input");
        return Ok(Box::new(BufReader::new(GzDecoder::new(reader))));
    }
    Ok(Box::new(reader))
}

///
/// Open an input file (or stdin for `None`/`-`), transparently decompressing gz data
///
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, ConversionError> {
    match file_path(path) {
        Some(p) => {
            let file = File::open(p)?;
            decompress_if_gz(BufReader::new(file), is_gz_path(p))
        }
        None => decompress_if_gz(BufReader::new(std::io::stdin()), false),
    }
}

///
/// Write an [`XESDocument`] to a file (or stdout for `None`/`-`)
///
/// Files ending with `.gz` are gz-compressed.
pub fn write_document(document: &XESDocument, path: Option<&Path>) -> Result<(), ConversionError> {
    match file_path(path) {
        Some(p) => export_xes_to_path(document, p),
        None => export_xes_to_writer(BufWriter::new(std::io::stdout().lock()), document),
    }
}
