use std::io::BufRead;

use quick_xml::{
    errors::IllFormedError,
    events::{BytesStart, Event},
    Reader,
};

use super::{selector::ElementSelector, Record, RecordResult};

fn read_to_string(x: &[u8]) -> String {
    if let Ok(x_str) = std::str::from_utf8(x) {
        if let Ok(escaped) = quick_xml::escape::unescape(x_str) {
            return escaped.to_string();
        }
        return x_str.to_string();
    }
    String::from_utf8_lossy(x).to_string()
}

/// Add the fields contributed by a direct child element of an event element
///
/// The child itself becomes a field without value (its text is added later); each of its XML
/// attributes becomes a field `child.attribute`.
fn add_child_fields(record: &mut Record, t: &BytesStart<'_>) -> Result<String, quick_xml::Error> {
    let tag = read_to_string(t.name().as_ref());
    record.insert(tag.as_str(), None::<String>);
    for attr in t.attributes() {
        let attr = attr?;
        let key = read_to_string(attr.key.as_ref());
        let value = read_to_string(attr.value.as_ref());
        record.insert(format!("{tag}.{key}"), Some(value));
    }
    Ok(tag)
}

#[derive(Debug)]
struct Capture {
    /// Depth of the selected element (root element = 1)
    depth: usize,
    record: Record,
    /// Field of the direct child whose text is currently read
    child: Option<String>,
}

///
/// Lazily reads [`Record`]s from an XML document
///
/// Every element selected by the [`ElementSelector`] is one record. Each direct child element
/// `c` of a selected element contributes the field `c` (the text of `c`, absent if it has no
/// text) and, for each XML attribute `a` of `c`, the field `c.a`.
///
/// Selected elements nested inside another selected element are part of the outer record only.
///
/// ```rust
/// use something_to_xes::record::{ElementSelector, XMLRecordSource};
/// let xml = r#"<log><entry><who role="admin">Jens</who><what>Login</what></entry></log>"#;
/// let records: Vec<_> =
///     XMLRecordSource::new(xml.as_bytes(), ElementSelector::css("entry").unwrap())
///         .collect::<Result<_, _>>()
///         .unwrap();
/// assert_eq!(records[0].get("who"), Some("Jens"));
/// assert_eq!(records[0].get("who.role"), Some("admin"));
/// ```
#[derive(Debug)]
pub struct XMLRecordSource<R> {
    reader: Reader<R>,
    selector: ElementSelector,
    buf: Vec<u8>,
    /// Local names of all open elements
    path: Vec<String>,
    capture: Option<Capture>,
    finished: bool,
}

impl<R: BufRead> XMLRecordSource<R> {
    /// Create a record source reading from `reader`
    pub fn new(reader: R, selector: ElementSelector) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            selector,
            buf: Vec::new(),
            path: Vec::new(),
            capture: None,
            finished: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<Record>, quick_xml::Error> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(t) => {
                    self.path
                        .push(read_to_string(t.local_name().as_ref()));
                    let depth = self.path.len();
                    match &mut self.capture {
                        Some(c) if depth == c.depth + 1 => {
                            c.child = Some(add_child_fields(&mut c.record, &t)?);
                        }
                        // Text after a grandchild element does not belong to the child's text
                        Some(c) => c.child = None,
                        None => {
                            if self.selector.matches(&self.path) {
                                self.capture = Some(Capture {
                                    depth,
                                    record: Record::default(),
                                    child: None,
                                });
                            }
                        }
                    }
                }
                Event::Empty(t) => {
                    let depth = self.path.len() + 1;
                    match &mut self.capture {
                        Some(c) if depth == c.depth + 1 => {
                            add_child_fields(&mut c.record, &t)?;
                        }
                        Some(c) => c.child = None,
                        None => {
                            self.path
                                .push(read_to_string(t.local_name().as_ref()));
                            let selected = self.selector.matches(&self.path);
                            self.path.pop();
                            if selected {
                                return Ok(Some(Record::default()));
                            }
                        }
                    }
                }
                Event::Text(t) => {
                    if let Some(c) = &mut self.capture {
                        if let Some(child) = &c.child {
                            let text = read_to_string(t.as_ref());
                            if let Some(v) = c.record.get_mut(child) {
                                v.get_or_insert_with(String::new).push_str(&text);
                            }
                        }
                    }
                }
                Event::CData(t) => {
                    if let Some(c) = &mut self.capture {
                        if let Some(child) = &c.child {
                            let text = String::from_utf8_lossy(&t).to_string();
                            if let Some(v) = c.record.get_mut(child) {
                                v.get_or_insert_with(String::new).push_str(&text);
                            }
                        }
                    }
                }
                Event::End(_) => {
                    let depth = self.path.len();
                    self.path.pop();
                    match self.capture.as_ref().map(|c| c.depth) {
                        Some(d) if d == depth => {
                            return Ok(self.capture.take().map(|c| c.record));
                        }
                        Some(d) if d + 1 == depth => {
                            if let Some(c) = &mut self.capture {
                                c.child = None;
                            }
                        }
                        _ => {}
                    }
                }
                // Text after a comment or processing instruction is not part of the child's text
                Event::Comment(_) | Event::PI(_) => {
                    if let Some(c) = &mut self.capture {
                        c.child = None;
                    }
                }
                Event::Eof => {
                    return match self.path.pop() {
                        Some(open) => Err(quick_xml::Error::IllFormed(
                            IllFormedError::MissingEndTag(open),
                        )),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XMLRecordSource<R> {
    type Item = RecordResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(r)) => Some(Ok(r)),
            Ok(None) => {
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
