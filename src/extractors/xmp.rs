//! XMP metadata extraction.
//!
//! Parses an XMP packet (ISO 16684-1, embedded per ISO 32000-1:2008,
//! Section 14.3.2) back into the canonical [`Metadata`] record.
//!
//! ## Mapping
//!
//! | Element path suffix      | Field        |
//! |--------------------------|--------------|
//! | `title/Alt/li`           | Title        |
//! | `creator/Seq/li`         | Author       |
//! | `description/Alt/li`     | Subject      |
//! | `Keywords`               | Keywords     |
//! | `CreatorTool`            | Creator      |
//! | `Producer`               | Producer     |
//! | `CreateDate`             | CreationDate |
//! | `ModifyDate`             | ModDate      |
//!
//! Matching is on local names only, so any namespace prefix is accepted.

use crate::error::{Error, ErrorCode, Result};
use crate::lexer::find;
use crate::model::{Field, Metadata};
use quick_xml::events::Event;
use quick_xml::Reader;

const XMP_OPEN_TAG: &[u8] = b"<x:xmpmeta";
const XMP_CLOSE_TAG: &[u8] = b"</x:xmpmeta>";

/// XMP packet extractor.
pub struct XmpExtractor;

impl XmpExtractor {
    /// Locate the first `<x:xmpmeta ... </x:xmpmeta>` region in raw bytes.
    pub fn extract(bytes: &[u8]) -> Option<&[u8]> {
        let (start, end) = packet_span(bytes)?;
        Some(&bytes[start..end])
    }

    /// Parse an XMP packet into canonical metadata.
    ///
    /// # Errors
    ///
    /// Fails when no `xmpmeta` element is present or the XML is malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use pdfmeta::extractors::xmp::XmpExtractor;
    ///
    /// let xmp = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    /// <rdf:Description xmlns:pdf="http://ns.adobe.com/pdf/1.3/"><pdf:Producer>acme</pdf:Producer></rdf:Description>
    /// </rdf:RDF></x:xmpmeta>"#;
    /// let meta = XmpExtractor::parse_xmp(xmp)?;
    /// assert_eq!(meta.producer, "acme");
    /// # Ok::<(), pdfmeta::error::Error>(())
    /// ```
    pub fn parse_xmp(packet: &[u8]) -> Result<Metadata> {
        let xml = String::from_utf8_lossy(packet);
        let mut reader = Reader::from_str(&xml);
        reader.trim_text(true);

        // Local names of the open elements, outermost first
        let mut element_stack: Vec<String> = Vec::new();
        let mut metadata = Metadata::new();
        let mut saw_xmpmeta = false;

        loop {
            let text = match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    saw_xmpmeta |= name == "xmpmeta";
                    element_stack.push(name);
                    continue;
                },
                Ok(Event::Empty(e)) => {
                    saw_xmpmeta |= e.local_name().as_ref() == b"xmpmeta";
                    continue;
                },
                Ok(Event::End(_)) => {
                    element_stack.pop();
                    continue;
                },
                Ok(Event::Text(e)) => e.unescape().map_err(decode_error)?.into_owned(),
                Ok(Event::CData(e)) => String::from_utf8_lossy(&e).into_owned(),
                Ok(Event::Eof) => break,
                Ok(_) => continue,
                Err(e) => return Err(decode_error(e)),
            };

            let value = text.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(field) = field_for(&element_stack) {
                assign(&mut metadata, field, value);
            }
        }

        if !element_stack.is_empty() {
            return Err(Error::new(
                ErrorCode::Internal,
                format!("decode xml: unexpected EOF inside <{}>", element_stack.join("/")),
            ));
        }
        if !saw_xmpmeta {
            return Err(Error::internal("xmp packet not found"));
        }
        Ok(metadata)
    }
}

/// `[start, end)` of the first complete xmpmeta element.
pub(crate) fn packet_span(bytes: &[u8]) -> Option<(usize, usize)> {
    let start = find(bytes, XMP_OPEN_TAG)?;
    let end = find(&bytes[start..], XMP_CLOSE_TAG)? + start + XMP_CLOSE_TAG.len();
    Some((start, end))
}

fn decode_error(e: quick_xml::Error) -> Error {
    Error::with_cause(ErrorCode::Internal, "decode xml", e)
}

fn has_suffix(stack: &[String], want: &[&str]) -> bool {
    stack.len() >= want.len()
        && stack[stack.len() - want.len()..]
            .iter()
            .zip(want)
            .all(|(have, want)| have == want)
}

fn field_for(stack: &[String]) -> Option<Field> {
    let field = if has_suffix(stack, &["title", "Alt", "li"]) {
        Field::Title
    } else if has_suffix(stack, &["creator", "Seq", "li"]) {
        Field::Author
    } else if has_suffix(stack, &["description", "Alt", "li"]) {
        Field::Subject
    } else if has_suffix(stack, &["Keywords"]) {
        Field::Keywords
    } else if has_suffix(stack, &["CreatorTool"]) {
        Field::Creator
    } else if has_suffix(stack, &["Producer"]) {
        Field::Producer
    } else if has_suffix(stack, &["CreateDate"]) {
        Field::CreationDate
    } else if has_suffix(stack, &["ModifyDate"]) {
        Field::ModDate
    } else {
        return None;
    };
    Some(field)
}

fn assign(metadata: &mut Metadata, field: Field, value: &str) {
    match field {
        // Language alternatives and sequences keep their first entry.
        Field::Title | Field::Author | Field::Subject => {
            if metadata.get(field).is_empty() {
                metadata.set(field, value);
            }
        },
        _ => metadata.set(field, value),
    }
}
