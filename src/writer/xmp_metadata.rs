//! XMP metadata writing for PDF documents.
//!
//! Generates the XMP packet stored in the Catalog's `/Metadata` stream
//! (ISO 32000-1:2008, Section 14.3.2). The packet layout is fixed so that
//! repeated writes of the same record produce identical bytes.

use crate::extractors::xmp::packet_span;
use crate::lexer::rfind;
use crate::model::{Field, Metadata};

/// XMP namespace URIs
const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";

/// Packet id fixed by ISO 16684-1.
const PACKET_ID: &str = "W5M0MpCehiHzreSzNTczkc9d";

/// Toolkit name written to `x:xmptk`.
const XMP_TOOLKIT: &str = "pdfmeta";

/// XMP packet writer.
pub struct XmpWriter<'a> {
    metadata: &'a Metadata,
}

impl<'a> XmpWriter<'a> {
    /// Create a writer for a metadata record.
    pub fn new(metadata: &'a Metadata) -> Self {
        Self { metadata }
    }

    /// Build the XMP packet as a string.
    pub fn build(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(&format!("<?xpacket begin=\"\u{FEFF}\" id=\"{}\"?>\n", PACKET_ID));
        xml.push_str(&format!("<x:xmpmeta xmlns:x=\"{}\" x:xmptk=\"{}\">\n", NS_X, XMP_TOOLKIT));
        xml.push_str(&format!("<rdf:RDF xmlns:rdf=\"{}\">\n", NS_RDF));
        xml.push_str(&format!(
            "<rdf:Description rdf:about=\"\" xmlns:dc=\"{}\" xmlns:pdf=\"{}\" xmlns:xmp=\"{}\">\n",
            NS_DC, NS_PDF, NS_XMP
        ));

        let m = self.metadata;
        if !m.title.is_empty() {
            push_lang_alt(&mut xml, "dc:title", &m.title);
        }
        if !m.author.is_empty() {
            xml.push_str(&format!(
                "<dc:creator><rdf:Seq><rdf:li>{}</rdf:li></rdf:Seq></dc:creator>\n",
                escape_xml(&m.author)
            ));
        }
        if !m.subject.is_empty() {
            push_lang_alt(&mut xml, "dc:description", &m.subject);
        }
        for (field, element) in [
            (Field::Keywords, "pdf:Keywords"),
            (Field::Creator, "xmp:CreatorTool"),
            (Field::Producer, "pdf:Producer"),
            (Field::CreationDate, "xmp:CreateDate"),
            (Field::ModDate, "xmp:ModifyDate"),
        ] {
            let value = m.get(field);
            if !value.is_empty() {
                xml.push_str(&format!("<{}>{}</{}>\n", element, escape_xml(value), element));
            }
        }

        xml.push_str("</rdf:Description>\n");
        xml.push_str("</rdf:RDF>\n");
        xml.push_str("</x:xmpmeta>\n");
        xml.push_str("<?xpacket end=\"w\"?>\n");
        xml
    }

    /// Build the XMP packet as UTF-8 bytes.
    pub fn build_bytes(&self) -> Vec<u8> {
        self.build().into_bytes()
    }
}

fn push_lang_alt(xml: &mut String, element: &str, value: &str) {
    xml.push_str(&format!(
        "<{}><rdf:Alt><rdf:li xml:lang=\"x-default\">{}</rdf:li></rdf:Alt></{}>\n",
        element,
        escape_xml(value),
        element
    ));
}

/// Escape element text.
///
/// Tab, LF and CR are written as character references so they survive
/// attribute-value normalization. Other characters that XML 1.0 cannot carry
/// are replaced with U+FFFD.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if is_xml_char(c) => out.push(c),
            _ => out.push('\u{FFFD}'),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Replace the first `<x:xmpmeta>` region of `content` with `packet`.
///
/// Without an existing region the packet goes immediately before the last
/// `%%EOF`, or at the end when there is none.
pub fn upsert_packet(content: &[u8], packet: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + packet.len());
    if let Some((start, end)) = packet_span(content) {
        out.extend_from_slice(&content[..start]);
        out.extend_from_slice(packet);
        out.extend_from_slice(&content[end..]);
    } else if let Some(eof) = rfind(content, b"%%EOF") {
        out.extend_from_slice(&content[..eof]);
        out.extend_from_slice(packet);
        out.extend_from_slice(&content[eof..]);
    } else {
        out.extend_from_slice(content);
        out.extend_from_slice(packet);
    }
    out
}
