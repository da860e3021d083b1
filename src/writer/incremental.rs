//! Incremental update writer.
//!
//! Appends a fresh Info dictionary, an XMP `/Metadata` stream and a copy of
//! the Catalog pointing at that stream to the end of an existing PDF,
//! followed by an xref subsection and a trailer chained to the previous one
//! through `/Prev` (ISO 32000-1:2008, Section 7.5.6). The original bytes are
//! never modified.
//!
//! The appended region looks like this, with `n` the largest object number
//! already in the file:
//!
//! ```text
//! {n+1} 0 obj          Info dictionary
//! {n+2} 0 obj          /Type /Metadata /Subtype /XML stream
//! {n+3} 0 obj          Catalog with /Metadata {n+2} 0 R
//! xref
//! {n+1} 3
//! trailer
//! << /Size {n+4} /Root {n+3} 0 R /Info {n+1} 0 R /Prev {old startxref} >>
//! startxref
//! %%EOF
//! ```

use crate::error::{Error, Result};
use crate::lexer::{
    escape_pdf_literal, first_dict, last_trailer_dict, max_object_number, object_body,
    parse_named_ref, parse_start_xref, upsert_named_ref, ObjRef,
};
use crate::model::{Field, Metadata, ALL_FIELDS};

/// Append an incremental update carrying `next` and its XMP `packet`.
///
/// # Errors
///
/// Fails with `pdf_malformed` when the source has no trailer `/Root`, no
/// `startxref`, no numbered objects, or an unreadable Catalog.
pub fn write_incremental(src: &[u8], next: &Metadata, packet: &[u8]) -> Result<Vec<u8>> {
    let root = last_trailer_dict(src)
        .and_then(|trailer| parse_named_ref(trailer, "Root"))
        .ok_or_else(|| Error::malformed("could not parse trailer root reference"))?;
    let prev_xref =
        parse_start_xref(src).ok_or_else(|| Error::malformed("could not parse startxref"))?;

    let max_obj = max_object_number(src);
    if max_obj < 1 || max_obj > u32::MAX - 3 {
        return Err(Error::malformed("could not detect object numbers"));
    }

    let catalog_body = object_body(src, root.obj, root.gen)
        .ok_or_else(|| Error::malformed("could not read catalog object"))?;
    let catalog_dict =
        first_dict(catalog_body).ok_or_else(|| Error::malformed("catalog dictionary missing"))?;

    let info_obj = max_obj + 1;
    let metadata_obj = max_obj + 2;
    let catalog_obj = max_obj + 3;
    log::debug!(
        "incremental update: root {}, prev xref {}, new objects {}..={}",
        root,
        prev_xref,
        info_obj,
        catalog_obj
    );

    let new_catalog = upsert_named_ref(catalog_dict, "Metadata", ObjRef::new(metadata_obj, 0));

    let mut out = Vec::with_capacity(src.len() + packet.len() + catalog_dict.len() + 512);
    out.extend_from_slice(src);
    if out.last().is_some_and(|c| *c != b'\n') {
        out.push(b'\n');
    }

    let info_offset = out.len();
    out.extend_from_slice(&render_info_object(info_obj, next));
    let metadata_offset = out.len();
    out.extend_from_slice(&render_metadata_object(metadata_obj, packet));
    let catalog_offset = out.len();
    out.extend_from_slice(&render_catalog_object(catalog_obj, &new_catalog));

    let xref_offset = out.len();
    out.extend_from_slice(
        render_xref(info_obj, &[info_offset, metadata_offset, catalog_offset]).as_bytes(),
    );
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /Prev {} >>\n",
            catalog_obj + 1,
            catalog_obj,
            info_obj,
            prev_xref
        )
        .as_bytes(),
    );
    out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());

    log::debug!("appended {} bytes", out.len() - src.len());
    Ok(out)
}

/// Info entries are written sorted by key name.
fn info_fields_by_key() -> [Field; 8] {
    let mut fields = ALL_FIELDS;
    fields.sort_by_key(|f| f.info_key());
    fields
}

fn render_info_object(obj: u32, meta: &Metadata) -> Vec<u8> {
    let mut s = format!("{} 0 obj\n<<", obj);
    for field in info_fields_by_key() {
        let value = meta.get(field);
        if value.trim().is_empty() {
            continue;
        }
        s.push_str(&format!("\n/{} ({})", field.info_key(), escape_pdf_literal(value)));
    }
    s.push_str("\n>>\nendobj\n");
    s.into_bytes()
}

fn render_metadata_object(obj: u32, packet: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "{} 0 obj\n<< /Type /Metadata /Subtype /XML /Length {} >>\nstream\n",
        obj,
        packet.len()
    )
    .into_bytes();
    out.extend_from_slice(packet);
    if !packet.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b"endstream\nendobj\n");
    out
}

fn render_catalog_object(obj: u32, dict: &[u8]) -> Vec<u8> {
    let trimmed = trim_whitespace(dict);
    let mut out = format!("{} 0 obj\n", obj).into_bytes();
    out.extend_from_slice(trimmed);
    out.extend_from_slice(b"\nendobj\n");
    out
}

fn render_xref(start_obj: u32, offsets: &[usize]) -> String {
    let mut s = format!("xref\n{} {}\n", start_obj, offsets.len());
    for offset in offsets {
        s.push_str(&format!("{:010} 00000 n \n", offset));
    }
    s
}

fn trim_whitespace(b: &[u8]) -> &[u8] {
    let start = b.iter().position(|c| !c.is_ascii_whitespace()).unwrap_or(b.len());
    let end = b.iter().rposition(|c| !c.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &b[start..end]
}
