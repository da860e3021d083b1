//! Shared PDF fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Assemble a classic-xref PDF from object bodies numbered 1..=n.
pub fn build_pdf(objects: &[&str], trailer_extra: &str) -> Vec<u8> {
    let mut out = b"%PDF-1.7\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            trailer_extra,
            xref
        )
        .as_bytes(),
    );
    out
}

/// Catalog and empty page tree, no metadata.
pub fn minimal_pdf() -> Vec<u8> {
    build_pdf(
        &["<< /Type /Catalog /Pages 2 0 R >>", "<< /Type /Pages /Kids [] /Count 0 >>"],
        "",
    )
}

/// A document with an Info dictionary only.
pub fn info_pdf() -> Vec<u8> {
    build_pdf(
        &[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [] /Count 0 >>",
            "<< /Title (Info Title) /Author (Info Author) /Producer (Legacy Writer 1.0) >>",
        ],
        " /Info 3 0 R",
    )
}

/// Trailer names an `/Encrypt` dictionary.
pub fn encrypted_pdf() -> Vec<u8> {
    build_pdf(
        &[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [] /Count 0 >>",
            "<< /Filter /Standard /V 2 /R 3 >>",
        ],
        " /Encrypt 3 0 R",
    )
}

/// Header present but no `startxref` keyword.
pub fn truncated_pdf() -> Vec<u8> {
    let mut bytes = minimal_pdf();
    let cut = bytes.windows(9).rposition(|w| w == b"startxref").unwrap();
    bytes.truncate(cut);
    bytes
}

/// Write `bytes` to `dir/name` and return the path as a string.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> String {
    let path: PathBuf = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path.to_string_lossy().into_owned()
}
