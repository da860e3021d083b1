//! PDF document envelope.
//!
//! A [`Document`] holds the raw bytes of one PDF together with the few facts
//! the metadata layer needs up front: where the header is, which version it
//! declares, and whether the last trailer names an `/Encrypt` dictionary.
//! It lives for a single read or a single read-modify-write.
//!
//! # Example
//!
//! ```no_run
//! use pdfmeta::document::Document;
//!
//! let doc = Document::open("sample.pdf")?;
//! println!("PDF version: {}", doc.version());
//! println!("Encrypted: {}", doc.is_encrypted());
//! # Ok::<(), pdfmeta::error::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::lexer::{find_header_offset, has_encrypt_marker_in_trailer, parse_version_at};
use std::path::Path;

/// A loaded PDF envelope.
#[derive(Debug, Clone)]
pub struct Document {
    path: String,
    content: Vec<u8>,
    header_offset: usize,
    version: String,
    encrypted: bool,
}

impl Document {
    /// Read and parse a PDF from disk.
    ///
    /// # Errors
    ///
    /// - `validation` when `path` is empty
    /// - `not_found` when the file does not exist, `io` for other read failures
    /// - `pdf_malformed` when the file is empty or has no header in the scan window
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::validation("input path is required"));
        }
        let display = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::from_io(format!("read pdf {:?}", display), e))?;
        log::debug!("read {} bytes from {}", bytes.len(), display);
        Self::parse_bytes(display, &bytes)
    }

    /// Parse an envelope from in-memory bytes. The bytes are copied.
    pub fn parse_bytes(path: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::malformed("pdf is empty"));
        }
        let header_offset =
            find_header_offset(bytes).ok_or_else(|| Error::malformed("missing PDF header"))?;

        Ok(Self {
            path: path.into(),
            content: bytes.to_vec(),
            header_offset,
            version: parse_version_at(bytes, header_offset),
            encrypted: has_encrypt_marker_in_trailer(bytes),
        })
    }

    /// Path the document was loaded from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Byte offset of `%PDF-`.
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    /// Declared version, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the last trailer references an `/Encrypt` dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Read-only view of the raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    /// An owned copy of the raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.content.clone()
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Never true for a successfully parsed document.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
