//! Metadata editing for existing PDF documents.
//!
//! ## Architecture
//!
//! ```text
//! Document (read-only source)
//!     ↓
//! [read_native_metadata] (Info + XMP, merged)
//!     ↓
//! apply_patch / apply_unset
//!     ↓
//! [XmpWriter] + [write_incremental] (append to original)
//!     ↓
//! filesafe::write_atomic (same-directory temp file + rename)
//! ```
//!
//! ## Encryption Handling
//!
//! Documents whose last trailer names an `/Encrypt` dictionary can be read
//! (their envelope is still reported) but never written: an appended update
//! would carry unencrypted strings into an encrypted file.
//!
//! [read_native_metadata]: crate::extractors::read_native_metadata
//! [XmpWriter]: crate::writer::XmpWriter
//! [write_incremental]: crate::writer::write_incremental

mod store;

pub use store::{MetadataStore, PdfMetadataStore};
