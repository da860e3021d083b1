//! # pdfmeta
//!
//! Read and edit the document metadata of PDF files without rewriting them.
//!
//! ## Core Features
//!
//! ### Reading
//! - **Envelope probes**: header window, version, `startxref`, last trailer, `/Encrypt` marker
//! - **Info dictionary**: literal and hex strings, UTF-16BE with BOM, UTF-8 and Latin-1
//! - **XMP packets**: Dublin Core, XMP basic and PDF schema properties
//! - **Merged view**: XMP values win, the Info dictionary fills the gaps
//!
//! ### Writing
//! - **Incremental updates**: new Info, `/Metadata` stream and Catalog appended after `%%EOF`
//! - **Byte faithful**: the original file is always a prefix of the result
//! - **Atomic replace**: same-directory temp file, fsync, rename, directory fsync
//! - **Encryption guard**: encrypted documents are never written
//!
//! ### Workflow
//! - **Templates**: named metadata patches in a JSON store
//! - **Batch**: JSON manifests of show/set/unset/template-apply items
//! - **CLI**: `pdfmeta` with text and JSON output and stable exit codes
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfmeta::{CancelToken, Field, IoOptions, MetadataPatch, MetadataService, Service, SetRequest};
//!
//! # fn main() -> pdfmeta::Result<()> {
//! let service = MetadataService::default();
//! let result = service.set(
//!     &CancelToken::new(),
//!     &SetRequest {
//!         io: IoOptions::to_output("report.pdf", "report.tagged.pdf"),
//!         changes: MetadataPatch::new().with(Field::Title, "Quarterly Report"),
//!         ..Default::default()
//!     },
//! )?;
//! println!("{}", result.metadata.title);
//! # Ok(())
//! # }
//! ```

// Error handling
pub mod error;

// Core PDF probing
pub mod document;
pub mod lexer;

// Metadata model and extraction
pub mod extractors;
pub mod model;

// PDF writing
pub mod writer;

// Read-modify-write
pub mod editor;
pub mod filesafe;

// Configuration
pub mod config;

// Application layer
pub mod batch;
pub mod cancel;
pub mod service;
pub mod template;
pub mod validate;

// Command line
pub mod cli;
pub mod output;

// Re-exports
pub use batch::{BatchOutcome, Engine, Manifest, Runner};
pub use cancel::CancelToken;
pub use config::Config;
pub use document::Document;
pub use editor::{MetadataStore, PdfMetadataStore};
pub use error::{Error, ErrorCode, Result};
pub use model::{
    BatchRequest, BatchResult, ExecOptions, Field, IoOptions, Metadata, MetadataPatch,
    SetRequest, ShowRequest, ShowResult, TemplateApplyRequest, TemplateRecord,
    TemplateSaveRequest, UnsetRequest,
};
pub use service::{MetadataService, Service};
pub use template::{FileTemplateStore, TemplateStore};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
