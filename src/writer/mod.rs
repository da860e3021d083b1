//! PDF writing for metadata updates.
//!
//! ## Architecture
//!
//! ```text
//! Metadata
//!     ↓
//! [XmpWriter] (record → XMP packet bytes)
//!     ↓
//! [write_incremental] (Info + /Metadata stream + Catalog appended to the source)
//!     ↓
//! PDF bytes
//! ```

pub mod incremental;
pub mod xmp_metadata;

pub use incremental::write_incremental;
pub use xmp_metadata::{escape_xml, upsert_packet, XmpWriter};
