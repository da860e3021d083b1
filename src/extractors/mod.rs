//! Metadata extraction from PDF documents.
//!
//! A document can describe itself twice: in the legacy Info dictionary named
//! by the trailer, and in an XMP packet hanging off the Catalog's
//! `/Metadata` stream. [`read_native_metadata`] reads both and merges them,
//! preferring XMP.

pub mod info;
pub mod xmp;

pub use info::InfoExtractor;
pub use xmp::XmpExtractor;

use crate::lexer::{first_dict, last_trailer_dict, object_body, parse_named_ref, stream_content};
use crate::model::Metadata;

/// The merged metadata view plus which sources were present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeMetadata {
    /// XMP values, with empty fields filled from the Info dictionary
    pub metadata: Metadata,
    /// An Info dictionary was found and read
    pub info_found: bool,
    /// A `/Metadata` stream was found and decoded
    pub xmp_found: bool,
}

/// Read Info and XMP metadata from raw PDF bytes.
///
/// Never fails: missing trailers, references, objects or keys leave the
/// corresponding view empty, and an undecodable XMP stream counts as absent.
pub fn read_native_metadata(bytes: &[u8]) -> NativeMetadata {
    let mut result = NativeMetadata::default();

    let Some(trailer) = last_trailer_dict(bytes) else {
        log::debug!("no trailer dictionary found");
        return result;
    };
    let Some(root) = parse_named_ref(trailer, "Root") else {
        log::debug!("trailer has no /Root reference");
        return result;
    };

    let mut info_view = Metadata::new();
    if let Some(info_ref) = parse_named_ref(trailer, "Info") {
        if let Some(dict) = object_body(bytes, info_ref.obj, info_ref.gen).and_then(first_dict) {
            info_view = InfoExtractor::parse_info_dict(dict);
            result.info_found = true;
        } else {
            log::debug!("info object {} not readable", info_ref);
        }
    }

    let mut xmp_view = Metadata::new();
    let metadata_ref = object_body(bytes, root.obj, root.gen)
        .and_then(first_dict)
        .and_then(|catalog| parse_named_ref(catalog, "Metadata"));
    if let Some(metadata_ref) = metadata_ref {
        let packet = object_body(bytes, metadata_ref.obj, metadata_ref.gen).and_then(stream_content);
        match packet.map(XmpExtractor::parse_xmp) {
            Some(Ok(parsed)) => {
                xmp_view = parsed;
                result.xmp_found = true;
            },
            Some(Err(e)) => {
                log::warn!("ignoring unreadable XMP stream {}: {}", metadata_ref, e);
            },
            None => {
                log::debug!("metadata object {} has no stream", metadata_ref);
            },
        }
    }

    result.metadata = xmp_view.merged_with(&info_view);
    result
}
