//! Document Info dictionary decoding.
//!
//! The Info dictionary (ISO 32000-1:2008, Section 14.3.3) stores each entry
//! as a text string. Only the eight keys of [`Metadata`] are read; anything
//! else in the dictionary is ignored.

use crate::lexer::{decode_pdf_string, find_dict_value};
use crate::model::{Metadata, ALL_FIELDS};

/// Info dictionary extractor.
pub struct InfoExtractor;

impl InfoExtractor {
    /// Decode the known entries of an Info dictionary.
    ///
    /// Keys that are absent, or whose value is not a string or name, stay
    /// empty.
    pub fn parse_info_dict(dict: &[u8]) -> Metadata {
        let mut metadata = Metadata::new();
        for field in ALL_FIELDS {
            if let Some(raw) = find_dict_value(dict, field.info_key()) {
                metadata.set(field, decode_pdf_string(raw));
            }
        }
        metadata
    }
}
