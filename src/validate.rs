//! Request validation.
//!
//! Validators run before any file is touched and report `validation`
//! failures with a message naming the offending flag or field.

use crate::error::{Error, Result};
use crate::model::{
    Field, IoOptions, MetadataPatch, SetRequest, ShowRequest, TemplateApplyRequest,
    TemplateSaveRequest, UnsetRequest, ALL_FIELDS,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// PDF date token, `D:YYYY[MM[DD[HH[mm[SS[Z|+HH'mm']]]]]]`
    static ref RE_PDF_DATE: Regex = Regex::new(
        r"^D:\d{4}(\d{2}(\d{2}(\d{2}(\d{2}(\d{2}([Zz]|[+-]\d{2}'?\d{2}'?)?)?)?)?)?)?$"
    )
    .unwrap();

    /// RFC3339 shape: uppercase `T`, seconds below 60, `Z` or `+HH:MM`
    static ref RE_RFC3339: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:[0-5]\d(\.\d+)?(Z|[+-]\d{2}:\d{2})$"
    )
    .unwrap();
}

/// Why a date value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// Blank after trimming
    #[error("must not be empty")]
    Empty,
    /// Neither RFC3339 nor a PDF date token
    #[error("must be RFC3339 or PDF date format")]
    Format,
}

/// Accept an RFC3339 timestamp or a PDF date token.
pub fn date_string(value: &str) -> std::result::Result<(), DateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DateError::Empty);
    }
    if is_rfc3339(trimmed) || RE_PDF_DATE.is_match(trimmed) {
        return Ok(());
    }
    Err(DateError::Format)
}

// chrono alone also takes a space or lowercase `t` separator, lowercase `z`
// and leap second 60.
fn is_rfc3339(value: &str) -> bool {
    RE_RFC3339.is_match(value) && chrono::DateTime::parse_from_rfc3339(value).is_ok()
}

/// Reject duplicates and return the fields in canonical order.
pub fn normalize_fields(fields: &[Field]) -> Result<Vec<Field>> {
    let mut seen = Vec::with_capacity(fields.len());
    for field in fields {
        if seen.contains(field) {
            return Err(Error::validation(format!("duplicate field {:?}", field.as_str())));
        }
        seen.push(*field);
    }
    Ok(ALL_FIELDS.into_iter().filter(|f| seen.contains(f)).collect())
}

/// Parse a field name as used on the command line and in manifests.
pub fn parse_field(name: &str) -> Result<Field> {
    name.parse()
        .map_err(|_| Error::validation(format!("unknown field {:?}", name)))
}

/// True when the patch names at least one field.
pub fn has_any_patch_field(patch: &MetadataPatch) -> bool {
    patch.has_any()
}

/// Single-file read input.
pub fn show_request(req: &ShowRequest) -> Result<()> {
    if req.input_path.trim().is_empty() {
        return Err(Error::validation("input path is required"));
    }
    Ok(())
}

/// Write destination and metadata changes.
pub fn set_request(req: &SetRequest) -> Result<()> {
    io_options(&req.io)?;
    metadata_patch(&req.changes, req.exec.strict)?;
    if !has_any_patch_field(&req.changes) {
        return Err(Error::validation("at least one metadata field must be set"));
    }
    Ok(())
}

/// Write destination and field selection.
pub fn unset_request(req: &UnsetRequest) -> Result<()> {
    io_options(&req.io)?;
    if req.all && !req.fields.is_empty() {
        return Err(Error::validation("--all cannot be combined with explicit fields"));
    }
    if !req.all && req.fields.is_empty() {
        return Err(Error::validation("at least one field is required when --all is false"));
    }
    normalize_fields(&req.fields).map(|_| ())
}

/// Template payloads before they are persisted. Dates are only checked for
/// emptiness here; they are normalized leniently on save.
pub fn template_save_request(req: &TemplateSaveRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(Error::validation("template name is required"));
    }
    metadata_patch(&req.metadata, false)?;
    if !has_any_patch_field(&req.metadata) {
        return Err(Error::validation("template metadata must include at least one field"));
    }
    Ok(())
}

/// Template name and write destination.
pub fn template_apply_request(req: &TemplateApplyRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(Error::validation("template name is required"));
    }
    io_options(&req.io)
}

fn io_options(io: &IoOptions) -> Result<()> {
    if io.input_path.trim().is_empty() {
        return Err(Error::validation("input path is required"));
    }
    let has_output = !io.output_path.trim().is_empty();
    if !has_output && !io.in_place {
        return Err(Error::validation("either output path or in-place mode is required"));
    }
    if has_output && io.in_place {
        return Err(Error::validation("output path and in-place mode are mutually exclusive"));
    }
    Ok(())
}

fn metadata_patch(patch: &MetadataPatch, strict: bool) -> Result<()> {
    for field in [Field::CreationDate, Field::ModDate] {
        if let Some(value) = patch.get(field) {
            date_value(value, strict)
                .map_err(|e| Error::validation(format!("{} {}", field.as_str(), e)))?;
        }
    }
    Ok(())
}

fn date_value(value: &str, strict: bool) -> std::result::Result<(), DateError> {
    if value.trim().is_empty() {
        return Err(DateError::Empty);
    }
    if strict {
        return date_string(value);
    }
    Ok(())
}
