//! Application service tying the metadata store, the template store and
//! the batch engine together.
//!
//! Requests arriving here are assumed to have passed [`crate::validate`].
//! The service trims text values and normalizes dates, both in patches on
//! the way in and in the metadata it reports back.

use crate::batch::{BatchOutcome, Engine, Runner};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::editor::{MetadataStore, PdfMetadataStore};
use crate::error::{Error, Result};
use crate::model::{
    BatchRequest, Field, Metadata, MetadataPatch, MetadataWriteRequest, ReadResult, SetRequest,
    ShowRequest, ShowResult, TemplateApplyRequest, TemplateRecord, TemplateSaveRequest,
    UnsetRequest,
};
use crate::template::{FileTemplateStore, TemplateStore};
use crate::validate;
use chrono::{NaiveDate, NaiveDateTime};

/// Text fields that are trimmed but otherwise left alone.
const TEXT_FIELDS: [Field; 6] = [
    Field::Title,
    Field::Author,
    Field::Subject,
    Field::Keywords,
    Field::Creator,
    Field::Producer,
];

const DATE_FIELDS: [Field; 2] = [Field::CreationDate, Field::ModDate];

/// Lenient date spellings rewritten to RFC3339 UTC.
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DAY_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Every user-facing operation.
pub trait Service {
    fn show(&self, cancel: &CancelToken, req: &ShowRequest) -> Result<ShowResult>;
    fn set(&self, cancel: &CancelToken, req: &SetRequest) -> Result<ShowResult>;
    fn unset(&self, cancel: &CancelToken, req: &UnsetRequest) -> Result<ShowResult>;
    fn batch(&self, cancel: &CancelToken, req: &BatchRequest) -> BatchOutcome;
    fn template_save(&self, cancel: &CancelToken, req: &TemplateSaveRequest) -> Result<TemplateRecord>;
    fn template_apply(&self, cancel: &CancelToken, req: &TemplateApplyRequest) -> Result<ShowResult>;
    fn template_list(&self, cancel: &CancelToken) -> Result<Vec<TemplateRecord>>;
    fn template_show(&self, cancel: &CancelToken, name: &str) -> Result<TemplateRecord>;
    fn template_delete(&self, cancel: &CancelToken, name: &str) -> Result<()>;
}

/// [`Service`] over pluggable stores.
#[derive(Debug, Clone)]
pub struct MetadataService<M = PdfMetadataStore, T = FileTemplateStore> {
    metadata: M,
    templates: T,
}

impl MetadataService {
    /// File-backed service configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PdfMetadataStore::new().with_file_mode(config.file_mode),
            FileTemplateStore::from_config(config.clone()),
        )
    }
}

impl Default for MetadataService {
    fn default() -> Self {
        Self::from_config(&Config::from_env())
    }
}

impl<M: MetadataStore, T: TemplateStore> MetadataService<M, T> {
    /// Create a service over explicit stores.
    pub fn new(metadata: M, templates: T) -> Self {
        Self {
            metadata,
            templates,
        }
    }

    /// The underlying metadata store.
    pub fn metadata_store(&self) -> &M {
        &self.metadata
    }

    /// The underlying template store.
    pub fn template_store(&self) -> &T {
        &self.templates
    }

    fn report(input_path: &str, rr: ReadResult, strict: bool) -> Result<ShowResult> {
        let (metadata, changed) = normalize_metadata(rr.metadata, strict)?;
        Ok(ShowResult {
            input_path: input_path.to_string(),
            encrypted: rr.encrypted,
            metadata,
            info_found: rr.info_found,
            xmp_found: rr.xmp_found,
            normalized: rr.normalized || changed,
        })
    }
}

impl<M: MetadataStore, T: TemplateStore> Service for MetadataService<M, T> {
    fn show(&self, cancel: &CancelToken, req: &ShowRequest) -> Result<ShowResult> {
        let rr = self.metadata.read(cancel, &req.input_path)?;
        Self::report(&req.input_path, rr, false)
    }

    fn set(&self, cancel: &CancelToken, req: &SetRequest) -> Result<ShowResult> {
        let patch = normalize_patch(&req.changes, req.exec.strict)?;
        let rr = self.metadata.write(
            cancel,
            &MetadataWriteRequest {
                input_path: req.io.input_path.clone(),
                output_path: req.io.output_path.clone(),
                in_place: req.io.in_place,
                strict: req.exec.strict,
                set: patch,
                ..Default::default()
            },
        )?;
        Self::report(req.io.effective_output_path(), rr, req.exec.strict)
    }

    fn unset(&self, cancel: &CancelToken, req: &UnsetRequest) -> Result<ShowResult> {
        let fields = validate::normalize_fields(&req.fields)?;
        let rr = self.metadata.write(
            cancel,
            &MetadataWriteRequest {
                input_path: req.io.input_path.clone(),
                output_path: req.io.output_path.clone(),
                in_place: req.io.in_place,
                strict: req.exec.strict,
                unset: fields,
                unset_all: req.all,
                ..Default::default()
            },
        )?;
        Self::report(req.io.effective_output_path(), rr, req.exec.strict)
    }

    fn batch(&self, cancel: &CancelToken, req: &BatchRequest) -> BatchOutcome {
        Engine::new(self).execute(cancel, req)
    }

    fn template_save(&self, cancel: &CancelToken, req: &TemplateSaveRequest) -> Result<TemplateRecord> {
        let metadata = normalize_patch(&req.metadata, false)?;
        let record = TemplateRecord {
            name: req.name.trim().to_string(),
            note: req.note.trim().to_string(),
            metadata,
        };
        self.templates.save(cancel, record, req.force)
    }

    fn template_apply(&self, cancel: &CancelToken, req: &TemplateApplyRequest) -> Result<ShowResult> {
        let record = self.templates.get(cancel, &req.name)?;
        log::debug!("applying template {:?} to {}", record.name, req.io.input_path);
        Service::set(
            self,
            cancel,
            &SetRequest {
                io: req.io.clone(),
                exec: req.exec,
                changes: record.metadata,
            },
        )
    }

    fn template_list(&self, cancel: &CancelToken) -> Result<Vec<TemplateRecord>> {
        self.templates.list(cancel)
    }

    fn template_show(&self, cancel: &CancelToken, name: &str) -> Result<TemplateRecord> {
        self.templates.get(cancel, name)
    }

    fn template_delete(&self, cancel: &CancelToken, name: &str) -> Result<()> {
        self.templates.delete(cancel, name)
    }
}

impl<M: MetadataStore, T: TemplateStore> Runner for MetadataService<M, T> {
    fn show(&self, cancel: &CancelToken, req: &ShowRequest) -> Result<ShowResult> {
        Service::show(self, cancel, req)
    }

    fn set(&self, cancel: &CancelToken, req: &SetRequest) -> Result<ShowResult> {
        Service::set(self, cancel, req)
    }

    fn unset(&self, cancel: &CancelToken, req: &UnsetRequest) -> Result<ShowResult> {
        Service::unset(self, cancel, req)
    }

    fn template_apply(&self, cancel: &CancelToken, req: &TemplateApplyRequest) -> Result<ShowResult> {
        Service::template_apply(self, cancel, req)
    }
}

/// Trim present text entries and normalize present dates.
pub fn normalize_patch(patch: &MetadataPatch, strict: bool) -> Result<MetadataPatch> {
    let mut out = patch.clone();
    for field in TEXT_FIELDS {
        if let Some(value) = out.slot_mut(field) {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
    }
    for field in DATE_FIELDS {
        if let Some(value) = out.slot_mut(field) {
            *value = normalize_date(value, strict)?.0;
        }
    }
    Ok(out)
}

/// Trim text fields and normalize dates, reporting whether anything changed.
pub fn normalize_metadata(mut meta: Metadata, strict: bool) -> Result<(Metadata, bool)> {
    let mut changed = false;
    for field in TEXT_FIELDS {
        let value = meta.get_mut(field);
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            *value = trimmed.to_string();
            changed = true;
        }
    }
    for field in DATE_FIELDS {
        let (next, date_changed) = normalize_date(meta.get(field), strict)?;
        changed |= date_changed;
        meta.set(field, next);
    }
    Ok((meta, changed))
}

/// Normalize one date value.
///
/// Valid RFC3339 and PDF date values are kept (trimmed). Otherwise strict
/// mode rejects the value, and lenient mode rewrites a few common
/// `YYYY-MM-DD[ HH:MM:SS]` and `YYYY/MM/DD[ HH:MM:SS]` spellings to RFC3339
/// UTC, passing anything else through unchanged.
pub fn normalize_date(input: &str, strict: bool) -> Result<(String, bool)> {
    let value = input.trim();
    if value.is_empty() {
        return Ok((String::new(), false));
    }
    if validate::date_string(value).is_ok() {
        return Ok((value.to_string(), value != input));
    }
    if strict {
        return Err(Error::validation("invalid date format"));
    }

    let parsed = DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .or_else(|| {
            DAY_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(value, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });
    match parsed {
        Some(ts) => Ok((ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(), true)),
        None => Ok((value.to_string(), false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_normalize_date_keeps_valid_values() {
        assert_eq!(
            normalize_date("2024-01-02T03:04:05Z", false).unwrap(),
            ("2024-01-02T03:04:05Z".to_string(), false)
        );
        assert_eq!(
            normalize_date("  D:20240102  ", true).unwrap(),
            ("D:20240102".to_string(), true)
        );
        assert_eq!(normalize_date("   ", true).unwrap(), (String::new(), false));
    }

    #[test]
    fn test_normalize_date_lenient_layouts() {
        let cases = [
            ("2024-01-02", "2024-01-02T00:00:00Z"),
            ("2024/01/02", "2024-01-02T00:00:00Z"),
            ("2024-01-02 10:11:12", "2024-01-02T10:11:12Z"),
            ("2024/01/02 10:11:12", "2024-01-02T10:11:12Z"),
        ];
        for (input, want) in cases {
            assert_eq!(normalize_date(input, false).unwrap(), (want.to_string(), true), "{}", input);
        }
        assert_eq!(
            normalize_date("next tuesday", false).unwrap(),
            ("next tuesday".to_string(), false)
        );
    }

    #[test]
    fn test_normalize_date_strict_rejects() {
        let err = normalize_date("2024/01/02", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "invalid date format");
    }

    fn assert_strict_rejects(value: &str) {
        let err = normalize_date(value, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation, "{}", value);
        assert_eq!(err.message, "invalid date format");
    }

    #[test]
    fn test_normalize_date_strict_rejects_space_separator() {
        assert_strict_rejects("2024-01-02 10:11:12Z");
    }

    #[test]
    fn test_normalize_date_strict_rejects_lowercase_markers() {
        assert_strict_rejects("2024-01-02t10:11:12z");
        assert_strict_rejects("2024-01-02T10:11:12z");
    }

    #[test]
    fn test_normalize_date_strict_rejects_leap_second() {
        assert_strict_rejects("2024-01-02T10:11:60Z");
    }

    #[test]
    fn test_normalize_date_lenient_passes_near_misses_through() {
        assert_eq!(
            normalize_date("2024-01-02 10:11:12Z", false).unwrap(),
            ("2024-01-02 10:11:12Z".to_string(), false)
        );
    }

    #[test]
    fn test_normalize_patch() {
        let patch = MetadataPatch::new()
            .with(Field::Title, "  Padded  ")
            .with(Field::Author, "")
            .with(Field::CreationDate, "2024-05-06");
        let out = normalize_patch(&patch, false).unwrap();
        assert_eq!(out.get(Field::Title), Some("Padded"));
        assert_eq!(out.get(Field::Author), Some(""));
        assert_eq!(out.get(Field::CreationDate), Some("2024-05-06T00:00:00Z"));
        assert_eq!(out.get(Field::Subject), None);
    }

    #[test]
    fn test_normalize_metadata_reports_changes() {
        let clean = Metadata::new().with(Field::Title, "T");
        assert_eq!(normalize_metadata(clean.clone(), false).unwrap(), (clean, false));

        let dirty = Metadata::new()
            .with(Field::Producer, " p ")
            .with(Field::ModDate, "2024/01/02");
        let (meta, changed) = normalize_metadata(dirty, false).unwrap();
        assert!(changed);
        assert_eq!(meta.producer, "p");
        assert_eq!(meta.mod_date, "2024-01-02T00:00:00Z");
    }
}
