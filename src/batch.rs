//! Batch execution of metadata operations from a JSON manifest.
//!
//! ```json
//! {
//!   "items": [
//!     { "op": "show", "input": "a.pdf" },
//!     { "op": "set", "input": "b.pdf", "output": "b.out.pdf", "set": { "title": "Report" } },
//!     { "op": "unset", "input": "c.pdf", "inPlace": true, "unsetAll": true },
//!     { "op": "template-apply", "input": "d.pdf", "inPlace": true, "template": "release" }
//!   ]
//! }
//! ```
//!
//! Items run in manifest order. Without `continue_on_error` the run stops at
//! the first failing item; either way a run with failures ends in an
//! aggregate `unknown` error while keeping the per-item results.

use crate::cancel::CancelToken;
use crate::error::{Error, ErrorCode, Result};
use crate::model::{
    BatchItemResult, BatchRequest, BatchResult, ExecOptions, Field, IoOptions, ItemStatus,
    MetadataPatch, SetRequest, ShowRequest, ShowResult, TemplateApplyRequest, UnsetRequest,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Operations a manifest item can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read metadata
    Show,
    /// Apply a patch
    Set,
    /// Clear fields
    Unset,
    /// Apply a saved template
    TemplateApply,
}

impl Operation {
    /// Manifest spelling of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Show => "show",
            Operation::Set => "set",
            Operation::Unset => "unset",
            Operation::TemplateApply => "template-apply",
        }
    }

    /// Parse a manifest `op` value.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "show" => Some(Operation::Show),
            "set" => Some(Operation::Set),
            "unset" => Some(Operation::Unset),
            "template-apply" => Some(Operation::TemplateApply),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub items: Vec<Item>,
}

/// One manifest entry. `op` stays a plain string so that an unknown
/// operation fails its own item instead of the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub op: String,
    pub input: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub in_place: bool,
    #[serde(skip_serializing_if = "is_empty_patch")]
    pub set: MetadataPatch,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<Field>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unset_all: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
}

fn is_empty_patch(patch: &MetadataPatch) -> bool {
    !patch.has_any()
}

impl Item {
    /// An item running `op` on `input`.
    pub fn new(op: Operation, input: impl Into<String>) -> Self {
        Self {
            op: op.as_str().to_string(),
            input: input.into(),
            ..Default::default()
        }
    }

    fn io(&self) -> IoOptions {
        IoOptions {
            input_path: self.input.clone(),
            output_path: self.output.clone(),
            in_place: self.in_place,
        }
    }
}

/// The operations a batch can dispatch to.
pub trait Runner {
    fn show(&self, cancel: &CancelToken, req: &ShowRequest) -> Result<ShowResult>;
    fn set(&self, cancel: &CancelToken, req: &SetRequest) -> Result<ShowResult>;
    fn unset(&self, cancel: &CancelToken, req: &UnsetRequest) -> Result<ShowResult>;
    fn template_apply(&self, cancel: &CancelToken, req: &TemplateApplyRequest) -> Result<ShowResult>;
}

/// Items processed so far, and the error that ended or summarizes the run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub result: BatchResult,
    pub error: Option<Error>,
}

impl BatchOutcome {
    fn failed(error: Error) -> Self {
        Self {
            result: BatchResult::default(),
            error: Some(error),
        }
    }

    /// Collapse into a plain result, dropping partial results on failure.
    pub fn into_result(self) -> Result<BatchResult> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

/// Runs manifests against a [`Runner`].
pub struct Engine<'a, R: Runner + ?Sized> {
    runner: &'a R,
}

impl<'a, R: Runner + ?Sized> Engine<'a, R> {
    /// Create an engine dispatching to `runner`.
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Load the manifest named by `req` and run its items in order.
    pub fn execute(&self, cancel: &CancelToken, req: &BatchRequest) -> BatchOutcome {
        let manifest = match load_manifest(&req.manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => return BatchOutcome::failed(e),
        };

        let mut result = BatchResult {
            items: Vec::with_capacity(manifest.items.len()),
            total: manifest.items.len(),
            ..Default::default()
        };

        for item in &manifest.items {
            if let Err(e) = cancel.check_with("batch canceled") {
                return BatchOutcome {
                    result,
                    error: Some(e),
                };
            }

            let mut entry = BatchItemResult {
                input_path: item.input.clone(),
                output_path: item.output.clone(),
                status: ItemStatus::Ok,
                error: String::new(),
            };
            match self.run_item(cancel, item, req.strict) {
                Ok(()) => {
                    result.items.push(entry);
                    result.succeeded += 1;
                },
                Err(e) => {
                    log::warn!("batch item {} ({}) failed: {}", item.input, item.op, e);
                    entry.status = ItemStatus::Error;
                    entry.error = e.to_string();
                    result.items.push(entry);
                    result.failed += 1;
                    if !req.continue_on_error {
                        break;
                    }
                },
            }
        }

        log::info!(
            "batch finished: {} total, {} succeeded, {} failed",
            result.total,
            result.succeeded,
            result.failed
        );
        let error = aggregate_error(&result);
        BatchOutcome { result, error }
    }

    fn run_item(&self, cancel: &CancelToken, item: &Item, strict: bool) -> Result<()> {
        if item.input.is_empty() {
            return Err(Error::validation("input is required"));
        }
        let exec = ExecOptions {
            strict,
            json: false,
        };
        let op = Operation::parse(&item.op)
            .ok_or_else(|| Error::validation(format!("unsupported op {:?}", item.op)))?;

        match op {
            Operation::Show => {
                let req = ShowRequest {
                    input_path: item.input.clone(),
                    json: false,
                };
                self.runner.show(cancel, &req)?;
            },
            Operation::Set => {
                let req = SetRequest {
                    io: item.io(),
                    exec,
                    changes: item.set.clone(),
                };
                self.runner.set(cancel, &req)?;
            },
            Operation::Unset => {
                let req = UnsetRequest {
                    io: item.io(),
                    exec,
                    fields: item.unset.clone(),
                    all: item.unset_all,
                };
                self.runner.unset(cancel, &req)?;
            },
            Operation::TemplateApply => {
                let req = TemplateApplyRequest {
                    name: item.template.clone(),
                    io: item.io(),
                    exec,
                };
                self.runner.template_apply(cancel, &req)?;
            },
        }
        Ok(())
    }
}

/// The `unknown` failure summarizing a run with failed items.
pub fn aggregate_error(result: &BatchResult) -> Option<Error> {
    if result.failed == 0 {
        return None;
    }
    Some(Error::new(
        ErrorCode::Unknown,
        format!("batch completed with {} failure(s)", result.failed),
    ))
}

/// Read and decode a manifest file.
///
/// # Errors
///
/// - `validation` for an empty path, undecodable JSON, or no items
/// - `not_found` / `io` when the file cannot be read
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::validation("manifest path is required"));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        Error::from_io(format!("read manifest {:?}", path.display().to_string()), e)
    })?;
    let manifest: Manifest = serde_json::from_slice(&bytes)
        .map_err(|e| Error::with_cause(ErrorCode::Validation, "decode manifest json", e))?;
    if manifest.items.is_empty() {
        return Err(Error::validation("manifest must include at least one item"));
    }
    log::debug!("loaded manifest {} with {} item(s)", path.display(), manifest.items.len());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        for op in [
            Operation::Show,
            Operation::Set,
            Operation::Unset,
            Operation::TemplateApply,
        ] {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operation::parse("merge"), None);
    }

    #[test]
    fn test_item_json() {
        let json = r#"{"op":"set","input":"a.pdf","inPlace":true,"set":{"title":"T","creationDate":"2024-01-01"},"unset":["mod-date"]}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.op, "set");
        assert!(item.in_place);
        assert_eq!(item.set.get(Field::Title), Some("T"));
        assert_eq!(item.set.get(Field::CreationDate), Some("2024-01-01"));
        assert_eq!(item.unset, vec![Field::ModDate]);

        let back = serde_json::to_string(&Item::new(Operation::Show, "x.pdf")).unwrap();
        assert_eq!(back, r#"{"op":"show","input":"x.pdf"}"#);
    }

    #[test]
    fn test_aggregate_error() {
        assert!(aggregate_error(&BatchResult::default()).is_none());
        let failed = BatchResult {
            failed: 2,
            ..Default::default()
        };
        let err = aggregate_error(&failed).unwrap();
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(err.to_string(), "batch completed with 2 failure(s)");
    }

    /// Records every call and fails the listed inputs.
    #[derive(Default)]
    struct FakeRunner {
        fail: Vec<&'static str>,
        calls: std::cell::RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn record(&self, op: &str, input: &str) -> Result<ShowResult> {
            self.calls.borrow_mut().push(format!("{}:{}", op, input));
            if self.fail.iter().any(|f| *f == input) {
                return Err(Error::new(ErrorCode::Io, "boom"));
            }
            Ok(ShowResult {
                input_path: input.to_string(),
                ..Default::default()
            })
        }
    }

    impl Runner for FakeRunner {
        fn show(&self, _: &CancelToken, req: &ShowRequest) -> Result<ShowResult> {
            self.record("show", &req.input_path)
        }
        fn set(&self, _: &CancelToken, req: &SetRequest) -> Result<ShowResult> {
            self.record("set", &req.io.input_path)
        }
        fn unset(&self, _: &CancelToken, req: &UnsetRequest) -> Result<ShowResult> {
            self.record("unset", &req.io.input_path)
        }
        fn template_apply(&self, _: &CancelToken, req: &TemplateApplyRequest) -> Result<ShowResult> {
            self.record(&format!("template-apply({})", req.name), &req.io.input_path)
        }
    }

    fn write_manifest(dir: &tempfile::TempDir, json: &str) -> String {
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, json).unwrap();
        path.to_string_lossy().into_owned()
    }

    const THREE_ITEMS: &str = r#"{"items":[
        {"op":"set","input":"a.pdf","inPlace":true,"set":{"title":"A"}},
        {"op":"unset","input":"b.pdf","output":"b.out.pdf","unset":["title"]},
        {"op":"template-apply","input":"c.pdf","inPlace":true,"template":"release"}
    ]}"#;

    #[test]
    fn test_continue_on_error_runs_every_item() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner {
            fail: vec!["b.pdf"],
            ..Default::default()
        };
        let req = BatchRequest {
            manifest_path: write_manifest(&dir, THREE_ITEMS),
            continue_on_error: true,
            ..Default::default()
        };

        let outcome = Engine::new(&runner).execute(&CancelToken::new(), &req);
        assert_eq!(outcome.result.total, 3);
        assert_eq!(outcome.result.succeeded, 2);
        assert_eq!(outcome.result.failed, 1);
        assert_eq!(
            *runner.calls.borrow(),
            vec!["set:a.pdf", "unset:b.pdf", "template-apply(release):c.pdf"]
        );

        let failed = &outcome.result.items[1];
        assert_eq!(failed.status, ItemStatus::Error);
        assert_eq!(failed.error, "boom");
        assert_eq!(failed.output_path, "b.out.pdf");
        assert_eq!(outcome.error.unwrap().code, ErrorCode::Unknown);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner {
            fail: vec!["b.pdf"],
            ..Default::default()
        };
        let req = BatchRequest {
            manifest_path: write_manifest(&dir, THREE_ITEMS),
            ..Default::default()
        };

        let outcome = Engine::new(&runner).execute(&CancelToken::new(), &req);
        assert_eq!(outcome.result.total, 3);
        assert_eq!(outcome.result.succeeded, 1);
        assert_eq!(outcome.result.failed, 1);
        assert_eq!(outcome.result.items.len(), 2);
        assert_eq!(runner.calls.borrow().len(), 2);
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_item_level_failures() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let req = BatchRequest {
            manifest_path: write_manifest(
                &dir,
                r#"{"items":[{"op":"merge","input":"a.pdf"},{"op":"show","input":""}]}"#,
            ),
            continue_on_error: true,
            ..Default::default()
        };

        let outcome = Engine::new(&runner).execute(&CancelToken::new(), &req);
        assert_eq!(outcome.result.failed, 2);
        assert_eq!(outcome.result.items[0].status, ItemStatus::Error);
        assert_eq!(outcome.result.items[0].error, "unsupported op \"merge\"");
        assert_eq!(outcome.result.items[1].error, "input is required");
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_canceled_before_first_item() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let req = BatchRequest {
            manifest_path: write_manifest(&dir, THREE_ITEMS),
            ..Default::default()
        };
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = Engine::new(&runner).execute(&cancel, &req);
        let err = outcome.error.unwrap();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "batch canceled");
        assert_eq!(outcome.result.total, 3);
        assert!(outcome.result.items.is_empty());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_load_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_manifest("").unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "manifest path is required");

        let err = load_manifest(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = load_manifest(write_manifest(&dir, "{not json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "decode manifest json");

        let err = load_manifest(write_manifest(&dir, r#"{"items":[]}"#)).unwrap_err();
        assert_eq!(err.message, "manifest must include at least one item");
    }
}
