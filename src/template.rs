//! Named metadata templates.
//!
//! Templates are stored as a single JSON file:
//!
//! ```json
//! {
//!   "templates": [
//!     { "name": "release", "note": "release defaults", "metadata": { "author": "Docs Team" } }
//!   ]
//! }
//! ```
//!
//! Records are kept sorted by name and the file is replaced atomically on
//! every change, so concurrent writers are last-writer-wins but can never
//! leave a torn file behind.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Error, ErrorCode, Result};
use crate::filesafe;
use crate::model::TemplateRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistence for named metadata patches.
pub trait TemplateStore {
    /// Insert a record, replacing an existing one only when `force` is set.
    fn save(
        &self,
        cancel: &CancelToken,
        record: TemplateRecord,
        force: bool,
    ) -> Result<TemplateRecord>;

    /// Look up a record by name.
    fn get(&self, cancel: &CancelToken, name: &str) -> Result<TemplateRecord>;

    /// All records, sorted by name.
    fn list(&self, cancel: &CancelToken) -> Result<Vec<TemplateRecord>>;

    /// Remove a record by name.
    fn delete(&self, cancel: &CancelToken, name: &str) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileState {
    #[serde(default)]
    templates: Vec<TemplateRecord>,
}

/// [`TemplateStore`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    config: Config,
}

impl FileTemplateStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(Config::new().with_template_store(path))
    }

    /// Store at the location resolved from `config` on first use.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Resolved location of the backing file.
    pub fn path(&self) -> Result<PathBuf> {
        self.config.template_store_path()
    }

    fn load(&self) -> Result<FileState> {
        let path = self.path()?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileState::default()),
            Err(e) => {
                return Err(Error::with_cause(
                    ErrorCode::Io,
                    format!("read template store {:?}", path.display().to_string()),
                    e,
                ))
            },
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(FileState::default());
        }

        let mut state: FileState = serde_json::from_slice(&bytes)
            .map_err(|e| Error::with_cause(ErrorCode::Internal, "decode template store", e))?;
        sort_templates(&mut state.templates);
        Ok(state)
    }

    fn store(&self, mut state: FileState) -> Result<()> {
        let path = self.path()?;
        sort_templates(&mut state.templates);
        let mut bytes = serde_json::to_vec_pretty(&state)
            .map_err(|e| Error::with_cause(ErrorCode::Internal, "encode template store", e))?;
        bytes.push(b'\n');

        filesafe::write_atomic(&path, &bytes, self.config.file_mode).map_err(|e| {
            Error::with_cause(
                ErrorCode::Io,
                format!("write template store {:?}", path.display().to_string()),
                e,
            )
        })?;
        log::info!("saved {} template(s) to {}", state.templates.len(), path.display());
        Ok(())
    }
}

impl Default for FileTemplateStore {
    fn default() -> Self {
        Self::from_config(Config::new())
    }
}

impl TemplateStore for FileTemplateStore {
    fn save(
        &self,
        cancel: &CancelToken,
        mut record: TemplateRecord,
        force: bool,
    ) -> Result<TemplateRecord> {
        cancel.check()?;
        record.name = required_name(&record.name)?.to_string();

        let mut state = self.load()?;
        match state.templates.iter().position(|r| r.name == record.name) {
            Some(_) if !force => {
                return Err(Error::new(
                    ErrorCode::Conflict,
                    format!("template {:?} already exists", record.name),
                ));
            },
            Some(i) => state.templates[i] = record.clone(),
            None => state.templates.push(record.clone()),
        }
        self.store(state)?;
        Ok(record)
    }

    fn get(&self, cancel: &CancelToken, name: &str) -> Result<TemplateRecord> {
        cancel.check()?;
        let name = required_name(name)?;
        self.load()?
            .templates
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| not_found(name))
    }

    fn list(&self, cancel: &CancelToken) -> Result<Vec<TemplateRecord>> {
        cancel.check()?;
        Ok(self.load()?.templates)
    }

    fn delete(&self, cancel: &CancelToken, name: &str) -> Result<()> {
        cancel.check()?;
        let name = required_name(name)?;
        let mut state = self.load()?;
        let before = state.templates.len();
        state.templates.retain(|r| r.name != name);
        if state.templates.len() == before {
            return Err(not_found(name));
        }
        self.store(state)
    }
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("template name is required"));
    }
    Ok(name)
}

fn not_found(name: &str) -> Error {
    Error::new(ErrorCode::NotFound, format!("template {:?} not found", name))
}

fn sort_templates(records: &mut [TemplateRecord]) {
    records.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, MetadataPatch};

    fn record(name: &str, title: &str) -> TemplateRecord {
        TemplateRecord {
            name: name.into(),
            note: String::new(),
            metadata: MetadataPatch::new().with(Field::Title, title),
        }
    }

    #[test]
    fn test_state_json_shape() {
        let state = FileState {
            templates: vec![record("release", "Notes")],
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"templates":[{"name":"release","metadata":{"title":"Notes"}}]}"#);
    }

    #[test]
    fn test_blank_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, " \n\t").unwrap();
        let store = FileTemplateStore::new(&path);
        assert!(store.list(&CancelToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_save_trims_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(dir.path().join("t.json"));
        let saved = store.save(&CancelToken::new(), record("  padded ", "x"), false).unwrap();
        assert_eq!(saved.name, "padded");
        assert!(store.get(&CancelToken::new(), "padded").is_ok());
    }
}
