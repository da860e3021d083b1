//! Configuration for pdfmeta.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the template store file.
pub const TEMPLATE_STORE_ENV: &str = "PDFMETA_TEMPLATE_STORE";

/// Permission bits for written PDFs and the template store.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Permission bits for directories created on the way to an output file.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit template store location. Falls back to the environment and
    /// then the home directory when unset.
    pub template_store: Option<PathBuf>,

    /// Permission bits for written files.
    pub file_mode: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            template_store: None,
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    /// Configuration seeded from `PDFMETA_TEMPLATE_STORE`.
    pub fn from_env() -> Self {
        let template_store = std::env::var_os(TEMPLATE_STORE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            template_store,
            ..Self::new()
        }
    }

    /// Use an explicit template store file.
    pub fn with_template_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_store = Some(path.into());
        self
    }

    /// Set the permission bits for written files.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Resolve the template store path.
    ///
    /// Order: explicit path, `PDFMETA_TEMPLATE_STORE`, then
    /// `$HOME/.pdfmeta/templates.json`.
    pub fn template_store_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.template_store.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return Ok(path.clone());
        }
        if let Some(env) = std::env::var_os(TEMPLATE_STORE_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(env));
        }
        let home = std::env::var_os("HOME")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::internal("resolve home directory"))?;
        Ok(PathBuf::from(home).join(".pdfmeta").join("templates.json"))
    }
}
