//! Crash-safe file replacement.
//!
//! Every write goes to a sibling temp file (`.pdfmeta-tmp-<uuid>`) in the
//! destination's directory, which is synced and then renamed over the
//! destination. Readers see either the old file or the new one, never a
//! partial write. The temp file is removed on every failure before the
//! rename.

use crate::config::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Prefix of temp files created next to the destination.
pub const TEMP_PREFIX: &str = ".pdfmeta-tmp-";

/// Failure of an atomic file operation.
#[derive(Debug, thiserror::Error)]
pub enum FileSafeError {
    /// An empty path was supplied
    #[error("{0} is required")]
    MissingPath(&'static str),

    /// `replace_atomic` was given files in different directories
    #[error("staged file must be in the same directory as target")]
    DifferentDirectory,

    /// A file system step failed
    #[error("{step}: {source}")]
    Io {
        /// Which step failed
        step: &'static str,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Result alias for this module.
pub type Result<T> = std::result::Result<T, FileSafeError>;

fn step(step: &'static str) -> impl FnOnce(io::Error) -> FileSafeError {
    move |source| FileSafeError::Io { step, source }
}

/// Atomically replace `path` with `content`. A `mode` of zero means 0o644.
pub fn write_atomic(path: impl AsRef<Path>, content: &[u8], mode: u32) -> Result<()> {
    write_atomic_from_reader(path, &mut &content[..], mode)
}

/// Atomically replace `path` with everything `reader` yields.
pub fn write_atomic_from_reader<R: Read + ?Sized>(
    path: impl AsRef<Path>,
    reader: &mut R,
    mode: u32,
) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileSafeError::MissingPath("path"));
    }
    let mode = if mode == 0 { DEFAULT_FILE_MODE } else { mode };
    let dir = parent_dir(path);
    create_dir_all(&dir).map_err(step("create parent dir"))?;

    let tmp_path = dir.join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4().simple()));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(step("create temp file"))?;

    if let Err(e) = fill_temp(file, reader, mode) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(step("rename temp file")(e));
    }
    sync_dir(&dir).map_err(step("sync parent dir"))?;
    log::debug!("atomically wrote {}", path.display());
    Ok(())
}

/// Promote an already written `staged` file over `target`.
///
/// Both paths must live in the same directory so the rename stays atomic.
pub fn replace_atomic(target: impl AsRef<Path>, staged: impl AsRef<Path>) -> Result<()> {
    let (target, staged) = (target.as_ref(), staged.as_ref());
    if target.as_os_str().is_empty() || staged.as_os_str().is_empty() {
        return Err(FileSafeError::MissingPath("target and staged path"));
    }
    let target_dir = parent_dir(target);
    if target_dir != parent_dir(staged) {
        return Err(FileSafeError::DifferentDirectory);
    }
    fs::rename(staged, target).map_err(step("rename staged file"))?;
    sync_dir(&target_dir).map_err(step("sync parent dir"))
}

/// Copy `src` over `dst` atomically.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>, mode: u32) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    if src.as_os_str().is_empty() || dst.as_os_str().is_empty() {
        return Err(FileSafeError::MissingPath("source and destination path"));
    }
    let mut file = File::open(src).map_err(step("open source file"))?;
    write_atomic_from_reader(dst, &mut file, mode)
}

fn fill_temp<R: Read + ?Sized>(mut file: File, reader: &mut R, mode: u32) -> Result<()> {
    set_mode(&file, mode).map_err(step("chmod temp file"))?;
    io::copy(reader, &mut file).map_err(step("write temp file"))?;
    file.flush().map_err(step("write temp file"))?;
    file.sync_all().map_err(step("sync temp file"))?;
    Ok(())
}

/// Directory holding `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(DEFAULT_DIR_MODE).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    let _ = DEFAULT_DIR_MODE;
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("out.pdf")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/b.pdf")), PathBuf::from("a"));
    }

    #[test]
    fn test_empty_paths_rejected() {
        assert!(matches!(write_atomic("", b"x", 0), Err(FileSafeError::MissingPath(_))));
        assert!(matches!(replace_atomic("", "x"), Err(FileSafeError::MissingPath(_))));
        assert!(matches!(copy_file("a", "", 0), Err(FileSafeError::MissingPath(_))));
    }

    #[test]
    fn test_error_display() {
        let err = step("sync temp file")(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.to_string(), "sync temp file: boom");
    }
}
