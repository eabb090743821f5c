//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Replace `path` with `content` without readers ever seeing a partial file.
///
/// The bytes go to a locked sibling temp file which is then renamed over the
/// target. Concurrent writers to one target are last-writer-wins. On failure
/// the temp file is removed and the target is left untouched.
pub fn write_atomic(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let target = path.as_ref();
    if let Some(dir) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }

    let temp = temp_sibling(target);
    let result = fill_temp(target, &temp, content)
        .and_then(|()| fs::rename(&temp, target).map_err(|e| Error::io(target, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

/// `.<name>.<pid>.tmp` next to `target`, so the rename stays on one filesystem.
fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn fill_temp(target: &Path, temp: &Path, content: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp)
        .map_err(|e| Error::io(temp, e))?;
    let locked = |_: std::io::Error| Error::LockFailed {
        path: target.to_path_buf(),
    };

    file.lock_exclusive().map_err(locked)?;
    file.write_all(content).map_err(|e| Error::io(temp, e))?;
    file.sync_all().map_err(|e| Error::io(temp, e))?;
    file.unlock().map_err(locked)
}

/// Read text content from a file.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let native_path = path.as_ref();
    fs::read_to_string(native_path).map_err(|e| Error::io(native_path, e))
}

/// Read text content, treating a missing file as `None`.
pub fn read_text_opt(path: impl AsRef<Path>) -> Result<Option<String>> {
    match read_text(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write text content to a file atomically.
pub fn write_text(path: impl AsRef<Path>, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Recursively delete a directory (if present) and recreate it empty.
pub fn recreate_dir(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(dir, e)),
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

/// Remove a file, returning whether anything was deleted.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let file = path.as_ref();
    match fs::remove_file(file) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(file, e)),
    }
}

/// Whether a directory exists and has at least one entry.
pub fn is_populated_dir(path: impl AsRef<Path>) -> bool {
    fs::read_dir(path.as_ref())
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
