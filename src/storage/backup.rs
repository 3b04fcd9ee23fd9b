use crate::storage::traits::StorageResult;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Copies an existing `path` to `<name>.<timestamp>.bak` next to it
///
/// # Returns
///
/// * `Ok(Some(path))` - The backup that was written
/// * `Ok(None)` - Nothing existed at `path`
/// * `Err(StorageError)` - The copy failed; the original is untouched
pub fn backup_existing(path: &Path) -> StorageResult<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }

    let backup_path = backup_path_for(path);
    fs::copy(path, &backup_path)?;
    tracing::debug!(
        original = %path.display(),
        backup = %backup_path.display(),
        "Backed up existing destination"
    );
    Ok(Some(backup_path))
}

/// Picks an unused backup file name for `path`
fn backup_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");

    let mut candidate = path.with_file_name(format!("{}.{}.bak", name, stamp));
    let mut counter = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.{}-{}.bak", name, stamp, counter));
        counter += 1;
    }
    candidate
}

/// Replaces `path` with whatever `write` produces, never leaving it half-written
///
/// Content goes to a temporary file in the same directory, which is then
/// renamed over `path`.
pub fn write_atomically<F>(path: &Path, write: F) -> StorageResult<()>
where
    F: FnOnce(&mut dyn Write) -> StorageResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    write(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.persist(path)?;
    Ok(())
}
