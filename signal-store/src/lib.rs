//! File-backed persistence for the digest pipeline: the rolling seen-id
//! window, the human-readable run-history file and per-stage JSON snapshots.

pub mod artifacts;
pub mod memory;
pub mod seen_ids;

pub use artifacts::ArtifactWriter;
pub use memory::{MemoryFile, ProjectInfo};
pub use seen_ids::SeenIdStore;

use signal_core::{CoreError, StorageError};
use std::fs;
use std::path::Path;

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), CoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StorageError::DirectoryUnavailable {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes through a sibling temp file and renames it over `path`, so a crash
/// never leaves a half-written file behind.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let write_failed = |e: std::io::Error| StorageError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, contents).map_err(write_failed)?;
    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(write_failed(e).into());
    }
    Ok(())
}
