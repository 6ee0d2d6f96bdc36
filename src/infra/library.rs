use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };
    Ok(home.join(".arcview"))
}

/// Per-archive directories live directly under this; the directory name is
/// the archive id.
pub fn library_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("library")
}

/// Total bytes held by extracted archives. A library that does not exist yet
/// counts as empty.
pub fn scan_library_usage(library_dir: &Path) -> u64 {
    if !library_dir.exists() {
        return 0;
    }
    WalkDir::new(library_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
