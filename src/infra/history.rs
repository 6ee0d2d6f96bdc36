use crate::app::{HistoryError, HistoryStore};
use crate::domain::{ImageHistoryEntry, NewHistoryEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LoadHistoryError {
    #[error("failed to read history: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse history: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SaveHistoryError {
    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write history: {0}")]
    Write(#[from] io::Error),
}

/// JSON-file history store. Entries are kept most-recent-first; that order is
/// the adjacency axis the session controller navigates along.
pub struct JsonHistoryStore {
    path: PathBuf,
    max_items: usize,
}

impl JsonHistoryStore {
    pub fn new(state_dir: &Path, max_items: usize) -> Self {
        Self {
            path: state_dir.join("history.json"),
            max_items,
        }
    }

    pub fn set_starred(&self, entry_id: &str, starred: bool) -> Result<(), HistoryError> {
        let mut entries = self.load().map_err(read_error)?;
        if let Some(entry) = entries.iter_mut().find(|entry| entry.id == entry_id) {
            entry.starred = starred;
            self.save(&entries).map_err(write_error)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<ImageHistoryEntry>, LoadHistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };

        let file: HistoryFile = serde_json::from_str(&raw)?;
        Ok(file.entries)
    }

    fn save(&self, entries: &[ImageHistoryEntry]) -> Result<(), SaveHistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let file = HistoryFile {
            version: 1,
            entries: entries.to_vec(),
        };
        let text = serde_json::to_string_pretty(&file)?;
        fs::write(&tmp, text)?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, entry: NewHistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load().map_err(read_error)?;

        // A re-opened archive bumps its existing record to the front instead
        // of duplicating it; id and starred flag survive the bump.
        let record = match entries.iter().position(|prior| prior.url == entry.url) {
            Some(index) => {
                let mut prior = entries.remove(index);
                prior.name = entry.name;
                prior.image_count = entry.image_count;
                prior.last_accessed = entry.last_accessed;
                prior
            }
            None => ImageHistoryEntry {
                id: Uuid::new_v4().to_string(),
                name: entry.name,
                url: entry.url,
                image_count: entry.image_count,
                last_accessed: entry.last_accessed,
                starred: false,
            },
        };
        entries.insert(0, record);
        trim_history(&mut entries, self.max_items);

        self.save(&entries).map_err(write_error)
    }

    fn load_all(&self) -> Result<Vec<ImageHistoryEntry>, HistoryError> {
        self.load().map_err(read_error)
    }
}

/// Drops the oldest unstarred entries until the list fits. Starred entries
/// are never evicted, even over the limit.
fn trim_history(entries: &mut Vec<ImageHistoryEntry>, max_items: usize) {
    while entries.len() > max_items {
        let Some(index) = entries.iter().rposition(|entry| !entry.starred) else {
            break;
        };
        entries.remove(index);
    }
}

fn read_error(error: LoadHistoryError) -> HistoryError {
    HistoryError::Read(error.to_string())
}

fn write_error(error: SaveHistoryError) -> HistoryError {
    HistoryError::Write(error.to_string())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    entries: Vec<ImageHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(url: &str, accessed: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            name: url.rsplit('/').next().unwrap_or(url).to_string(),
            url: url.to_string(),
            image_count: 5,
            last_accessed: accessed.to_string(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty_history() {
        let dir = tempdir().expect("tempdir");
        let store = JsonHistoryStore::new(dir.path(), 10);
        assert!(store.load_all().expect("load").is_empty());
    }

    #[test]
    fn appends_are_returned_most_recent_first() {
        let dir = tempdir().expect("tempdir");
        let store = JsonHistoryStore::new(dir.path(), 10);

        store
            .append(entry("https://host/a.zip", "2026-08-01T00:00:00Z"))
            .expect("append a");
        store
            .append(entry("https://host/b.zip", "2026-08-02T00:00:00Z"))
            .expect("append b");

        let entries = store.load_all().expect("load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://host/b.zip");
        assert_eq!(entries[1].url, "https://host/a.zip");
        assert!(!entries[0].id.is_empty());
    }

    #[test]
    fn reopening_a_url_bumps_instead_of_duplicating() {
        let dir = tempdir().expect("tempdir");
        let store = JsonHistoryStore::new(dir.path(), 10);

        store
            .append(entry("https://host/a.zip", "2026-08-01T00:00:00Z"))
            .expect("append a");
        store
            .append(entry("https://host/b.zip", "2026-08-02T00:00:00Z"))
            .expect("append b");
        let original_id = store.load_all().expect("load")[1].id.clone();

        store
            .append(entry("https://host/a.zip", "2026-08-03T00:00:00Z"))
            .expect("bump a");

        let entries = store.load_all().expect("load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://host/a.zip");
        assert_eq!(entries[0].id, original_id);
        assert_eq!(entries[0].last_accessed, "2026-08-03T00:00:00Z");
    }

    #[test]
    fn trims_oldest_unstarred_entries_over_the_limit() {
        let dir = tempdir().expect("tempdir");
        let store = JsonHistoryStore::new(dir.path(), 2);

        store
            .append(entry("https://host/a.zip", "2026-08-01T00:00:00Z"))
            .expect("append a");
        let a_id = store.load_all().expect("load")[0].id.clone();
        store.set_starred(&a_id, true).expect("star a");

        store
            .append(entry("https://host/b.zip", "2026-08-02T00:00:00Z"))
            .expect("append b");
        store
            .append(entry("https://host/c.zip", "2026-08-03T00:00:00Z"))
            .expect("append c");

        let entries = store.load_all().expect("load");
        assert_eq!(entries.len(), 2);
        // b was the oldest unstarred entry; starred a survives.
        assert!(entries.iter().any(|e| e.url == "https://host/a.zip"));
        assert!(entries.iter().any(|e| e.url == "https://host/c.zip"));
    }

    #[test]
    fn set_starred_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = JsonHistoryStore::new(dir.path(), 10);

        store
            .append(entry("https://host/a.zip", "2026-08-01T00:00:00Z"))
            .expect("append");
        let id = store.load_all().expect("load")[0].id.clone();

        store.set_starred(&id, true).expect("star");
        assert!(store.load_all().expect("load")[0].starred);

        store.set_starred(&id, false).expect("unstar");
        assert!(!store.load_all().expect("load")[0].starred);
    }
}
