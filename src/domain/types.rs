use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdjacentDirection {
    Forward,
    Backward,
}

impl AdjacentDirection {
    pub fn delta(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// One decoded image inside the viewing collection. Immutable after
/// construction except for the two provenance fields, which are stamped
/// exactly once when the image is merged into a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub display_name: String,
    pub source: String,
    pub payload: Option<Arc<[u8]>>,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub archive_name: Option<String>,
    pub original_archive_id: Option<String>,
    pub failed: bool,
}

impl ImageRecord {
    pub fn new(
        display_name: impl Into<String>,
        source: impl Into<String>,
        payload: Arc<[u8]>,
        width: u32,
        height: u32,
    ) -> Self {
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            f64::from(width) / f64::from(height)
        };
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            source: source.into(),
            payload: Some(payload),
            width,
            height,
            aspect_ratio,
            archive_name: None,
            original_archive_id: None,
            failed: false,
        }
    }

    /// Placeholder record for a file that could not be decoded.
    pub fn failed_decode(display_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            source: source.into(),
            payload: None,
            width: 0,
            height: 0,
            aspect_ratio: 0.0,
            archive_name: None,
            original_archive_id: None,
            failed: true,
        }
    }

    pub fn stamp_provenance(&mut self, archive_name: &str, archive_id: &str) {
        self.archive_name = Some(archive_name.to_string());
        self.original_archive_id = Some(archive_id.to_string());
    }
}

/// Insertion-ordered set of archive ids. Order is session display order:
/// explicit and forward-adjacent loads land at the tail, backward-adjacent
/// loads at the head, so `first` is the backward edge and `last` the forward
/// edge of the session.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadedArchives {
    order: Vec<String>,
}

impl LoadedArchives {
    pub fn contains(&self, archive_id: &str) -> bool {
        self.order.iter().any(|id| id == archive_id)
    }

    pub fn push_back(&mut self, archive_id: &str) {
        if !self.contains(archive_id) {
            self.order.push(archive_id.to_string());
        }
    }

    pub fn push_front(&mut self, archive_id: &str) {
        if !self.contains(archive_id) {
            self.order.insert(0, archive_id.to_string());
        }
    }

    pub fn remove(&mut self, archive_id: &str) {
        self.order.retain(|id| id != archive_id);
    }

    pub fn first(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.order.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Persisted history record, read-only to the session core. The order the
/// store returns these in is the adjacency axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageHistoryEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    pub image_count: usize,
    pub last_accessed: String,
    #[serde(default)]
    pub starred: bool,
}

/// Payload for a history append; the store assigns the id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewHistoryEntry {
    pub name: String,
    pub url: String,
    pub image_count: usize,
    pub last_accessed: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveLoad {
    pub archive_id: String,
    pub images: Vec<ImageRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalArchiveLoad {
    pub archive_id: String,
    pub images: Vec<ImageRecord>,
    pub was_copied: bool,
    pub already_in_library: bool,
    pub needs_user_choice: bool,
    pub library_archive_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalLoadOptions {
    pub copy_to_library: bool,
    pub archive_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UsageStats {
    pub total_archive_bytes: u64,
    pub starred_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    pub library_size_gb: f64,
    pub auto_load_adjacent_archives: bool,
    pub max_history_items: usize,
    pub auto_load_from_clipboard: bool,
    pub upscale_small_images: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            library_size_gb: 10.0,
            auto_load_adjacent_archives: true,
            max_history_items: 100,
            auto_load_from_clipboard: false,
            upscale_small_images: false,
        }
    }
}
