use crate::domain::{ImageHistoryEntry, ImageRecord, LoadedArchives, archive_id_from_url};
use std::collections::BTreeSet;

/// Canonical record of what is currently displayed. Mutated only by the
/// session controller while the single-flight flag is held.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub current_images: Vec<ImageRecord>,
    pub current_index: usize,
    pub loaded_archives: LoadedArchives,
    pub current_archive_id: Option<String>,
    pub selected_history_items: BTreeSet<String>,
    pub history_items: Vec<ImageHistoryEntry>,
    pub is_archive_loading: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty/welcome state. The cached history snapshot survives a reset.
    pub fn reset_to_welcome(&mut self) {
        self.current_images.clear();
        self.current_index = 0;
        self.loaded_archives.clear();
        self.current_archive_id = None;
        self.selected_history_items.clear();
    }

    /// Replaces the whole session with a single archive.
    pub fn replace_with(
        &mut self,
        archive_id: &str,
        archive_name: &str,
        images: Vec<ImageRecord>,
    ) {
        self.current_images = stamp(images, archive_name, archive_id);
        self.current_index = 0;
        self.loaded_archives.clear();
        self.loaded_archives.push_back(archive_id);
        self.current_archive_id = Some(archive_id.to_string());
        self.selected_history_items.clear();
    }

    /// Appends an archive at the tail; the viewing position is untouched.
    pub fn append_archive(&mut self, archive_id: &str, archive_name: &str, images: Vec<ImageRecord>) {
        self.current_images
            .extend(stamp(images, archive_name, archive_id));
        self.loaded_archives.push_back(archive_id);
        if self.current_archive_id.is_none() {
            self.current_archive_id = Some(archive_id.to_string());
        }
    }

    /// Prepends an archive at the head, shifting the viewing position by the
    /// number of prepended images.
    pub fn prepend_archive(
        &mut self,
        archive_id: &str,
        archive_name: &str,
        images: Vec<ImageRecord>,
    ) {
        let stamped = stamp(images, archive_name, archive_id);
        let count = stamped.len();
        self.current_images.splice(0..0, stamped);
        self.current_index += count;
        self.loaded_archives.push_front(archive_id);
        if self.current_archive_id.is_none() {
            self.current_archive_id = Some(archive_id.to_string());
        }
    }

    /// Removes an archive and every image stamped with it. Returns `true`
    /// when the session became empty and was reset to the welcome state.
    pub fn remove_archive(&mut self, archive_id: &str) -> bool {
        self.loaded_archives.remove(archive_id);

        let removed_before_position = self
            .current_images
            .iter()
            .take(self.current_index)
            .filter(|image| image.original_archive_id.as_deref() == Some(archive_id))
            .count();
        self.current_images
            .retain(|image| image.original_archive_id.as_deref() != Some(archive_id));
        self.current_index = self.current_index.saturating_sub(removed_before_position);
        if !self.current_images.is_empty() && self.current_index >= self.current_images.len() {
            self.current_index = self.current_images.len() - 1;
        }

        if self.loaded_archives.is_empty() {
            self.reset_to_welcome();
            return true;
        }

        if self.current_archive_id.as_deref() == Some(archive_id) {
            // Deterministic reassignment: lowest-index remaining archive.
            self.current_archive_id = self.loaded_archives.first().map(str::to_string);
        }
        false
    }

    /// Rebuilds the history selection set from the loaded archives by mapping
    /// cached history entry urls through the archive id derivation.
    pub fn sync_selected_with_history(&mut self) {
        self.selected_history_items = self
            .history_items
            .iter()
            .filter(|entry| {
                self.loaded_archives
                    .contains(&archive_id_from_url(&entry.url))
            })
            .map(|entry| entry.id.clone())
            .collect();
    }

    pub fn invariant_holds(&self) -> bool {
        let images_empty = self.current_images.is_empty();
        let archives_empty = self.loaded_archives.is_empty();
        let primary_absent = self.current_archive_id.is_none();
        images_empty == archives_empty && archives_empty == primary_absent
    }

    /// A broken empty-iff invariant means a partially-populated display;
    /// fall back to the welcome state instead of showing it.
    pub fn repair_invariant(&mut self) {
        if !self.invariant_holds() {
            log::warn!(
                "session invariant violated (images: {}, archives: {}, primary: {:?}), resetting",
                self.current_images.len(),
                self.loaded_archives.len(),
                self.current_archive_id
            );
            self.reset_to_welcome();
        }
    }
}

fn stamp(mut images: Vec<ImageRecord>, archive_name: &str, archive_id: &str) -> Vec<ImageRecord> {
    for image in &mut images {
        image.stamp_provenance(archive_name, archive_id);
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn images(count: usize) -> Vec<ImageRecord> {
        (0..count)
            .map(|index| {
                ImageRecord::new(
                    format!("p{index}.png"),
                    format!("p{index}.png"),
                    Arc::from(vec![0u8]),
                    100,
                    150,
                )
            })
            .collect()
    }

    fn history_entry(id: &str, url: &str) -> ImageHistoryEntry {
        ImageHistoryEntry {
            id: id.to_string(),
            name: format!("{id}.zip"),
            url: url.to_string(),
            image_count: 1,
            last_accessed: "2026-08-01T00:00:00Z".to_string(),
            starred: false,
        }
    }

    #[test]
    fn replace_stamps_provenance_on_every_image() {
        let mut session = SessionState::new();
        session.replace_with("arc-1", "Book.zip", images(3));

        assert_eq!(session.current_images.len(), 3);
        assert!(
            session
                .current_images
                .iter()
                .all(|image| image.original_archive_id.as_deref() == Some("arc-1")
                    && image.archive_name.as_deref() == Some("Book.zip"))
        );
        assert_eq!(session.current_archive_id.as_deref(), Some("arc-1"));
        assert!(session.loaded_archives.contains("arc-1"));
    }

    #[test]
    fn append_leaves_current_index_untouched() {
        let mut session = SessionState::new();
        session.replace_with("arc-1", "One.zip", images(4));
        session.current_index = 2;

        session.append_archive("arc-2", "Two.zip", images(3));

        assert_eq!(session.current_images.len(), 7);
        assert_eq!(session.current_index, 2);
        assert_eq!(session.loaded_archives.last(), Some("arc-2"));
    }

    #[test]
    fn prepend_shifts_current_index_by_prepended_count() {
        let mut session = SessionState::new();
        session.replace_with("arc-2", "Two.zip", images(4));
        session.current_index = 1;

        session.prepend_archive("arc-1", "One.zip", images(5));

        assert_eq!(session.current_images.len(), 9);
        assert_eq!(session.current_index, 6);
        assert_eq!(session.loaded_archives.first(), Some("arc-1"));
        assert_eq!(
            session.current_images[0].original_archive_id.as_deref(),
            Some("arc-1")
        );
    }

    #[test]
    fn removing_last_archive_resets_to_welcome() {
        let mut session = SessionState::new();
        session.replace_with("arc-1", "One.zip", images(2));

        let emptied = session.remove_archive("arc-1");

        assert!(emptied);
        assert!(session.current_images.is_empty());
        assert!(session.loaded_archives.is_empty());
        assert_eq!(session.current_archive_id, None);
        assert!(session.invariant_holds());
    }

    #[test]
    fn removing_primary_reassigns_to_lowest_index_remaining() {
        let mut session = SessionState::new();
        session.replace_with("arc-1", "One.zip", images(2));
        session.append_archive("arc-2", "Two.zip", images(2));
        session.append_archive("arc-3", "Three.zip", images(2));
        session.current_archive_id = Some("arc-2".to_string());

        let emptied = session.remove_archive("arc-2");

        assert!(!emptied);
        assert_eq!(session.current_archive_id.as_deref(), Some("arc-1"));
        assert_eq!(session.current_images.len(), 4);
        assert!(
            session
                .current_images
                .iter()
                .all(|image| image.original_archive_id.as_deref() != Some("arc-2"))
        );
    }

    #[test]
    fn removing_archive_before_position_shifts_index_back() {
        let mut session = SessionState::new();
        session.replace_with("arc-1", "One.zip", images(3));
        session.append_archive("arc-2", "Two.zip", images(3));
        session.current_index = 4;

        session.remove_archive("arc-1");

        assert_eq!(session.current_index, 1);
        assert_eq!(session.current_images.len(), 3);
    }

    #[test]
    fn selection_follows_loaded_archives() {
        let mut session = SessionState::new();
        session.history_items = vec![
            history_entry("h1", "https://host/one.zip"),
            history_entry("h2", "https://host/two.zip"),
        ];
        session.replace_with(&archive_id_from_url("https://host/two.zip"), "two.zip", images(1));

        session.sync_selected_with_history();

        assert_eq!(
            session.selected_history_items.iter().collect::<Vec<_>>(),
            vec!["h2"]
        );
    }

    #[test]
    fn repair_resets_partially_populated_state() {
        let mut session = SessionState::new();
        session.current_images = images(2);
        // No loaded archive ids and no primary: invariant is broken.
        session.repair_invariant();

        assert!(session.current_images.is_empty());
        assert!(session.invariant_holds());
    }
}
