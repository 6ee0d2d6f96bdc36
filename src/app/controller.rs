use crate::app::gateways::{
    GatewayError, HistoryRefresh, HistoryStore, HistoryView, LibraryGateway, StatusNotifier,
    TransferChoice, TransferPrompt,
};
use crate::app::progress::ProgressSubscription;
use crate::app::session::SessionState;
use crate::domain::{
    AdjacentDirection, ArchiveLoad, ImageHistoryEntry, LocalLoadOptions, NewHistoryEntry,
    ViewerSettings, archive_id_from_url, collection_title, display_filename_from_url,
    is_archive_filename, library_usage_summary, local_library_path,
};
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no archive URL was provided")]
    EmptyUrl,

    #[error("`{0}` is not a supported archive type")]
    NotAnArchive(String),

    #[error("the archive contains no images")]
    NoImagesFound,

    #[error("move/copy choice was not resolved before loading")]
    UnexpectedUserChoice,

    #[error("failed to read archive file: {0}")]
    ReadArchive(#[from] io::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Outcome of a mutating session operation that did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    /// Another load was in flight; the request was dropped, not queued.
    Busy,
    /// The user dismissed the move-vs-copy dialog.
    Cancelled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadUrlOptions {
    pub update_history: bool,
    pub show_loading_overlay: bool,
}

impl Default for LoadUrlOptions {
    fn default() -> Self {
        Self {
            update_history: true,
            show_loading_overlay: true,
        }
    }
}

/// Orchestrates archive loads, merges results into the session, and drives
/// adjacent-archive navigation along the persisted history order. All
/// mutation happens here, serialized by the single-flight flag.
pub struct SessionController {
    session: SessionState,
    settings: ViewerSettings,
    library: Rc<dyn LibraryGateway>,
    history: Rc<dyn HistoryStore>,
    history_view: Rc<dyn HistoryView>,
    prompt: Rc<dyn TransferPrompt>,
    status: Rc<dyn StatusNotifier>,
}

impl SessionController {
    pub fn new(
        settings: ViewerSettings,
        library: Rc<dyn LibraryGateway>,
        history: Rc<dyn HistoryStore>,
        history_view: Rc<dyn HistoryView>,
        prompt: Rc<dyn TransferPrompt>,
        status: Rc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            session: SessionState::new(),
            settings,
            library,
            history,
            history_view,
            prompt,
            status,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ViewerSettings) {
        self.settings = settings;
    }

    pub fn set_current_index(&mut self, index: usize) {
        if index < self.session.current_images.len() {
            self.session.current_index = index;
        }
    }

    pub fn load_by_url(&mut self, url: &str, opts: LoadUrlOptions) -> Result<LoadOutcome, LoadError> {
        if !self.begin_load() {
            return Ok(LoadOutcome::Busy);
        }
        let result = self.load_by_url_locked(url, opts);
        self.finish_load();
        self.report_failure(&result);
        result
    }

    pub fn load_local_archive(&mut self, path: &Path) -> Result<LoadOutcome, LoadError> {
        if !self.begin_load() {
            return Ok(LoadOutcome::Busy);
        }
        let result = self.load_local_archive_locked(path);
        self.finish_load();
        self.report_failure(&result);
        result
    }

    /// Merges one more archive into the current collection, or replaces the
    /// session when it is empty. Used for history-item activation.
    pub fn add_archive_to_collection(
        &mut self,
        entry: &ImageHistoryEntry,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.begin_load() {
            return Ok(LoadOutcome::Busy);
        }
        let result = self.add_archive_locked(entry);
        self.finish_load();
        self.report_failure(&result);
        result
    }

    /// Replaces the session with a single archive from history, without
    /// appending a duplicate history record.
    pub fn load_from_history(
        &mut self,
        entry: &ImageHistoryEntry,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.begin_load() {
            return Ok(LoadOutcome::Busy);
        }
        let result = self.load_from_history_locked(entry);
        self.finish_load();
        self.report_failure(&result);
        result
    }

    /// Drops an archive and its images from the collection. Returns `false`
    /// when the id is not loaded or a load is in flight.
    pub fn unload_archive(&mut self, archive_id: &str) -> bool {
        if self.session.is_archive_loading {
            log::debug!("archive load in flight, dropping unload of {archive_id}");
            return false;
        }
        if !self.session.loaded_archives.contains(archive_id) {
            return false;
        }

        self.session.remove_archive(archive_id);
        self.after_structural_change(HistoryRefresh::default());
        true
    }

    /// Pure adjacency query: the history neighbor of the session's edge
    /// archive in the given direction, or `None` at the ends of history, for
    /// ids absent from history, and for candidates already loaded.
    pub fn find_adjacent_archive(
        &self,
        direction: AdjacentDirection,
    ) -> Option<ImageHistoryEntry> {
        let fresh;
        let items: &[ImageHistoryEntry] = if self.session.history_items.is_empty() {
            fresh = self.history.load_all().ok()?;
            &fresh
        } else {
            &self.session.history_items
        };

        let loaded = &self.session.loaded_archives;
        let edge_id = match direction {
            AdjacentDirection::Forward => loaded.last()?,
            AdjacentDirection::Backward => loaded.first()?,
        };

        let position = items
            .iter()
            .position(|entry| archive_id_from_url(&entry.url) == edge_id)?;
        let candidate_index = position.checked_add_signed(direction.delta())?;
        let candidate = items.get(candidate_index)?;

        if loaded.len() > 1 && loaded.contains(&archive_id_from_url(&candidate.url)) {
            return None;
        }
        Some(candidate.clone())
    }

    /// Background look-ahead/look-behind load. Failures never surface as
    /// errors; they are reported as status text and collapse to `false`.
    pub fn load_adjacent_archive(&mut self, direction: AdjacentDirection) -> bool {
        if !self.settings.auto_load_adjacent_archives {
            return false;
        }
        if !self.begin_load() {
            return false;
        }
        let result = self.load_adjacent_locked(direction);
        self.finish_load();

        match result {
            Ok(loaded) => loaded,
            Err(error) => {
                log::debug!("{} adjacent load failed: {error}", direction.label());
                self.status
                    .status(&format!("Failed to load adjacent archive: {error}"));
                false
            }
        }
    }

    fn load_by_url_locked(
        &mut self,
        url: &str,
        opts: LoadUrlOptions,
    ) -> Result<LoadOutcome, LoadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LoadError::EmptyUrl);
        }
        let display_name = display_filename_from_url(url);
        if !is_archive_filename(&display_name) {
            return Err(LoadError::NotAnArchive(display_name));
        }

        if opts.show_loading_overlay {
            self.status.show_loading(true);
        }
        let loaded = self.fetch_by_url(url);
        if opts.show_loading_overlay {
            self.status.show_loading(false);
        }
        let loaded = loaded?;
        if loaded.images.is_empty() {
            return Err(LoadError::NoImagesFound);
        }

        let image_count = loaded.images.len();
        self.session
            .replace_with(&loaded.archive_id, &display_name, loaded.images);
        if opts.update_history {
            self.append_history(&display_name, url, image_count);
        }
        self.after_structural_change(HistoryRefresh {
            highlight_url: Some(url.to_string()),
            select_id: None,
        });
        Ok(LoadOutcome::Loaded)
    }

    fn load_local_archive_locked(&mut self, path: &Path) -> Result<LoadOutcome, LoadError> {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Archive".to_string());

        let Some(choice) = self.prompt.choose(&display_name) else {
            log::debug!("load of {display_name} cancelled by user");
            return Ok(LoadOutcome::Cancelled);
        };

        let bytes = fs::read(path)?;
        let opts = LocalLoadOptions {
            copy_to_library: choice == TransferChoice::CopyToLibrary,
            archive_id: None,
        };
        let loaded = self
            .library
            .load_local(path, &bytes, self.settings.library_size_gb, opts)?;

        if loaded.needs_user_choice {
            return Err(LoadError::UnexpectedUserChoice);
        }
        if loaded.images.is_empty() {
            return Err(LoadError::NoImagesFound);
        }

        let history_url = match &loaded.library_archive_path {
            Some(library_path) => format!("file://{}", library_path.display()),
            None => format!("archive://{}", loaded.archive_id),
        };
        let image_count = loaded.images.len();
        self.session
            .replace_with(&loaded.archive_id, &display_name, loaded.images);
        self.append_history(&display_name, &history_url, image_count);
        self.after_structural_change(HistoryRefresh {
            highlight_url: Some(history_url),
            select_id: None,
        });
        Ok(LoadOutcome::Loaded)
    }

    fn add_archive_locked(&mut self, entry: &ImageHistoryEntry) -> Result<LoadOutcome, LoadError> {
        let loaded = self.fetch_history_entry(entry)?;
        if loaded.images.is_empty() {
            return Err(LoadError::NoImagesFound);
        }

        if self.session.current_images.is_empty() {
            self.session
                .replace_with(&loaded.archive_id, &entry.name, loaded.images);
        } else {
            self.session
                .append_archive(&loaded.archive_id, &entry.name, loaded.images);
        }
        self.after_structural_change(HistoryRefresh {
            highlight_url: Some(entry.url.clone()),
            select_id: Some(entry.id.clone()),
        });
        Ok(LoadOutcome::Loaded)
    }

    fn load_from_history_locked(
        &mut self,
        entry: &ImageHistoryEntry,
    ) -> Result<LoadOutcome, LoadError> {
        let loaded = self.fetch_history_entry(entry)?;
        if loaded.images.is_empty() {
            return Err(LoadError::NoImagesFound);
        }

        self.session
            .replace_with(&loaded.archive_id, &entry.name, loaded.images);
        self.after_structural_change(HistoryRefresh {
            highlight_url: Some(entry.url.clone()),
            select_id: Some(entry.id.clone()),
        });
        Ok(LoadOutcome::Loaded)
    }

    fn load_adjacent_locked(&mut self, direction: AdjacentDirection) -> Result<bool, LoadError> {
        let Some(entry) = self.find_adjacent_archive(direction) else {
            return Ok(false);
        };

        let loaded = self.fetch_history_entry(&entry)?;
        if loaded.images.is_empty() {
            return Err(LoadError::NoImagesFound);
        }

        let archive_id = loaded.archive_id.clone();
        match direction {
            AdjacentDirection::Forward => {
                self.session
                    .append_archive(&archive_id, &entry.name, loaded.images);
            }
            AdjacentDirection::Backward => {
                self.session
                    .prepend_archive(&archive_id, &entry.name, loaded.images);
            }
        }
        self.session.current_archive_id = Some(archive_id);
        self.after_structural_change(HistoryRefresh {
            highlight_url: Some(entry.url.clone()),
            select_id: Some(entry.id.clone()),
        });
        Ok(true)
    }

    fn fetch_by_url(&self, url: &str) -> Result<ArchiveLoad, LoadError> {
        let progress = ProgressSubscription::register(Rc::clone(&self.status));
        let loaded = self
            .library
            .load_by_url(url, self.settings.library_size_gb, &progress)?;
        Ok(loaded)
    }

    /// Loads a history entry from the local library when its url is
    /// `file://…`, otherwise through the url path.
    fn fetch_history_entry(&self, entry: &ImageHistoryEntry) -> Result<ArchiveLoad, LoadError> {
        let Some(path) = local_library_path(&entry.url) else {
            return self.fetch_by_url(&entry.url);
        };

        let bytes = fs::read(&path)?;
        let opts = LocalLoadOptions {
            copy_to_library: false,
            archive_id: Some(archive_id_from_url(&entry.url)),
        };
        let loaded = self
            .library
            .load_local(&path, &bytes, self.settings.library_size_gb, opts)?;
        Ok(ArchiveLoad {
            archive_id: loaded.archive_id,
            images: loaded.images,
        })
    }

    /// Post-mutation bookkeeping: refresh the cached history snapshot, the
    /// selection set, the collection title, the library usage display, and
    /// the history presentation. Runs synchronously at the end of every
    /// mutating operation.
    fn after_structural_change(&mut self, refresh: HistoryRefresh) {
        match self.history.load_all() {
            Ok(items) => self.session.history_items = items,
            Err(error) => log::warn!("failed to refresh history snapshot: {error}"),
        }
        self.session.sync_selected_with_history();
        self.session.repair_invariant();

        self.status
            .collection_title(&collection_title(&self.session.current_images));
        self.push_library_usage();
        self.history_view.refresh(refresh);
    }

    fn append_history(&self, name: &str, url: &str, image_count: usize) {
        let entry = NewHistoryEntry {
            name: name.to_string(),
            url: url.to_string(),
            image_count,
            last_accessed: now_rfc3339(),
        };
        if let Err(error) = self.history.append(entry) {
            log::warn!("failed to append history entry for {url}: {error}");
        }
    }

    fn push_library_usage(&self) {
        match self.library.usage_stats() {
            Ok(stats) => {
                let summary = library_usage_summary(
                    stats.total_archive_bytes,
                    self.settings.library_size_gb,
                    stats.starred_count,
                );
                self.status.library_usage(&summary);
            }
            Err(error) => log::debug!("library usage stats unavailable: {error}"),
        }
    }

    fn begin_load(&mut self) -> bool {
        if self.session.is_archive_loading {
            log::debug!("archive load already in flight, dropping request");
            return false;
        }
        self.session.is_archive_loading = true;
        true
    }

    fn finish_load(&mut self) {
        self.session.is_archive_loading = false;
    }

    fn report_failure<T>(&self, result: &Result<T, LoadError>) {
        if let Err(error) = result {
            self.status.status(&format!("Failed to load archive: {error}"));
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
