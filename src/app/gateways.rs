use crate::app::progress::ProgressSubscription;
use crate::domain::{
    ArchiveLoad, ImageHistoryEntry, LocalArchiveLoad, LocalLoadOptions, NewHistoryEntry,
    UsageStats,
};
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("download failed: {0}")]
    Download(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("library error: {0}")]
    Library(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history: {0}")]
    Read(String),

    #[error("failed to write history: {0}")]
    Write(String),
}

/// Archive loading and on-disk library access. The gateway owns archive
/// identity assignment and capacity enforcement; archive ids are opaque
/// stable strings to the session core.
pub trait LibraryGateway {
    /// Downloads the archive if it is not library-resident and extracts its
    /// images. Progress is delivered through the caller's subscription.
    fn load_by_url(
        &self,
        url: &str,
        capacity_gb: f64,
        progress: &ProgressSubscription,
    ) -> Result<ArchiveLoad, GatewayError>;

    fn load_local(
        &self,
        path: &Path,
        bytes: &[u8],
        capacity_gb: f64,
        opts: LocalLoadOptions,
    ) -> Result<LocalArchiveLoad, GatewayError>;

    fn usage_stats(&self) -> Result<UsageStats, GatewayError>;
}

/// Persisted access history. The session core only appends and reads; it
/// never reorders or deletes entries.
pub trait HistoryStore {
    fn append(&self, entry: NewHistoryEntry) -> Result<(), HistoryError>;

    fn load_all(&self) -> Result<Vec<ImageHistoryEntry>, HistoryError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryRefresh {
    pub highlight_url: Option<String>,
    pub select_id: Option<String>,
}

/// History presentation surface, told to re-render after structural changes.
pub trait HistoryView {
    fn refresh(&self, request: HistoryRefresh);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferChoice {
    MoveToLibrary,
    CopyToLibrary,
}

/// Move-vs-copy dialog for dropped or picked archive files. `None` means the
/// user cancelled.
pub trait TransferPrompt {
    fn choose(&self, archive_name: &str) -> Option<TransferChoice>;
}

/// Progress and status surface. Consumed, never owned, by the controller.
pub trait StatusNotifier {
    fn status(&self, message: &str);

    fn show_loading(&self, visible: bool);

    fn download_started(&self);

    fn download_progress(&self, percent: u8, received_bytes: u64, total_bytes: Option<u64>);

    fn download_finished(&self);

    fn library_usage(&self, summary: &str);

    fn collection_title(&self, title: &str);
}
