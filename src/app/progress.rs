use crate::app::gateways::StatusNotifier;
use std::rc::Rc;

/// Registration handle for download progress delivery. Created before the
/// gateway call that may download and dropped when that call returns, so the
/// progress surface is deregistered on every exit path, including `?` exits.
pub struct ProgressSubscription {
    status: Rc<dyn StatusNotifier>,
}

impl ProgressSubscription {
    pub fn register(status: Rc<dyn StatusNotifier>) -> Self {
        status.download_started();
        Self { status }
    }

    pub fn report(&self, percent: u8, received_bytes: u64, total_bytes: Option<u64>) {
        self.status
            .download_progress(percent, received_bytes, total_bytes);
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.status.download_finished();
    }
}
