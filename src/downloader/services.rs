//! Background service starters.

use super::{CleanupScheduler, MediaDownloader};

impl MediaDownloader {
    /// Start the periodic cleanup sweep
    ///
    /// The sweeper stops when [`shutdown`](MediaDownloader::shutdown) is called.
    pub fn start_cleanup_scheduler(&self) -> tokio::task::JoinHandle<()> {
        let scheduler = CleanupScheduler::new(self.clone(), self.shutdown.clone());
        let handle = tokio::spawn(scheduler.run());

        tracing::info!("Cleanup scheduler background task started");

        handle
    }
}
