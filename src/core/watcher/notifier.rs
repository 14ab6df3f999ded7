//! Where batch reports go once a drain completes.

use crate::core::organize::BatchReport;
use crate::error::WatchError;

/// Receives the report of every completed drain
///
/// Delivery failures are logged by the watcher and never stop it.
pub trait Notifier: Send {
    fn deliver(&self, report: &BatchReport) -> Result<(), WatchError>;
}

/// Writes reports to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, report: &BatchReport) -> Result<(), WatchError> {
        if report.failed.is_empty() {
            tracing::info!("{}\n\n{}", report.subject(), report.body());
        } else {
            tracing::warn!("{}\n\n{}", report.subject(), report.body());
        }
        Ok(())
    }
}

impl<F> Notifier for F
where
    F: Fn(&BatchReport) -> Result<(), WatchError> + Send,
{
    fn deliver(&self, report: &BatchReport) -> Result<(), WatchError> {
        self(report)
    }
}
