//! Event channel factories and handles.

use super::types::{TagJob, TagOutcomeReport};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
///
/// Bounds the number of accepted-but-unfinished tag jobs.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for TagJob events.
pub type TagJobSender = mpsc::Sender<TagJob>;
/// Receiver handle for TagJob events.
pub type TagJobReceiver = mpsc::Receiver<TagJob>;

/// Sender handle for outcome reports. Sending with no subscriber is fine.
pub type OutcomeReportSender = broadcast::Sender<TagOutcomeReport>;
/// Receiver handle for outcome reports.
pub type OutcomeReportReceiver = broadcast::Receiver<TagOutcomeReport>;

/// Create a new TagJob channel.
pub fn tag_job_channel() -> (TagJobSender, TagJobReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new outcome report channel.
///
/// Subscribe further receivers with [`broadcast::Sender::subscribe`].
/// Slow subscribers lose the oldest reports rather than blocking the worker.
pub fn outcome_report_channel() -> (OutcomeReportSender, OutcomeReportReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}
