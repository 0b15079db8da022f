//! Event system for the two-phase webhook flow.
//!
//! # Event Flow
//!
//! 1. The pipeline acknowledges an actionable delivery and emits a `TagJob`
//! 2. `TagWorker` receives the `TagJob` and performs the remote tag merge
//! 3. `TagWorker` publishes a `TagOutcomeReport` for every job it finishes
//!    or abandons
//!
//! In `sync` mode the pipeline performs step 2 itself and still publishes
//! the report, so every remote outcome reaches the same channel.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, OutcomeReportReceiver, OutcomeReportSender, TagJobReceiver,
    TagJobSender, outcome_report_channel, tag_job_channel,
};

pub use types::{TagJob, TagOutcomeReport};
