//! Background processors.
//!
//! - `TagWorker`: Receives `TagJob`, runs the tag merge, emits `TagOutcomeReport`

pub mod tag_worker;

pub use tag_worker::TagWorker;
