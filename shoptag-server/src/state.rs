//! Application state shared across all request handlers.

use shoptag_core::pipeline::WebhookPipeline;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// Cheap to clone; the pipeline is immutable once built and shared
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WebhookPipeline>,
}

impl AppState {
    pub fn new(pipeline: WebhookPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
