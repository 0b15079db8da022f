//! Event type definitions.

use crate::tagging::{ApplyTag, RemoteUpdateOutcome};
use shoptag_sdk::objects::{ResourceId, TagSet};

/// A tag merge accepted by the pipeline, waiting to be run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagJob {
    /// `X-Shopify-Webhook-Id` of the triggering delivery, for log correlation.
    pub webhook_id: Option<String>,
    pub resource_id: ResourceId,
    pub tag: String,
    pub current_tags: Option<TagSet>,
}

impl From<TagJob> for ApplyTag {
    fn from(job: TagJob) -> Self {
        ApplyTag {
            resource_id: job.resource_id,
            tag: job.tag,
            current_tags: job.current_tags,
        }
    }
}

/// Completion (or failure, or abandonment) of one tag merge.
#[derive(Debug, Clone)]
pub struct TagOutcomeReport {
    pub webhook_id: Option<String>,
    pub outcome: RemoteUpdateOutcome,
    pub finished_at: time::OffsetDateTime,
}

impl TagOutcomeReport {
    pub fn new(webhook_id: Option<String>, outcome: RemoteUpdateOutcome) -> Self {
        Self {
            webhook_id,
            outcome,
            finished_at: time::OffsetDateTime::now_utc(),
        }
    }
}
