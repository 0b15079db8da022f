//! Tag merge client.
//!
//! Applies one tag to a remote resource without ever dropping the tags it
//! already has:
//! - Skips every remote call when the webhook payload already lists the tag
//! - Otherwise fetches the resource's current tags and merges into those;
//!   the payload's tags are a snapshot and may be stale by now
//! - Skips the remote write when the fetched tags already hold the tag
//! - Reports non-success responses as a failed outcome, without retrying;
//!   redelivery is left to the sender's webhook retry schedule

use async_trait::async_trait;
use kanau::processor::Processor;
use reqwest::StatusCode;
use shoptag_sdk::client::{AdminClient, ClientError};
use shoptag_sdk::objects::{ResourceId, TagSet};
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors from the remote tag store.
#[derive(Debug, Error)]
pub enum TagStoreError {
    /// The remote answered with a non-success status.
    #[error("remote returned status {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// No usable answer (connection, timeout, undecodable body, ...).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ClientError> for TagStoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, body } => Self::Status {
                status,
                detail: body,
            },
            other => match other.status() {
                Some(status) => Self::Status {
                    status,
                    detail: other.to_string(),
                },
                None => Self::Transport(other.to_string()),
            },
        }
    }
}

/// Where resource tags live. The remote platform is the system of record.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Current tags of the resource.
    async fn fetch_tags(&self, id: ResourceId) -> Result<TagSet, TagStoreError>;

    /// Store `tags` as the resource's complete tag set.
    async fn write_tags(&self, id: ResourceId, tags: &TagSet) -> Result<(), TagStoreError>;
}

#[async_trait]
impl TagStore for AdminClient {
    async fn fetch_tags(&self, id: ResourceId) -> Result<TagSet, TagStoreError> {
        Ok(self.get_customer_tags(id).await?)
    }

    async fn write_tags(&self, id: ResourceId, tags: &TagSet) -> Result<(), TagStoreError> {
        Ok(self.update_customer_tags(id, tags).await?)
    }
}

/// What happened to one tag request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Tag was already present; no remote write was made.
    AlreadyTagged,
    /// Remote write succeeded.
    Tagged,
    /// Remote read or write failed.
    Failed,
    /// Never attempted (or cut short) because the service shut down.
    Abandoned,
}

/// Result of one tag request. Logged and reported, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdateOutcome {
    pub resource_id: ResourceId,
    pub kind: OutcomeKind,
    /// Status of the last remote exchange, when there was one.
    pub status_code: Option<StatusCode>,
    pub detail: String,
}

impl RemoteUpdateOutcome {
    pub fn already_tagged(resource_id: ResourceId, tag: &str) -> Self {
        Self {
            resource_id,
            kind: OutcomeKind::AlreadyTagged,
            status_code: None,
            detail: format!("tag {tag:?} already present"),
        }
    }

    pub fn tagged(resource_id: ResourceId, tags: &TagSet) -> Self {
        Self {
            resource_id,
            kind: OutcomeKind::Tagged,
            status_code: Some(StatusCode::OK),
            detail: format!("tags set to {tags:?}", tags = tags.to_string()),
        }
    }

    pub fn failed(resource_id: ResourceId, err: &TagStoreError) -> Self {
        let status_code = match err {
            TagStoreError::Status { status, .. } => Some(*status),
            TagStoreError::Transport(_) => None,
        };
        Self {
            resource_id,
            kind: OutcomeKind::Failed,
            status_code,
            detail: err.to_string(),
        }
    }

    pub fn abandoned(resource_id: ResourceId, detail: impl Into<String>) -> Self {
        Self {
            resource_id,
            kind: OutcomeKind::Abandoned,
            status_code: None,
            detail: detail.into(),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.kind, OutcomeKind::AlreadyTagged | OutcomeKind::Tagged)
    }

    /// Success reported without any remote write.
    pub fn is_synthetic(&self) -> bool {
        self.kind == OutcomeKind::AlreadyTagged
    }
}

/// One tag request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTag {
    pub resource_id: ResourceId,
    pub tag: String,
    /// Tags known from the triggering payload, if it carried them.
    pub current_tags: Option<TagSet>,
}

/// Merges a tag into a resource's remote tag set.
#[derive(Clone)]
pub struct TagMergeClient {
    store: Arc<dyn TagStore>,
}

impl TagMergeClient {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// Merge `tag` into the resource's tags.
    ///
    /// Failures are logged here and returned as an outcome; this never errors.
    pub async fn apply_tag(
        &self,
        resource_id: ResourceId,
        tag: &str,
        current_tags: Option<TagSet>,
    ) -> RemoteUpdateOutcome {
        if current_tags.is_some_and(|tags| tags.contains(tag)) {
            info!(resource_id = %resource_id, tag, "Tag already in payload, skipping update");
            return RemoteUpdateOutcome::already_tagged(resource_id, tag);
        }

        debug!(resource_id = %resource_id, "Fetching current tags");
        let current = match self.store.fetch_tags(resource_id).await {
            Ok(tags) => tags,
            Err(e) => {
                error!(resource_id = %resource_id, error = %e, "Failed to fetch current tags");
                return RemoteUpdateOutcome::failed(resource_id, &e);
            }
        };

        let Some(merged) = current.with_tag(tag) else {
            info!(resource_id = %resource_id, tag, "Tag already present, skipping update");
            return RemoteUpdateOutcome::already_tagged(resource_id, tag);
        };

        match self.store.write_tags(resource_id, &merged).await {
            Ok(()) => {
                info!(resource_id = %resource_id, tags = %merged, "Tag added");
                RemoteUpdateOutcome::tagged(resource_id, &merged)
            }
            Err(e) => {
                error!(resource_id = %resource_id, error = %e, "Tag update failed");
                RemoteUpdateOutcome::failed(resource_id, &e)
            }
        }
    }
}

impl Processor<ApplyTag> for TagMergeClient {
    type Output = RemoteUpdateOutcome;
    type Error = Infallible;

    async fn process(&self, request: ApplyTag) -> Result<RemoteUpdateOutcome, Infallible> {
        Ok(self
            .apply_tag(request.resource_id, &request.tag, request.current_tags)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTagStore;

    fn client(store: &Arc<RecordingTagStore>) -> TagMergeClient {
        TagMergeClient::new(store.clone())
    }

    #[tokio::test]
    async fn test_merges_into_fetched_tags_not_payload_snapshot() {
        let store = Arc::new(RecordingTagStore::new());
        store.seed(ResourceId(42), TagSet::parse("vip, loyalty"));

        let outcome = client(&store)
            .apply_tag(ResourceId(42), "wholesale", Some(TagSet::parse("vip")))
            .await;

        assert_eq!(outcome.kind, OutcomeKind::Tagged);
        assert!(outcome.success());
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(
            store.writes(),
            vec![(ResourceId(42), TagSet::parse("vip, loyalty, wholesale"))]
        );
    }

    #[tokio::test]
    async fn test_stale_snapshot_twice_writes_once() {
        let store = Arc::new(RecordingTagStore::new());
        store.seed(ResourceId(42), TagSet::parse("vip, loyalty"));
        let client = client(&store);

        for _ in 0..2 {
            let outcome = client
                .apply_tag(ResourceId(42), "wholesale", Some(TagSet::parse("vip")))
                .await;
            assert!(outcome.success());
        }

        assert_eq!(store.write_count(), 1);
        assert_eq!(
            store.tags_of(ResourceId(42)),
            Some(TagSet::parse("vip, loyalty, wholesale"))
        );
    }

    #[tokio::test]
    async fn test_fetches_when_payload_has_no_tags() {
        let store = Arc::new(RecordingTagStore::new());
        store.seed(ResourceId(42), TagSet::parse("newsletter, vip"));

        let outcome = client(&store).apply_tag(ResourceId(42), "wholesale", None).await;

        assert_eq!(outcome.kind, OutcomeKind::Tagged);
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(
            store.tags_of(ResourceId(42)),
            Some(TagSet::parse("newsletter, vip, wholesale"))
        );
    }

    #[tokio::test]
    async fn test_present_tag_skips_remote_call() {
        let store = Arc::new(RecordingTagStore::new());
        let outcome = client(&store)
            .apply_tag(
                ResourceId(42),
                "wholesale",
                Some(TagSet::parse("vip, wholesale")),
            )
            .await;

        assert_eq!(outcome.kind, OutcomeKind::AlreadyTagged);
        assert!(outcome.success());
        assert!(outcome.is_synthetic());
        assert_eq!(store.fetch_count() + store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_applying_twice_writes_once() {
        let store = Arc::new(RecordingTagStore::new());
        store.seed(ResourceId(7), TagSet::parse("vip"));
        let client = client(&store);

        let first = client.apply_tag(ResourceId(7), "wholesale", None).await;
        let second = client.apply_tag(ResourceId(7), "wholesale", None).await;

        assert_eq!(first.kind, OutcomeKind::Tagged);
        assert_eq!(second.kind, OutcomeKind::AlreadyTagged);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.tags_of(ResourceId(7)), Some(TagSet::parse("vip, wholesale")));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_retried() {
        let store = Arc::new(RecordingTagStore::new());
        store.fail_writes_with(StatusCode::INTERNAL_SERVER_ERROR);

        let outcome = client(&store)
            .apply_tag(ResourceId(42), "wholesale", Some(TagSet::default()))
            .await;

        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(!outcome.success());
        assert_eq!(outcome.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_never_writes() {
        let store = Arc::new(RecordingTagStore::new());
        store.fail_fetches_with(StatusCode::NOT_FOUND);

        let outcome = client(&store).apply_tag(ResourceId(42), "wholesale", None).await;

        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(outcome.status_code, Some(StatusCode::NOT_FOUND));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_processor_delegates() {
        let store = Arc::new(RecordingTagStore::new());
        store.seed(ResourceId(3), TagSet::parse("a, b"));
        let request = ApplyTag {
            resource_id: ResourceId(3),
            tag: "wholesale".to_owned(),
            current_tags: Some(TagSet::parse("a, b")),
        };

        let outcome = match client(&store).process(request).await {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        assert_eq!(outcome.kind, OutcomeKind::Tagged);
        assert_eq!(store.tags_of(ResourceId(3)), Some(TagSet::parse("a, b, wholesale")));
    }

    #[test]
    fn test_client_error_mapping() {
        let err: TagStoreError = ClientError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            TagStoreError::Status { status, .. } if status == StatusCode::TOO_MANY_REQUESTS
        ));

        let err: TagStoreError = ClientError::Json(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )
        .into();
        assert!(matches!(err, TagStoreError::Transport(_)));
    }
}
