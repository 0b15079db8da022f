//! In-memory test doubles.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for dependent crates' tests.

use crate::ack::AckMode;
use crate::config::{AdminApiConfig, AppConfig, TaggingConfig, WebhookConfig};
use crate::tagging::{TagStore, TagStoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use shoptag_sdk::objects::{InboundEvent, ResourceId, TagSet};
use shoptag_sdk::signature::{self, WebhookSecrets};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared secret used by [`test_config`] and [`signed_delivery`].
pub const TEST_SECRET: &str = "abc";

/// Shop domain used by [`test_config`].
pub const TEST_SHOP_DOMAIN: &str = "example.myshopify.com";

#[derive(Default)]
struct StoreState {
    tags: HashMap<ResourceId, TagSet>,
    fetches: usize,
    writes: Vec<(ResourceId, TagSet)>,
    fail_fetches: Option<StatusCode>,
    fail_writes: Option<StatusCode>,
}

/// A [`TagStore`] that keeps tags in memory and records every call.
///
/// Unknown resources read as having no tags.
#[derive(Default)]
pub struct RecordingTagStore {
    state: Mutex<StoreState>,
}

impl RecordingTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed(&self, id: ResourceId, tags: TagSet) {
        self.state().tags.insert(id, tags);
    }

    /// Make every subsequent fetch answer with `status`.
    pub fn fail_fetches_with(&self, status: StatusCode) {
        self.state().fail_fetches = Some(status);
    }

    /// Make every subsequent write answer with `status`. The write is still
    /// counted.
    pub fn fail_writes_with(&self, status: StatusCode) {
        self.state().fail_writes = Some(status);
    }

    pub fn tags_of(&self, id: ResourceId) -> Option<TagSet> {
        self.state().tags.get(&id).cloned()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }

    pub fn write_count(&self) -> usize {
        self.state().writes.len()
    }

    /// Every write attempted, in order.
    pub fn writes(&self) -> Vec<(ResourceId, TagSet)> {
        self.state().writes.clone()
    }
}

#[async_trait]
impl TagStore for RecordingTagStore {
    async fn fetch_tags(&self, id: ResourceId) -> Result<TagSet, TagStoreError> {
        let mut state = self.state();
        state.fetches += 1;
        if let Some(status) = state.fail_fetches {
            return Err(TagStoreError::Status {
                status,
                detail: "injected fetch failure".to_owned(),
            });
        }
        Ok(state.tags.get(&id).cloned().unwrap_or_default())
    }

    async fn write_tags(&self, id: ResourceId, tags: &TagSet) -> Result<(), TagStoreError> {
        let mut state = self.state();
        state.writes.push((id, tags.clone()));
        if let Some(status) = state.fail_writes {
            return Err(TagStoreError::Status {
                status,
                detail: "injected write failure".to_owned(),
            });
        }
        state.tags.insert(id, tags.clone());
        Ok(())
    }
}

/// Configuration with [`TEST_SECRET`], tag `wholesale` on `customers/create`.
pub fn test_config(ack_mode: AckMode) -> AppConfig {
    AppConfig {
        webhook: WebhookConfig::new(WebhookSecrets::new(TEST_SECRET.as_bytes().to_vec()))
            .with_expected_shop_domain(TEST_SHOP_DOMAIN),
        admin_api: AdminApiConfig::new(TEST_SHOP_DOMAIN, "shpat_test"),
        tagging: TaggingConfig {
            ack_mode,
            ..TaggingConfig::default()
        },
    }
}

/// A delivery of `body` on `topic`, signed with `secret`.
pub fn signed_delivery(secret: &str, body: &'static [u8], topic: &str) -> InboundEvent {
    InboundEvent::new(body, signature::sign(secret.as_bytes(), body)).with_topic(topic)
}
