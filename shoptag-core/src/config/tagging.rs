//! Tagging behaviour.

use crate::ack::AckMode;
use shoptag_sdk::objects::WebhookTopic;

/// Tag applied to new customers unless configured otherwise.
pub const DEFAULT_TAG: &str = "wholesale";

/// What to tag, on which topic, and when to acknowledge.
#[derive(Debug, Clone)]
pub struct TaggingConfig {
    /// The tag merged into the resource's tag set.
    pub tag: String,
    /// The only actionable topic.
    pub topic: WebhookTopic,
    /// Acknowledge before (`Async`) or after (`Sync`) the remote call.
    pub ack_mode: AckMode,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_owned(),
            topic: WebhookTopic::new(WebhookTopic::CUSTOMERS_CREATE),
            ack_mode: AckMode::default(),
        }
    }
}
