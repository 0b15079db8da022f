//! TOML file configuration structures.
//!
//! The file only carries non-secret tuning. Secrets and the shop domain come
//! from the environment (see [`super::Args`]). Every section and key is
//! optional.

use serde::{Deserialize, Serialize};
use shoptag_core::ack::AckMode;
use shoptag_core::config::{DEFAULT_TAG, DEFAULT_TIMEOUT};
use shoptag_sdk::client::DEFAULT_API_VERSION;
use shoptag_sdk::objects::WebhookTopic;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub tagging: TaggingSection,
    pub admin_api: AdminApiSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Full listen address. Takes precedence over `PORT`.
    pub listen: Option<SocketAddr>,
}

/// Tagging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaggingSection {
    pub tag: String,
    pub topic: String,
    pub ack_mode: AckMode,
}

impl Default for TaggingSection {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_owned(),
            topic: WebhookTopic::CUSTOMERS_CREATE.to_owned(),
            ack_mode: AckMode::default(),
        }
    }
}

/// Admin API configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminApiSection {
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for AdminApiSection {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}
