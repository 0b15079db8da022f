//! Configuration types for shoptag.
//!
//! These types represent the validated runtime configuration. They are
//! built once at startup by the server crate and handed to each component
//! by reference; nothing here reads process-wide state.

mod admin_api;
mod tagging;
mod webhook;

pub use admin_api::{AdminApiConfig, DEFAULT_TIMEOUT};
pub use tagging::{DEFAULT_TAG, TaggingConfig};
pub use webhook::WebhookConfig;

/// Complete, validated configuration of the tagging service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Inbound webhook authentication.
    pub webhook: WebhookConfig,
    /// Outbound Admin API access.
    pub admin_api: AdminApiConfig,
    /// Which event gets which tag, and how it is acknowledged.
    pub tagging: TaggingConfig,
}
