//! Inbound webhook configuration.

use shoptag_sdk::signature::WebhookSecrets;

/// Webhook authentication settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared secret(s) for HMAC verification.
    pub secrets: WebhookSecrets,
    /// When set, deliveries whose `X-Shopify-Shop-Domain` header names a
    /// different shop are ignored.
    pub expected_shop_domain: Option<String>,
}

impl WebhookConfig {
    pub fn new(secrets: WebhookSecrets) -> Self {
        Self {
            secrets,
            expected_shop_domain: None,
        }
    }

    pub fn with_expected_shop_domain(mut self, domain: impl Into<String>) -> Self {
        self.expected_shop_domain = Some(domain.into());
        self
    }
}
