//! Admin API access configuration.

use shoptag_sdk::client::DEFAULT_API_VERSION;
use std::time::Duration;

/// Default per-request timeout for Admin API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for calls to the shop's Admin API.
#[derive(Clone)]
pub struct AdminApiConfig {
    /// The shop's `*.myshopify.com` domain.
    pub shop_domain: String,
    /// Admin API access token (`shpat_…`).
    pub access_token: String,
    /// Pinned Admin API version, e.g. `2024-10`.
    pub api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AdminApiConfig {
    pub fn new(shop_domain: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            shop_domain: shop_domain.into(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for AdminApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiConfig")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}
