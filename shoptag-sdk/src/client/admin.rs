//! Admin API client (shoptag → shop's Admin REST API).
//!
//! All requests carry the app's access token in the
//! `X-Shopify-Access-Token` header.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::admin::{CustomerEnvelope, CustomerTagsUpdate};
use crate::objects::tags::TagSet;
use crate::objects::webhook::ResourceId;

/// Header name carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Admin API version used unless configured otherwise. Pinned rather than
/// pointing at a moving alias.
pub const DEFAULT_API_VERSION: &str = "2024-10";

/// Typed HTTP client for the shop's **Admin REST API**.
#[derive(Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    access_token: String,
}

impl AdminClient {
    /// Create a new `AdminClient` for `https://{shop_domain}/admin/api/{api_version}/`.
    pub fn new(
        shop_domain: &str,
        api_version: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&format!("https://{shop_domain}/admin/api/{api_version}/"))?;
        Ok(Self::with_base_url(base_url, access_token))
    }

    /// Create a client against an explicit API root. The URL must end with
    /// `/` so endpoint paths join beneath it.
    pub fn with_base_url(base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            access_token: access_token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn customer_url(&self, id: ResourceId) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!("customers/{id}.json"))?)
    }

    /// `GET /customers/{id}.json?fields=id,tags` – current tags of a customer.
    pub async fn get_customer_tags(&self, id: ResourceId) -> Result<TagSet, ClientError> {
        let url = self.customer_url(id)?;

        let resp = self
            .http
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .query(&[("fields", "id,tags")])
            .send()
            .await?;

        let envelope: CustomerEnvelope = parse_response(resp).await?;
        Ok(envelope.customer.tags)
    }

    /// `PUT /customers/{id}.json` – replace the customer's tag string.
    ///
    /// The platform stores exactly the tags sent, so callers pass the full
    /// merged set.
    pub async fn update_customer_tags(
        &self,
        id: ResourceId,
        tags: &TagSet,
    ) -> Result<(), ClientError> {
        let url = self.customer_url(id)?;

        let resp = self
            .http
            .put(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&CustomerTagsUpdate::new(id, tags))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_layout() {
        let client = AdminClient::new("example.myshopify.com", DEFAULT_API_VERSION, "shpat_x")
            .unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://example.myshopify.com/admin/api/2024-10/"
        );
        assert_eq!(
            client.customer_url(ResourceId(42)).unwrap().as_str(),
            "https://example.myshopify.com/admin/api/2024-10/customers/42.json"
        );
    }

    #[test]
    fn test_invalid_domain() {
        assert!(matches!(
            AdminClient::new("bad domain with spaces", DEFAULT_API_VERSION, "t"),
            Err(ClientError::Url(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = AdminClient::new("example.myshopify.com", "2024-10", "shpat_secret").unwrap();
        assert!(!format!("{client:?}").contains("shpat_secret"));
    }
}
