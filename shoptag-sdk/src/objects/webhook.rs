//! Inbound webhook deliveries and their decoded form.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::tags::TagSet;

/// One webhook delivery exactly as it arrived.
///
/// The body is kept as the raw bytes off the wire; it is only ever
/// verified and then decoded, never re-encoded.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    body: Bytes,
    signature: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    webhook_id: Option<String>,
}

impl InboundEvent {
    /// Create a delivery from its body and `X-Shopify-Hmac-Sha256` value.
    ///
    /// An absent signature header is represented by an empty string.
    pub fn new(body: impl Into<Bytes>, signature: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            signature: signature.into(),
            topic: None,
            shop_domain: None,
            webhook_id: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_shop_domain(mut self, shop_domain: impl Into<String>) -> Self {
        self.shop_domain = Some(shop_domain.into());
        self
    }

    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Event topic as declared in the `X-Shopify-Topic` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebhookTopic(String);

impl WebhookTopic {
    pub const CUSTOMERS_CREATE: &str = "customers/create";

    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric id of a remote resource.
///
/// Payloads carry ids either as JSON numbers or as numeric strings; both
/// deserialize here. Serializes as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(id) => Ok(Self(id)),
            Repr::Text(text) => text
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid resource id: {text:?}"))),
        }
    }
}

/// Errors produced while decoding a verified payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a json object")]
    NotAnObject,
    #[error("payload carries no resource id")]
    MissingResourceId,
}

/// Read-only structured view of a verified delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub topic: Option<WebhookTopic>,
    pub resource_id: Option<ResourceId>,
    /// Tags the resource held when the event was emitted, when the payload
    /// says so.
    pub current_tags: Option<TagSet>,
}

/// Read `value` as `T`, treating an absent field or a field of another
/// shape as unknown.
fn lenient<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    value.and_then(|value| T::deserialize(value).ok())
}

impl WebhookEvent {
    /// Decode a verified body. The topic comes from the header, not the body.
    ///
    /// Only the structure is enforced: the body must be a JSON object.
    /// Field shapes vary between topics, so an `id`, `tags` or `customer`
    /// this service cannot read is treated as absent rather than malformed.
    ///
    /// The resource id is read from the top-level `id`, falling back to the
    /// nested `customer.id`; tags follow the same order.
    pub fn decode(raw_body: &[u8], topic: Option<&str>) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw_body)?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::NotAnObject);
        };
        let nested = fields.get("customer").and_then(Value::as_object);
        let nested_field = |name: &str| nested.and_then(|customer| customer.get(name));

        Ok(Self {
            topic: topic.map(WebhookTopic::new),
            resource_id: lenient(fields.get("id")).or_else(|| lenient(nested_field("id"))),
            current_tags: lenient(fields.get("tags")).or_else(|| lenient(nested_field("tags"))),
        })
    }

    /// The resource id, required once the event is known to be actionable.
    pub fn require_resource_id(&self) -> Result<ResourceId, DecodeError> {
        self.resource_id.ok_or(DecodeError::MissingResourceId)
    }

    /// Render the body fields this view was decoded from, in the top-level
    /// layout. Used to build deliveries for local replay and tests.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<ResourceId>,
            #[serde(skip_serializing_if = "Option::is_none")]
            tags: Option<&'a TagSet>,
        }

        serde_json::to_vec(&Body {
            id: self.resource_id,
            tags: self.current_tags.as_ref(),
        })
    }
}
