pub mod admin;
pub mod tags;
pub mod webhook;

pub use admin::{CustomerEnvelope, CustomerTags, CustomerTagsUpdate};
pub use tags::TagSet;
pub use webhook::{DecodeError, InboundEvent, ResourceId, WebhookEvent, WebhookTopic};
