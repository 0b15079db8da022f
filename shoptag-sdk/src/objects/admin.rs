//! Admin API request and response types.

use serde::{Deserialize, Serialize};

use super::tags::TagSet;
use super::webhook::ResourceId;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `PUT /customers/{id}.json` when only the tags change.
///
/// ```json
/// {"customer":{"id":42,"tags":"vip, wholesale"}}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CustomerTagsUpdate<'a> {
    pub customer: CustomerTagsRef<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerTagsRef<'a> {
    pub id: ResourceId,
    pub tags: &'a TagSet,
}

impl<'a> CustomerTagsUpdate<'a> {
    pub fn new(id: ResourceId, tags: &'a TagSet) -> Self {
        Self {
            customer: CustomerTagsRef { id, tags },
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of `GET /customers/{id}.json?fields=id,tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerEnvelope {
    pub customer: CustomerTags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerTags {
    pub id: ResourceId,
    #[serde(default)]
    pub tags: TagSet,
}
