//! Tag sets as the platform stores them.
//!
//! On the wire a resource's tags are one string of comma-separated labels
//! (`"vip, wholesale"`). [`TagSet`] keeps the labels in their original order
//! and serializes back to the same shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered, duplicate-free set of tag labels.
///
/// Matching is exact and case-sensitive after trimming surrounding
/// whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Parse a comma-separated tag string. Empty labels are dropped and
    /// repeated labels keep their first position.
    pub fn parse(raw: &str) -> Self {
        raw.split(',').map(str::to_owned).collect()
    }

    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.tags.iter().any(|existing| existing == tag)
    }

    /// The set with `tag` appended, or `None` when it is already present.
    ///
    /// Every existing label is kept in place; the result is always a
    /// superset of `self`.
    pub fn with_tag(&self, tag: &str) -> Option<TagSet> {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return None;
        }
        let mut merged = self.clone();
        merged.tags.push(tag.to_owned());
        Some(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn is_superset_of(&self, other: &TagSet) -> bool {
        other.iter().all(|tag| self.contains(tag))
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in iter {
            let tag = tag.trim();
            if tag.is_empty() || tags.iter().any(|existing| existing == tag) {
                continue;
            }
            tags.push(tag.to_owned());
        }
        Self { tags }
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tags.join(", "))
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
