//! Topic routing.
//!
//! Exactly one topic is actionable. Every other topic, and a missing topic
//! header, is a valid delivery that is acknowledged and dropped.

use shoptag_sdk::objects::WebhookTopic;

/// Why an authenticated delivery is not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Topic is not the actionable one (or absent).
    Topic,
    /// Delivery names a different shop than the configured one.
    ShopDomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Actionable,
    Ignored(IgnoreReason),
}

/// Decides whether a verified delivery should trigger the tag update.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    actionable: WebhookTopic,
    expected_shop_domain: Option<String>,
}

impl TopicRouter {
    pub fn new(actionable: WebhookTopic) -> Self {
        Self {
            actionable,
            expected_shop_domain: None,
        }
    }

    pub fn with_expected_shop_domain(mut self, domain: Option<String>) -> Self {
        self.expected_shop_domain = domain;
        self
    }

    pub fn is_actionable(&self, topic: Option<&str>) -> bool {
        topic.is_some_and(|topic| topic == self.actionable.as_str())
    }

    /// Route a delivery by topic and, when configured, sending shop.
    ///
    /// A missing shop-domain header is accepted; only a conflicting one is
    /// ignored. Domains compare case-insensitively.
    pub fn route(&self, topic: Option<&str>, shop_domain: Option<&str>) -> RoutingDecision {
        if !self.is_actionable(topic) {
            return RoutingDecision::Ignored(IgnoreReason::Topic);
        }
        if let (Some(expected), Some(actual)) = (&self.expected_shop_domain, shop_domain) {
            if !expected.eq_ignore_ascii_case(actual.trim()) {
                return RoutingDecision::Ignored(IgnoreReason::ShopDomain);
            }
        }
        RoutingDecision::Actionable
    }
}
