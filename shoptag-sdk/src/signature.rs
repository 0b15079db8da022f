//! Signature algorithm and verification for inbound webhooks.
//!
//! Every webhook delivery carries an HMAC-SHA256 of the raw request body,
//! keyed with the app's API secret. The wire format for the header is:
//!
//! ```text
//! X-Shopify-Hmac-Sha256: {base64(HMAC-SHA256(raw_body, secret))}
//! ```
//!
//! The digest covers the exact bytes received. Parsing the JSON and
//! serializing it again changes whitespace and key order, so verification
//! always runs on the untouched body.

use subtle::ConstantTimeEq;

/// Header name for the base64 HMAC-SHA256 signature.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Header name carrying the event topic (e.g. `customers/create`).
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";

/// Header name carrying the `*.myshopify.com` domain of the sending shop.
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Header name carrying the unique delivery id.
pub const WEBHOOK_ID_HEADER: &str = "X-Shopify-Webhook-Id";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    SignatureMismatch,
}

/// Outcome of verifying one delivery. Computed once per event and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
}

impl VerificationResult {
    pub fn into_result(self) -> Result<(), SignatureError> {
        if self.valid {
            Ok(())
        } else {
            Err(SignatureError::SignatureMismatch)
        }
    }
}

/// Compute the base64 signature the platform would send for `raw_body`.
pub fn sign(secret: &[u8], raw_body: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        raw_body,
    );
    fast32::base64::RFC4648.encode(tag.as_ref())
}

/// Verify `supplied` against the HMAC of `raw_body` under `secret`.
///
/// An absent header should be passed as `""`. Empty, truncated, padded or
/// otherwise mismatched values all go through the same constant-time
/// comparison and yield `false`.
pub fn verify(secret: &[u8], raw_body: &[u8], supplied: &str) -> bool {
    let expected = sign(secret, raw_body);
    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

/// Constant-time byte comparison.
///
/// Both sides are padded to the same length with different fill bytes, so
/// the content comparison never returns early, and the length check is
/// folded in with a constant-time AND.
fn constant_time_eq(expected: &[u8], supplied: &[u8]) -> bool {
    let len = expected.len().max(supplied.len());

    let mut lhs = vec![0x00u8; len];
    let mut rhs = vec![0xFFu8; len];
    lhs[..expected.len()].copy_from_slice(expected);
    rhs[..supplied.len()].copy_from_slice(supplied);

    let lengths_equal = expected.len().ct_eq(&supplied.len());
    let contents_equal = lhs.as_slice().ct_eq(rhs.as_slice());

    (lengths_equal & contents_equal).into()
}

/// The shared secret(s) used to authenticate deliveries.
///
/// While an API secret is being rotated the platform may still sign with the
/// old one, so a previous secret can be kept alongside the current one.
#[derive(Clone)]
pub struct WebhookSecrets {
    current: Box<[u8]>,
    previous: Option<Box<[u8]>>,
}

impl WebhookSecrets {
    pub fn new(current: impl Into<Box<[u8]>>) -> Self {
        Self {
            current: current.into(),
            previous: None,
        }
    }

    /// Also accept signatures made with `previous`.
    pub fn with_previous(mut self, previous: impl Into<Box<[u8]>>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    /// Verify a delivery against the current secret, then the previous one.
    ///
    /// Both checks always run when a previous secret is configured.
    pub fn verify(&self, raw_body: &[u8], supplied: &str) -> VerificationResult {
        let current = verify(&self.current, raw_body, supplied);
        let previous = self
            .previous
            .as_deref()
            .is_some_and(|previous| verify(previous, raw_body, supplied));
        VerificationResult {
            valid: current | previous,
        }
    }
}

impl std::fmt::Debug for WebhookSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSecrets")
            .field("current", &"<redacted>")
            .field("previous", &self.previous.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
