//! Acknowledgement policy.
//!
//! Decides the status code returned to the webhook sender and whether the
//! tag update runs before or after that response.
//!
//! | State         | Trigger                                  | Status |
//! |---------------|------------------------------------------|--------|
//! | Rejected      | signature verification failed            | 401    |
//! | BadPayload    | body failed to decode after verification | 400    |
//! | Ignored       | topic (or shop) not actionable           | 200    |
//! | AcceptedSync  | actionable, remote call awaited first    | 200    |
//! | AcceptedAsync | actionable, remote call runs afterwards  | 200    |
//!
//! An accepted event is always answered with 200, even when the remote
//! update fails. The sender retries on anything else, and a retry storm does
//! not fix a failing Admin API; failures surface through logs and the
//! outcome report channel instead.
//!
//! `Sync` gives an accurate signal in the logs before the response leaves
//! but risks the sender's delivery timeout. `Async` always answers fast and
//! moves failure recovery entirely onto the operator. The default is `Async`.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shoptag_sdk::objects::DecodeError;
use shoptag_sdk::signature::VerificationResult;

use crate::routing::RoutingDecision;

/// When an actionable event is acknowledged relative to its remote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckMode {
    /// Await the remote call, then respond.
    Sync,
    /// Respond first, hand the remote call to the background worker.
    #[default]
    Async,
}

impl std::fmt::Display for AckMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AckMode::Sync => write!(f, "sync"),
            AckMode::Async => write!(f, "async"),
        }
    }
}

/// Where the pipeline ended up for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Rejected,
    BadPayload,
    Ignored,
    AcceptedSync,
    AcceptedAsync,
}

/// Ordering of the response relative to the remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckTiming {
    /// Nothing to do remotely.
    NoRemoteWork,
    /// Response is sent once the remote call finished.
    AfterRemoteCall,
    /// Response is sent first; the remote call follows in the background.
    BeforeRemoteCall,
}

/// The response committed to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub state: PipelineState,
    pub status: StatusCode,
    pub timing: AckTiming,
}

impl Acknowledgement {
    pub fn for_state(state: PipelineState) -> Self {
        let (status, timing) = match state {
            PipelineState::Rejected => (StatusCode::UNAUTHORIZED, AckTiming::NoRemoteWork),
            PipelineState::BadPayload => (StatusCode::BAD_REQUEST, AckTiming::NoRemoteWork),
            PipelineState::Ignored => (StatusCode::OK, AckTiming::NoRemoteWork),
            PipelineState::AcceptedSync => (StatusCode::OK, AckTiming::AfterRemoteCall),
            PipelineState::AcceptedAsync => (StatusCode::OK, AckTiming::BeforeRemoteCall),
        };
        Self {
            state,
            status,
            timing,
        }
    }

    /// Short diagnostic for the response body. Never carries detail beyond
    /// the state itself.
    pub fn reason(&self) -> &'static str {
        match self.state {
            PipelineState::Rejected => "unauthorized",
            PipelineState::BadPayload => "malformed payload",
            PipelineState::Ignored => "ignored",
            PipelineState::AcceptedSync | PipelineState::AcceptedAsync => "accepted",
        }
    }
}

/// The acknowledgement policy for the actionable topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPolicy {
    pub mode: AckMode,
}

impl AckPolicy {
    pub fn new(mode: AckMode) -> Self {
        Self { mode }
    }

    /// Decide the response from the stage results reached so far.
    ///
    /// A stage that was not reached is `None`. The earliest failing stage
    /// wins: a bad signature is `Rejected` no matter what follows.
    pub fn decide_response(
        &self,
        verification: VerificationResult,
        decode: Option<Result<(), &DecodeError>>,
        routing: Option<RoutingDecision>,
    ) -> Acknowledgement {
        if !verification.valid {
            return Acknowledgement::for_state(PipelineState::Rejected);
        }
        match decode {
            Some(Ok(())) => {}
            Some(Err(_)) | None => return Acknowledgement::for_state(PipelineState::BadPayload),
        }
        let state = match routing {
            Some(RoutingDecision::Actionable) => match self.mode {
                AckMode::Sync => PipelineState::AcceptedSync,
                AckMode::Async => PipelineState::AcceptedAsync,
            },
            Some(RoutingDecision::Ignored(_)) | None => PipelineState::Ignored,
        };
        Acknowledgement::for_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::IgnoreReason;

    const VALID: VerificationResult = VerificationResult { valid: true };
    const INVALID: VerificationResult = VerificationResult { valid: false };

    #[test]
    fn test_rejected_wins_over_everything() {
        let policy = AckPolicy::new(AckMode::Sync);
        let ack = policy.decide_response(INVALID, Some(Ok(())), Some(RoutingDecision::Actionable));
        assert_eq!(ack.state, PipelineState::Rejected);
        assert_eq!(ack.status, StatusCode::UNAUTHORIZED);
        assert_eq!(ack.timing, AckTiming::NoRemoteWork);
    }

    #[test]
    fn test_bad_payload() {
        let policy = AckPolicy::new(AckMode::Async);
        let error = DecodeError::NotAnObject;
        let ack = policy.decide_response(VALID, Some(Err(&error)), None);
        assert_eq!(ack.state, PipelineState::BadPayload);
        assert_eq!(ack.status, StatusCode::BAD_REQUEST);

        let missing = DecodeError::MissingResourceId;
        let ack = policy.decide_response(VALID, Some(Err(&missing)), Some(RoutingDecision::Actionable));
        assert_eq!(ack.state, PipelineState::BadPayload);
    }

    #[test]
    fn test_ignored() {
        let policy = AckPolicy::new(AckMode::Sync);
        let ack = policy.decide_response(
            VALID,
            Some(Ok(())),
            Some(RoutingDecision::Ignored(IgnoreReason::Topic)),
        );
        assert_eq!(ack.state, PipelineState::Ignored);
        assert_eq!(ack.status, StatusCode::OK);
        assert_eq!(ack.timing, AckTiming::NoRemoteWork);
    }

    #[test]
    fn test_accepted_follows_mode() {
        let sync = AckPolicy::new(AckMode::Sync).decide_response(
            VALID,
            Some(Ok(())),
            Some(RoutingDecision::Actionable),
        );
        assert_eq!(sync.state, PipelineState::AcceptedSync);
        assert_eq!(sync.status, StatusCode::OK);
        assert_eq!(sync.timing, AckTiming::AfterRemoteCall);

        let not_sync = AckPolicy::new(AckMode::Async).decide_response(
            VALID,
            Some(Ok(())),
            Some(RoutingDecision::Actionable),
        );
        assert_eq!(not_sync.state, PipelineState::AcceptedAsync);
        assert_eq!(not_sync.status, StatusCode::OK);
        assert_eq!(not_sync.timing, AckTiming::BeforeRemoteCall);
    }

    #[test]
    fn test_sender_only_sees_three_codes() {
        for state in [
            PipelineState::Rejected,
            PipelineState::BadPayload,
            PipelineState::Ignored,
            PipelineState::AcceptedSync,
            PipelineState::AcceptedAsync,
        ] {
            let status = Acknowledgement::for_state(state).status;
            assert!(
                [StatusCode::OK, StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED].contains(&status)
            );
        }
    }

    #[test]
    fn test_ack_mode_serde() {
        assert_eq!(serde_json::to_string(&AckMode::Sync).unwrap(), r#""sync""#);
        let mode: AckMode = serde_json::from_str(r#""async""#).unwrap();
        assert_eq!(mode, AckMode::Async);
        assert_eq!(AckMode::default(), AckMode::Async);
    }
}
