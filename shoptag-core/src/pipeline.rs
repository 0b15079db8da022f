//! The webhook pipeline.
//!
//! Verifier → Decoder → Router → Tag Merge Client → Acknowledgement Policy,
//! composed here. This is the only stage with side effects; every other
//! stage is a pure function of its inputs.
//!
//! Handling is two-phase for accepted events in `async` mode: phase one
//! verifies, decodes and routes, queues a [`TagJob`] and produces the
//! acknowledgement; phase two is the job itself, run by the
//! [`TagWorker`](crate::processors::TagWorker), which publishes its own
//! [`TagOutcomeReport`].

use crate::ack::{AckPolicy, Acknowledgement, PipelineState};
use crate::config::AppConfig;
use crate::events::{OutcomeReportSender, TagJob, TagJobSender, TagOutcomeReport};
use crate::routing::{RoutingDecision, TopicRouter};
use crate::tagging::{RemoteUpdateOutcome, TagMergeClient};
use shoptag_sdk::objects::{InboundEvent, WebhookEvent};
use shoptag_sdk::signature::WebhookSecrets;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// What the pipeline did with one delivery.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The response committed to the sender.
    pub ack: Acknowledgement,
    /// The remote outcome, when it was awaited before responding.
    pub outcome: Option<RemoteUpdateOutcome>,
}

impl PipelineReport {
    fn acknowledged(ack: Acknowledgement) -> Self {
        Self { ack, outcome: None }
    }
}

/// Authenticates, decodes, routes and tags inbound deliveries.
pub struct WebhookPipeline {
    secrets: WebhookSecrets,
    router: TopicRouter,
    policy: AckPolicy,
    tag: String,
    merge: TagMergeClient,
    jobs: TagJobSender,
    reports: OutcomeReportSender,
}

impl WebhookPipeline {
    pub fn new(
        config: &AppConfig,
        merge: TagMergeClient,
        jobs: TagJobSender,
        reports: OutcomeReportSender,
    ) -> Self {
        Self {
            secrets: config.webhook.secrets.clone(),
            router: TopicRouter::new(config.tagging.topic.clone())
                .with_expected_shop_domain(config.webhook.expected_shop_domain.clone()),
            policy: AckPolicy::new(config.tagging.ack_mode),
            tag: config.tagging.tag.clone(),
            merge,
            jobs,
            reports,
        }
    }

    /// Run one delivery through the pipeline.
    pub async fn handle(&self, event: InboundEvent) -> PipelineReport {
        let webhook_id = event.webhook_id().map(str::to_owned);

        // 1) Verify over the raw bytes.
        let verification = self.secrets.verify(event.body(), event.signature());
        if let Err(e) = verification.into_result() {
            warn!(webhook_id = ?webhook_id, error = %e, "HMAC verification failed");
            return PipelineReport::acknowledged(self.policy.decide_response(
                verification,
                None,
                None,
            ));
        }
        debug!(webhook_id = ?webhook_id, "Verified webhook");

        // 2) Decode.
        let decoded = match WebhookEvent::decode(event.body(), event.topic()) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(webhook_id = ?webhook_id, error = %e, "Authenticated webhook with malformed payload");
                return PipelineReport::acknowledged(self.policy.decide_response(
                    verification,
                    Some(Err(&e)),
                    None,
                ));
            }
        };

        // 3) Route.
        let routing = self.router.route(event.topic(), event.shop_domain());
        if let RoutingDecision::Ignored(reason) = routing {
            info!(
                webhook_id = ?webhook_id,
                topic = ?event.topic(),
                shop_domain = ?event.shop_domain(),
                reason = ?reason,
                "Ignoring webhook"
            );
            return PipelineReport::acknowledged(self.policy.decide_response(
                verification,
                Some(Ok(())),
                Some(routing),
            ));
        }

        let resource_id = match decoded.require_resource_id() {
            Ok(id) => id,
            Err(e) => {
                error!(webhook_id = ?webhook_id, error = %e, "Actionable webhook without resource id");
                return PipelineReport::acknowledged(self.policy.decide_response(
                    verification,
                    Some(Err(&e)),
                    Some(routing),
                ));
            }
        };

        // 4) Tag, before or after acknowledging.
        let job = TagJob {
            webhook_id,
            resource_id,
            tag: self.tag.clone(),
            current_tags: decoded.current_tags,
        };
        let ack = self
            .policy
            .decide_response(verification, Some(Ok(())), Some(routing));

        match ack.state {
            PipelineState::AcceptedAsync => match self.jobs.try_send(job) {
                Ok(()) => {
                    debug!(resource_id = %resource_id, "Queued tag job");
                    PipelineReport::acknowledged(ack)
                }
                Err(TrySendError::Full(job)) | Err(TrySendError::Closed(job)) => {
                    // Queue unavailable: do the work now rather than lose it.
                    warn!(resource_id = %resource_id, "Tag job queue unavailable, tagging inline");
                    self.tag_inline(job).await
                }
            },
            _ => self.tag_inline(job).await,
        }
    }

    /// Run the merge before responding and publish the outcome.
    async fn tag_inline(&self, job: TagJob) -> PipelineReport {
        let outcome = self
            .merge
            .apply_tag(job.resource_id, &job.tag, job.current_tags)
            .await;

        if !outcome.success() {
            // Still acknowledged with 200; see `crate::ack`.
            error!(
                webhook_id = ?job.webhook_id,
                resource_id = %outcome.resource_id,
                status = ?outcome.status_code,
                detail = %outcome.detail,
                "Tag update failed, acknowledging anyway"
            );
        }
        let _ = self
            .reports
            .send(TagOutcomeReport::new(job.webhook_id, outcome.clone()));

        PipelineReport {
            ack: Acknowledgement::for_state(PipelineState::AcceptedSync),
            outcome: Some(outcome),
        }
    }
}
