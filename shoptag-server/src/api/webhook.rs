use axum::{
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use shoptag_sdk::objects::InboundEvent;
use shoptag_sdk::signature::{HMAC_HEADER, SHOP_DOMAIN_HEADER, TOPIC_HEADER, WEBHOOK_ID_HEADER};

use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// `POST /webhook` – receive one delivery.
///
/// The body is taken as raw bytes and handed to the pipeline untouched.
/// The response is always 200, 400 or 401 with a short diagnostic.
pub(super) async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read webhook body");
            return (StatusCode::BAD_REQUEST, "malformed payload").into_response();
        }
    };

    // A missing or non-ASCII signature header verifies as empty, and fails.
    let mut event = InboundEvent::new(body, header(&headers, HMAC_HEADER).unwrap_or_default());
    if let Some(topic) = header(&headers, TOPIC_HEADER) {
        event = event.with_topic(topic);
    }
    if let Some(shop_domain) = header(&headers, SHOP_DOMAIN_HEADER) {
        event = event.with_shop_domain(shop_domain);
    }
    if let Some(webhook_id) = header(&headers, WEBHOOK_ID_HEADER) {
        event = event.with_webhook_id(webhook_id);
    }

    let report = state.pipeline.handle(event).await;
    (report.ack.status, report.ack.reason()).into_response()
}

#[cfg(test)]
mod tests {
    use crate::server::{MAX_BODY_BYTES, build_router};
    use crate::state::AppState;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use shoptag_core::ack::AckMode;
    use shoptag_core::events::{OutcomeReportReceiver, outcome_report_channel, tag_job_channel};
    use shoptag_core::pipeline::WebhookPipeline;
    use shoptag_core::processors::TagWorker;
    use shoptag_core::tagging::{OutcomeKind, TagMergeClient};
    use shoptag_core::testing::{RecordingTagStore, TEST_SECRET, TEST_SHOP_DOMAIN, test_config};
    use shoptag_sdk::objects::{ResourceId, TagSet};
    use shoptag_sdk::signature::{self, HMAC_HEADER, SHOP_DOMAIN_HEADER, TOPIC_HEADER};
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<RecordingTagStore>,
        reports: OutcomeReportReceiver,
        _shutdown: watch::Sender<bool>,
    }

    /// Full router over an in-memory store, with a live tag worker.
    fn app(mode: AckMode) -> TestApp {
        let store = Arc::new(RecordingTagStore::new());
        let merge = TagMergeClient::new(store.clone());
        let (job_tx, job_rx) = tag_job_channel();
        let (report_tx, reports) = outcome_report_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(TagWorker::new(merge.clone(), job_rx, report_tx.clone(), shutdown_rx).run());

        let pipeline = WebhookPipeline::new(&test_config(mode), merge, job_tx, report_tx);
        TestApp {
            router: build_router(AppState::new(pipeline)),
            store,
            reports,
            _shutdown: shutdown_tx,
        }
    }

    fn delivery(secret: &str, topic: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header(HMAC_HEADER, signature::sign(secret.as_bytes(), body.as_bytes()))
            .header(TOPIC_HEADER, topic)
            .header(SHOP_DOMAIN_HEADER, TEST_SHOP_DOMAIN)
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(AckMode::Async);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(send(&app.router, request).await, (StatusCode::OK, "OK".to_owned()));
    }

    #[tokio::test]
    async fn test_create_is_tagged_before_response_in_sync_mode() {
        let app = app(AckMode::Sync);
        app.store.seed(ResourceId(42), TagSet::parse("vip"));

        let (status, body) = send(
            &app.router,
            delivery(TEST_SECRET, "customers/create", r#"{"id":42,"email":"a@b.c"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "accepted");
        assert_eq!(app.store.write_count(), 1);
        assert_eq!(app.store.tags_of(ResourceId(42)), Some(TagSet::parse("vip, wholesale")));
    }

    #[tokio::test]
    async fn test_create_is_tagged_after_response_in_async_mode() {
        let mut app = app(AckMode::Async);

        let (status, _) = send(
            &app.router,
            delivery(TEST_SECRET, "customers/create", r#"{"id":42,"tags":""}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let report = app.reports.recv().await.unwrap();
        assert_eq!(report.outcome.kind, OutcomeKind::Tagged);
        assert_eq!(app.store.tags_of(ResourceId(42)), Some(TagSet::parse("wholesale")));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let app = app(AckMode::Sync);
        let (status, body) = send(
            &app.router,
            delivery("wrong", "customers/create", r#"{"id":42}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "unauthorized");
        assert_eq!(app.store.fetch_count() + app.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_signature_is_unauthorized() {
        let app = app(AckMode::Sync);
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(TOPIC_HEADER, "customers/create")
            .body(Body::from(r#"{"id":42}"#))
            .unwrap();

        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_is_verified_byte_exact() {
        let app = app(AckMode::Sync);
        let signed = r#"{"id":42}"#;
        let sent = r#"{ "id": 42 }"#;
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(HMAC_HEADER, signature::sign(TEST_SECRET.as_bytes(), signed.as_bytes()))
            .header(TOPIC_HEADER, "customers/create")
            .body(Body::from(sent))
            .unwrap();

        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_topic_is_ignored() {
        let app = app(AckMode::Sync);
        let (status, body) = send(
            &app.router,
            delivery(TEST_SECRET, "customers/update", r#"{"id":42}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ignored");
        assert_eq!(app.store.fetch_count() + app.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_already_tagged_makes_no_call() {
        let app = app(AckMode::Sync);
        let (status, _) = send(
            &app.router,
            delivery(
                TEST_SECRET,
                "customers/create",
                r#"{"id":42,"tags":"wholesale, vip"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.fetch_count() + app.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_still_ok() {
        let mut app = app(AckMode::Sync);
        app.store.fail_writes_with(StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(
            &app.router,
            delivery(TEST_SECRET, "customers/create", r#"{"id":42,"tags":"vip"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let report = app.reports.recv().await.unwrap();
        assert_eq!(report.outcome.kind, OutcomeKind::Failed);
        assert_eq!(
            report.outcome.status_code,
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app(AckMode::Sync);
        let (status, body) = send(
            &app.router,
            delivery(TEST_SECRET, "customers/create", "{\"id\":"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "malformed payload");
    }

    #[tokio::test]
    async fn test_oversized_body_is_bad_request() {
        let app = app(AckMode::Sync);
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(HMAC_HEADER, "irrelevant")
            .header(TOPIC_HEADER, "customers/create")
            .body(Body::from(vec![b' '; MAX_BODY_BYTES + 1]))
            .unwrap();

        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_shop_is_ignored() {
        let app = app(AckMode::Sync);
        let body = r#"{"id":42}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(HMAC_HEADER, signature::sign(TEST_SECRET.as_bytes(), body.as_bytes()))
            .header(TOPIC_HEADER, "customers/create")
            .header(SHOP_DOMAIN_HEADER, "elsewhere.myshopify.com")
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ignored");
        assert_eq!(app.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_get_webhook_is_not_routed() {
        let app = app(AckMode::Sync);
        let request = Request::builder().uri("/webhook").body(Body::empty()).unwrap();
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
