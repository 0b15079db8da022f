//! HTTP surface.
//!
//! # Endpoints
//!
//! - `POST /webhook` – inbound webhook deliveries

use axum::{Router, routing::post};

use crate::state::AppState;

mod webhook;

/// Build the webhook API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(webhook::receive_webhook))
}
