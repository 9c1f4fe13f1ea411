//! HTTP endpoints of the pingback server.
//!
//! Only requests that pass [`PingbackLayer`] reach [`post_pingback`]; forged or
//! tampered notifications are answered by the layer with `401`/`400`/`413`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use fasterpay_axum::{PingbackLayer, VerifiedPingback};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::config::Config;

pub const HEALTH_PATH: &str = "/health";

/// The parts of a pingback this server looks at; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PingbackEvent {
    /// `payment`, `refund`, `subscription`, ...
    pub event: String,
    #[serde(default)]
    pub payment_order: Option<Value>,
    #[serde(default)]
    pub subscription: Option<Value>,
}

impl PingbackEvent {
    /// Id of the payment order the event refers to, if any.
    pub fn order_id(&self) -> Option<&Value> {
        self.payment_order.as_ref().and_then(|order| order.get("id"))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Builds the router: `POST {path}` behind [`PingbackLayer`] and `GET /health`.
pub fn routes(config: &Config) -> Router {
    let authenticate = PingbackLayer::new(config.gateway().credential().clone())
        .with_body_limit(config.body_limit());
    Router::new()
        .route(HEALTH_PATH, get(get_health))
        .route(config.path(), post(post_pingback).layer(authenticate))
        .layer(TraceLayer::new_for_http())
}

/// `GET /health`: liveness probe.
#[instrument(skip_all)]
pub async fn get_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST {path}`: an authenticated pingback.
///
/// Answers `ok` so the gateway stops retrying. A verified body that is not a pingback
/// event is a `400`.
#[instrument(skip_all, fields(scheme = %pingback.scheme()))]
pub async fn post_pingback(Extension(pingback): Extension<VerifiedPingback>) -> Response {
    match pingback.json::<PingbackEvent>() {
        Ok(event) => {
            tracing::info!(
                event = %event.event,
                order_id = ?event.order_id(),
                has_subscription = event.subscription.is_some(),
                "Pingback accepted"
            );
            (StatusCode::OK, "ok").into_response()
        }
        Err(error) => {
            tracing::warn!(error = %error, "Verified pingback is not a pingback event");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid pingback body".to_string(),
                }),
            )
                .into_response()
        }
    }
}
