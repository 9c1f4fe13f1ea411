//! Axum middleware that only lets authentic FasterPay pingbacks through.
//!
//! The request body is buffered, checked with [`Pingback::verify`], and handed to the
//! wrapped handler unchanged. The handler additionally finds a [`VerifiedPingback`]
//! in the request extensions.
//!
//! | Outcome | Response |
//! |---------|----------|
//! | Body larger than the limit, or unreadable | `413 Payload Too Large` |
//! | Unknown `X-Fasterpay-Signature-Version` | `400 Bad Request` |
//! | Missing or wrong signature / API key | `401 Unauthorized` |
//! | Authentic | response of the wrapped handler |
//!
//! ## Example Usage
//!
//! ```rust
//! use axum::{Extension, Router, routing::post};
//! use fasterpay_axum::{PingbackLayer, VerifiedPingback};
//! use fasterpay_types::config::Credential;
//! use std::sync::Arc;
//!
//! let credential = Arc::new(Credential::new("<private key>", "<public key>"));
//!
//! let app: Router = Router::new().route(
//!     "/pingback",
//!     post(on_pingback).layer(PingbackLayer::new(credential)),
//! );
//!
//! async fn on_pingback(Extension(pingback): Extension<VerifiedPingback>) -> &'static str {
//!     let _event: Result<serde_json::Value, _> = pingback.json();
//!     "ok"
//! }
//! ```

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use fasterpay_types::config::Credential;
use fasterpay_types::pingback::Pingback;
use fasterpay_types::signature::SigningScheme;
use http::StatusCode;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Default cap on buffered pingback bodies (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// A pingback that passed verification, available as a request extension.
#[derive(Clone, Debug)]
pub struct VerifiedPingback {
    scheme: SigningScheme,
    body: Bytes,
}

impl VerifiedPingback {
    /// Scheme the pingback was authenticated with.
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// The raw body, exactly as signed.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Layer that authenticates pingbacks before the wrapped service sees them.
#[derive(Clone, Debug)]
pub struct PingbackLayer {
    pingback: Arc<Pingback>,
    body_limit: usize,
}

impl PingbackLayer {
    pub fn new(credential: Arc<Credential>) -> Self {
        Self::from_pingback(Pingback::new(credential))
    }

    pub fn from_pingback(pingback: Pingback) -> Self {
        Self {
            pingback: Arc::new(pingback),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the largest body, in bytes, that is buffered for verification.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

impl<S> Layer<S> for PingbackLayer
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = PingbackService;

    fn layer(&self, inner: S) -> Self::Service {
        PingbackService {
            pingback: self.pingback.clone(),
            body_limit: self.body_limit,
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service produced by [`PingbackLayer`].
#[derive(Clone, Debug)]
pub struct PingbackService {
    pingback: Arc<Pingback>,
    body_limit: usize,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl Service<Request> for PingbackService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    /// Delegates readiness polling to the wrapped inner service.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Drive the clone that was polled ready; leave a fresh one behind.
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);
        Box::pin(authenticate(
            self.pingback.clone(),
            self.body_limit,
            inner,
            req,
        ))
    }
}

#[cfg_attr(
    feature = "telemetry",
    instrument(name = "fasterpay.pingback.handle", skip_all)
)]
async fn authenticate(
    pingback: Arc<Pingback>,
    body_limit: usize,
    mut inner: BoxCloneSyncService<Request, Response, Infallible>,
    req: Request,
) -> Result<Response, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, body_limit).await {
        Ok(body) => body,
        Err(_err) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %_err, body_limit, "Pingback body rejected");
            return Ok(reject(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Pingback body too large or unreadable",
            ));
        }
    };

    let scheme = match pingback.verify(&body, &parts.headers) {
        Ok(true) => Pingback::scheme(&parts.headers).unwrap_or_default(),
        Ok(false) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!("Pingback failed verification");
            return Ok(reject(StatusCode::UNAUTHORIZED, "Invalid pingback signature"));
        }
        Err(err) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %err, "Pingback uses an unsupported signature version");
            return Ok(reject(StatusCode::BAD_REQUEST, &err.to_string()));
        }
    };

    let mut req = Request::from_parts(parts, Body::from(body.clone()));
    req.extensions_mut().insert(VerifiedPingback { scheme, body });
    inner.call(req).await
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Extension, Router};
    use fasterpay_types::pingback::{API_KEY_HEADER, SIGNATURE_HEADER, SIGNATURE_VERSION_HEADER};
    use tower::ServiceExt;

    const BODY: &str = r#"{"event":"payment","payment_order":{"id":1}}"#;
    const BODY_DIGEST: &str = "f7e032e9c8524ddefd06c7881900135c5d689cc2b0509b5ed63d17b2c424a40a";

    async fn echo(Extension(pingback): Extension<VerifiedPingback>, body: Bytes) -> String {
        let event: serde_json::Value = pingback.json().unwrap();
        assert_eq!(pingback.body(), &body);
        format!("{}:{}", pingback.scheme(), event["event"].as_str().unwrap_or_default())
    }

    fn app(layer: PingbackLayer) -> Router {
        Router::new().route("/pingback", post(echo).layer(layer))
    }

    fn layer() -> PingbackLayer {
        PingbackLayer::new(Arc::new(Credential::new("priv", "pub")))
    }

    fn request(headers: &[(&str, &str)], body: &str) -> Request {
        let mut builder = http::Request::builder().method("POST").uri("/pingback");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_keyed_pingback_reaches_handler() {
        let response = app(layer())
            .oneshot(request(
                &[
                    (SIGNATURE_VERSION_HEADER, "v2"),
                    (SIGNATURE_HEADER, BODY_DIGEST),
                ],
                BODY,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "v2:payment");
    }

    #[tokio::test]
    async fn test_legacy_pingback_reaches_handler() {
        let response = app(layer())
            .oneshot(request(&[(API_KEY_HEADER, "priv")], BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "v1:payment");
    }

    #[tokio::test]
    async fn test_tampered_body_is_unauthorized() {
        let tampered = BODY.replace("payment_order", "payment_ordeR");
        let response = app(layer())
            .oneshot(request(
                &[
                    (SIGNATURE_VERSION_HEADER, "v2"),
                    (SIGNATURE_HEADER, BODY_DIGEST),
                ],
                &tampered,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unsigned_request_is_unauthorized() {
        let response = app(layer())
            .oneshot(request(&[("content-type", "application/json")], BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_version_is_bad_request() {
        let response = app(layer())
            .oneshot(request(
                &[
                    (SIGNATURE_VERSION_HEADER, "v3"),
                    (SIGNATURE_HEADER, BODY_DIGEST),
                ],
                BODY,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(text(response).await.contains("v3"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let response = app(layer().with_body_limit(8))
            .oneshot(request(
                &[
                    (SIGNATURE_VERSION_HEADER, "v2"),
                    (SIGNATURE_HEADER, BODY_DIGEST),
                ],
                BODY,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_default_body_limit() {
        assert_eq!(layer().body_limit(), DEFAULT_BODY_LIMIT);
    }
}
