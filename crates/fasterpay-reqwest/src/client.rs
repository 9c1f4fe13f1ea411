//! HTTP transport for the FasterPay checkout and business APIs.
//!
//! [`GatewayClient`] sends every request with the `X-ApiKey` header and returns the
//! parsed JSON response. Request bodies are either plain JSON or, for mutations that
//! carry attachments, the multipart encoding produced by
//! [`fasterpay_types::payload::encode_for`].
//!
//! ## Error Handling
//!
//! [`GatewayClientError`] captures the failing step with a static context string
//! such as `"POST /api/external/contacts"`:
//! - URL construction
//! - HTTP transport failures
//! - JSON deserialization errors
//! - Unexpected HTTP status responses, with the response body
//! - Invalid request arguments, caught before anything is sent

use fasterpay_types::config::GatewayConfig;
use fasterpay_types::payload::{EncodedPayload, RequestObject, encode_for};
use fasterpay_types::pingback::API_KEY_HEADER;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::Span;

use crate::multipart::hybrid_form;
use crate::resources::{Address, Contacts, EInvoices, Payouts, Subscriptions, Transactions};

/// Errors that can occur while talking to the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Private key is not a valid header value: {source}")]
    InvalidApiKey {
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build multipart body: {context}: {source}")]
    Multipart {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Missing identifier: {context}")]
    MissingIdentifier { context: &'static str },
    #[error("Amount must be non-negative, got {amount}")]
    NegativeAmount { amount: Decimal },
}

/// Which of the two gateway APIs an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Api {
    /// `pay.*`: subscriptions, refunds, deliveries.
    Checkout,
    /// `business.*`: contacts, payouts, e-invoices.
    Business,
}

/// A client for the FasterPay REST APIs.
///
/// Cheap to clone. Resource groups are reached through accessors such as
/// [`GatewayClient::contacts`].
#[derive(Clone, Debug)]
pub struct GatewayClient {
    /// Base URL of the checkout API (e.g. `https://pay.fasterpay.com/`)
    api_url: Url,
    /// Base URL of the business API (e.g. `https://business.fasterpay.com/`)
    business_api_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Headers sent with each request, including `X-ApiKey`
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl GatewayClient {
    /// Constructs a client for the endpoints and credential of `config`.
    pub fn try_new(config: &GatewayConfig) -> Result<Self, GatewayClientError> {
        let mut api_key = HeaderValue::from_str(config.credential().private_key())
            .map_err(|source| GatewayClientError::InvalidApiKey { source })?;
        api_key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-apikey"), api_key);
        Ok(Self {
            api_url: config.api_url().clone(),
            business_api_url: config.business_api_url().clone(),
            client: Client::new(),
            headers,
            timeout: None,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn business_api_url(&self) -> &Url {
        &self.business_api_url
    }

    /// Returns the headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    pub fn timeout(&self) -> &Option<Duration> {
        &self.timeout
    }

    /// Adds custom headers to all future requests. `X-ApiKey` cannot be removed.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut this = self.clone();
        for (key, value) in headers.iter() {
            if key.as_str().eq_ignore_ascii_case(API_KEY_HEADER) {
                continue;
            }
            this.headers.insert(key.clone(), value.clone());
        }
        this
    }

    /// Sets a timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Uses a preconfigured [`reqwest::Client`], e.g. one with a proxy.
    pub fn with_client(&self, client: Client) -> Self {
        let mut this = self.clone();
        this.client = client;
        this
    }

    pub fn subscriptions(&self) -> Subscriptions<'_> {
        Subscriptions::new(self)
    }

    pub fn transactions(&self) -> Transactions<'_> {
        Transactions::new(self)
    }

    pub fn contacts(&self) -> Contacts<'_> {
        Contacts::new(self)
    }

    pub fn address(&self) -> Address<'_> {
        Address::new(self)
    }

    pub fn payouts(&self) -> Payouts<'_> {
        Payouts::new(self)
    }

    pub fn einvoices(&self) -> EInvoices<'_> {
        EInvoices::new(self)
    }

    /// Appends path `segments` to the base URL of `api`, percent-encoding each one.
    pub(crate) fn endpoint(
        &self,
        api: Api,
        segments: &[&str],
        context: &'static str,
    ) -> Result<Url, GatewayClientError> {
        let mut url = match api {
            Api::Checkout => self.api_url.clone(),
            Api::Business => self.business_api_url.clone(),
        };
        url.path_segments_mut()
            .map_err(|_| GatewayClientError::UrlParse {
                context,
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends `body` as JSON with `method`.
    pub(crate) async fn send_json<T>(
        &self,
        method: Method,
        url: Url,
        context: &'static str,
        body: &T,
    ) -> Result<Value, GatewayClientError>
    where
        T: serde::Serialize + ?Sized,
    {
        let req = self.client.request(method, url).json(body);
        self.execute(req, context).await
    }

    /// Sends a `GET`, with `query` serialized into the query string if present.
    pub(crate) async fn get_json<Q>(
        &self,
        url: Url,
        context: &'static str,
        query: Option<&Q>,
    ) -> Result<Value, GatewayClientError>
    where
        Q: serde::Serialize + ?Sized,
    {
        let mut req = self.client.get(url);
        if let Some(query) = query {
            req = req.query(query);
        }
        self.execute(req, context).await
    }

    pub(crate) async fn delete(
        &self,
        url: Url,
        context: &'static str,
    ) -> Result<Value, GatewayClientError> {
        let req = self.client.delete(url);
        self.execute(req, context).await
    }

    /// Encodes `object` for `method` and sends it as JSON or multipart accordingly.
    pub(crate) async fn send_object(
        &self,
        method: Method,
        url: Url,
        context: &'static str,
        object: &RequestObject,
    ) -> Result<Value, GatewayClientError> {
        let payload = encode_for(object, &method);
        let req = self.client.request(payload.wire_method(method), url);
        let req = match payload {
            EncodedPayload::Json(body) => req.json(&body),
            EncodedPayload::Hybrid(hybrid) => req.multipart(hybrid_form(hybrid)?),
        };
        self.execute(req, context).await
    }

    /// Applies headers and timeout, sends, and maps the response.
    ///
    /// Any 2xx status is a success; an empty success body is returned as `null`.
    async fn execute(
        &self,
        mut req: RequestBuilder,
        context: &'static str,
    ) -> Result<Value, GatewayClientError> {
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| GatewayClientError::Http { context, source: e })?;

        let status = http_response.status();
        let body = http_response
            .bytes()
            .await
            .map_err(|e| GatewayClientError::ResponseBodyRead { context, source: e })?;

        let result = if status.is_success() {
            if body.is_empty() {
                Ok(Value::Null)
            } else {
                serde_json::from_slice(&body)
                    .map_err(|e| GatewayClientError::JsonDeserialization { context, source: e })
            }
        } else {
            Err(GatewayClientError::HttpStatus {
                context,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        };

        record_result_on_span(&result);

        result
    }
}

impl TryFrom<&GatewayConfig> for GatewayClient {
    type Error = GatewayClientError;

    fn try_from(config: &GatewayConfig) -> Result<Self, Self::Error> {
        GatewayClient::try_new(config)
    }
}

/// Rejects blank path identifiers before they collapse an endpoint path.
pub(crate) fn require_id<'a>(
    id: &'a str,
    context: &'static str,
) -> Result<&'a str, GatewayClientError> {
    if id.trim().is_empty() {
        Err(GatewayClientError::MissingIdentifier { context })
    } else {
        Ok(id)
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to gateway failed");
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
