use http::Method;
use serde_json::{Value, json};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

/// Recurring payments on the checkout API.
#[derive(Clone, Copy, Debug)]
pub struct Subscriptions<'a> {
    client: &'a GatewayClient,
}

impl<'a> Subscriptions<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Sends `POST /api/subscription/{order_id}/cancel`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.subscriptions.cancel", skip_all, err)
    )]
    pub async fn cancel(&self, order_id: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "POST /api/subscription/{id}/cancel";
        let order_id = require_id(order_id, CONTEXT)?;
        let url = self
            .client
            .endpoint(Api::Checkout, &["api", "subscription", order_id, "cancel"], CONTEXT)?;
        self.client
            .send_json(Method::POST, url, CONTEXT, &json!({}))
            .await
    }
}
