use http::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

#[derive(Serialize)]
struct RefundRequest {
    amount: Decimal,
}

/// Refunds and delivery confirmations on the checkout API.
#[derive(Clone, Copy, Debug)]
pub struct Transactions<'a> {
    client: &'a GatewayClient,
}

impl<'a> Transactions<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// Sends `POST /payment/{order_id}/refund`. A zero amount is accepted.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.transactions.refund", skip(self), err)
    )]
    pub async fn refund(&self, order_id: &str, amount: Decimal) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "POST /payment/{id}/refund";
        let order_id = require_id(order_id, CONTEXT)?;
        if amount < Decimal::ZERO {
            return Err(GatewayClientError::NegativeAmount { amount });
        }
        let url = self
            .client
            .endpoint(Api::Checkout, &["payment", order_id, "refund"], CONTEXT)?;
        self.client
            .send_json(Method::POST, url, CONTEXT, &RefundRequest { amount })
            .await
    }

    /// Confirms delivery of purchased goods: `POST /api/v1/deliveries`.
    ///
    /// `delivery` typically carries `payment_order_id`, `merchant_order_id`, `type`,
    /// `status` and `public_key`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.transactions.deliver", skip_all, err)
    )]
    pub async fn deliver<T>(&self, delivery: &T) -> Result<Value, GatewayClientError>
    where
        T: Serialize + ?Sized,
    {
        const CONTEXT: &str = "POST /api/v1/deliveries";
        let url = self
            .client
            .endpoint(Api::Checkout, &["api", "v1", "deliveries"], CONTEXT)?;
        self.client.send_json(Method::POST, url, CONTEXT, delivery).await
    }
}
