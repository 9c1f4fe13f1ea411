use http::Method;
use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

/// Mass payouts on the business API.
#[derive(Clone, Copy, Debug)]
pub struct Payouts<'a> {
    client: &'a GatewayClient,
}

impl<'a> Payouts<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// `POST /api/external/payouts`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.payouts.create", skip_all, err)
    )]
    pub async fn create<T>(&self, payout: &T) -> Result<Value, GatewayClientError>
    where
        T: Serialize + ?Sized,
    {
        const CONTEXT: &str = "POST /api/external/payouts";
        let url = self
            .client
            .endpoint(Api::Business, &["api", "external", "payouts"], CONTEXT)?;
        self.client.send_json(Method::POST, url, CONTEXT, payout).await
    }

    /// `GET /api/external/payouts`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.payouts.list", skip_all, err)
    )]
    pub async fn list(&self) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "GET /api/external/payouts";
        let url = self
            .client
            .endpoint(Api::Business, &["api", "external", "payouts"], CONTEXT)?;
        self.client.get_json::<()>(url, CONTEXT, None).await
    }

    /// `GET /api/external/payouts/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.payouts.get", skip(self), err)
    )]
    pub async fn get(&self, payout_id: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "GET /api/external/payouts/{id}";
        let payout_id = require_id(payout_id, CONTEXT)?;
        let url = self.client.endpoint(
            Api::Business,
            &["api", "external", "payouts", payout_id],
            CONTEXT,
        )?;
        self.client.get_json::<()>(url, CONTEXT, None).await
    }
}
