use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

/// Country-specific address forms on the business API.
#[derive(Clone, Copy, Debug)]
pub struct Address<'a> {
    client: &'a GatewayClient,
}

impl<'a> Address<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// `GET /api/external/address/fields/{country_code}`: the address fields
    /// required for an ISO 3166-1 alpha-2 country.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.address.fields", skip(self), err)
    )]
    pub async fn fields(&self, country_code: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "GET /api/external/address/fields/{country_code}";
        let country_code = require_id(country_code, CONTEXT)?;
        let url = self.client.endpoint(
            Api::Business,
            &["api", "external", "address", "fields", country_code],
            CONTEXT,
        )?;
        self.client.get_json::<()>(url, CONTEXT, None).await
    }
}
