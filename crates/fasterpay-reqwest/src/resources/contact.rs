use http::Method;
use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

/// Contacts (invoice recipients) on the business API.
#[derive(Clone, Copy, Debug)]
pub struct Contacts<'a> {
    client: &'a GatewayClient,
}

impl<'a> Contacts<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// `POST /api/external/contacts`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.contacts.create", skip_all, err)
    )]
    pub async fn create<T>(&self, contact: &T) -> Result<Value, GatewayClientError>
    where
        T: Serialize + ?Sized,
    {
        const CONTEXT: &str = "POST /api/external/contacts";
        let url = self
            .client
            .endpoint(Api::Business, &["api", "external", "contacts"], CONTEXT)?;
        self.client.send_json(Method::POST, url, CONTEXT, contact).await
    }

    /// `GET /api/external/contacts`, with `filter` (e.g. `prefix`, `page`, `per_page`)
    /// as query string.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.contacts.list", skip_all, err)
    )]
    pub async fn list<Q>(&self, filter: Option<&Q>) -> Result<Value, GatewayClientError>
    where
        Q: Serialize + ?Sized,
    {
        const CONTEXT: &str = "GET /api/external/contacts";
        let url = self
            .client
            .endpoint(Api::Business, &["api", "external", "contacts"], CONTEXT)?;
        self.client.get_json(url, CONTEXT, filter).await
    }

    /// `GET /api/external/contacts/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.contacts.get", skip(self), err)
    )]
    pub async fn get(&self, contact_id: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "GET /api/external/contacts/{id}";
        let url = self.contact_url(contact_id, CONTEXT)?;
        self.client.get_json::<()>(url, CONTEXT, None).await
    }

    /// `PUT /api/external/contacts/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.contacts.update", skip(self, contact), err)
    )]
    pub async fn update<T>(&self, contact_id: &str, contact: &T) -> Result<Value, GatewayClientError>
    where
        T: Serialize + ?Sized,
    {
        const CONTEXT: &str = "PUT /api/external/contacts/{id}";
        let url = self.contact_url(contact_id, CONTEXT)?;
        self.client.send_json(Method::PUT, url, CONTEXT, contact).await
    }

    /// `DELETE /api/external/contacts/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.contacts.delete", skip(self), err)
    )]
    pub async fn delete(&self, contact_id: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "DELETE /api/external/contacts/{id}";
        let url = self.contact_url(contact_id, CONTEXT)?;
        self.client.delete(url, CONTEXT).await
    }

    fn contact_url(
        &self,
        contact_id: &str,
        context: &'static str,
    ) -> Result<url::Url, GatewayClientError> {
        let contact_id = require_id(contact_id, context)?;
        self.client
            .endpoint(Api::Business, &["api", "external", "contacts", contact_id], context)
    }
}
