//! E-invoices, invoice templates and invoice products.
//!
//! Create and update bodies may embed attachments (a template `logo`, a product
//! `image`, or either nested inside an invoice). They are given as a
//! [`RequestObject`] and sent as JSON or multipart depending on their content; see
//! [`fasterpay_types::payload`].

use http::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use fasterpay_types::payload::RequestObject;

use crate::client::{Api, GatewayClient, GatewayClientError, require_id};

const EINVOICES: [&str; 3] = ["api", "external", "einvoices"];

/// E-invoicing on the business API.
#[derive(Clone, Copy, Debug)]
pub struct EInvoices<'a> {
    client: &'a GatewayClient,
}

impl<'a> EInvoices<'a> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self { client }
    }

    /// `POST /api/external/einvoices`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.create", skip_all, err)
    )]
    pub async fn create(&self, invoice: &RequestObject) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "POST /api/external/einvoices";
        let url = self.url(&[], CONTEXT)?;
        self.client
            .send_object(Method::POST, url, CONTEXT, invoice)
            .await
    }

    /// `GET /api/external/einvoices/{id}`, with optional `include` style query.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.get", skip(self, query), err)
    )]
    pub async fn get<Q>(&self, invoice_id: &str, query: Option<&Q>) -> Result<Value, GatewayClientError>
    where
        Q: Serialize + ?Sized,
    {
        const CONTEXT: &str = "GET /api/external/einvoices/{id}";
        let invoice_id = require_id(invoice_id, CONTEXT)?;
        let url = self.url(&[invoice_id], CONTEXT)?;
        self.client.get_json(url, CONTEXT, query).await
    }

    /// `GET /api/external/einvoices`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.list", skip_all, err)
    )]
    pub async fn list<Q>(&self, filter: Option<&Q>) -> Result<Value, GatewayClientError>
    where
        Q: Serialize + ?Sized,
    {
        const CONTEXT: &str = "GET /api/external/einvoices";
        let url = self.url(&[], CONTEXT)?;
        self.client.get_json(url, CONTEXT, filter).await
    }

    /// `PUT /api/external/einvoices/{id}`
    ///
    /// Sent as `POST` with `_method: PUT` when the body carries attachments.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.update", skip(self, invoice), err)
    )]
    pub async fn update(
        &self,
        invoice_id: &str,
        invoice: &RequestObject,
    ) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "PUT /api/external/einvoices/{id}";
        let invoice_id = require_id(invoice_id, CONTEXT)?;
        let url = self.url(&[invoice_id], CONTEXT)?;
        self.client
            .send_object(Method::PUT, url, CONTEXT, invoice)
            .await
    }

    /// `DELETE /api/external/einvoices/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.delete", skip(self), err)
    )]
    pub async fn delete(&self, invoice_id: &str) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "DELETE /api/external/einvoices/{id}";
        let invoice_id = require_id(invoice_id, CONTEXT)?;
        let url = self.url(&[invoice_id], CONTEXT)?;
        self.client.delete(url, CONTEXT).await
    }

    /// `POST /api/external/einvoices/templates`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.create_template", skip_all, err)
    )]
    pub async fn create_template(
        &self,
        template: &RequestObject,
    ) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "POST /api/external/einvoices/templates";
        let url = self.url(&["templates"], CONTEXT)?;
        self.client
            .send_object(Method::POST, url, CONTEXT, template)
            .await
    }

    /// `PUT /api/external/einvoices/templates/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.update_template", skip(self, template), err)
    )]
    pub async fn update_template(
        &self,
        template_id: &str,
        template: &RequestObject,
    ) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "PUT /api/external/einvoices/templates/{id}";
        let template_id = require_id(template_id, CONTEXT)?;
        let url = self.url(&["templates", template_id], CONTEXT)?;
        self.client
            .send_object(Method::PUT, url, CONTEXT, template)
            .await
    }

    /// `POST /api/external/einvoices/products`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.create_product", skip_all, err)
    )]
    pub async fn create_product(&self, product: &RequestObject) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "POST /api/external/einvoices/products";
        let url = self.url(&["products"], CONTEXT)?;
        self.client
            .send_object(Method::POST, url, CONTEXT, product)
            .await
    }

    /// `PUT /api/external/einvoices/products/{id}`
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.einvoices.update_product", skip(self, product), err)
    )]
    pub async fn update_product(
        &self,
        product_id: &str,
        product: &RequestObject,
    ) -> Result<Value, GatewayClientError> {
        const CONTEXT: &str = "PUT /api/external/einvoices/products/{id}";
        let product_id = require_id(product_id, CONTEXT)?;
        let url = self.url(&["products", product_id], CONTEXT)?;
        self.client
            .send_object(Method::PUT, url, CONTEXT, product)
            .await
    }

    fn url(&self, tail: &[&str], context: &'static str) -> Result<Url, GatewayClientError> {
        let segments: Vec<&str> = EINVOICES.iter().chain(tail).copied().collect();
        self.client.endpoint(Api::Business, &segments, context)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::client_for;
    use fasterpay_types::payload::{Attachment, RequestObject, RequestValue};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn object(value: RequestValue) -> RequestObject {
        match value {
            RequestValue::Object(object) => object,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_without_attachments_is_json() {
        let server = MockServer::start().await;
        let invoice = json!({
            "contact_id": "C1",
            "currency": "USD",
            "items": [{"price": 1, "quantity": 2}]
        });
        Mock::given(method("POST"))
            .and(path("/api/external/einvoices"))
            .and(header("content-type", "application/json"))
            .and(body_json(invoice.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "I1"}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client
            .einvoices()
            .create(&object(RequestValue::from(invoice)))
            .await
            .unwrap();
        assert_eq!(response["data"]["id"], "I1");
    }

    #[tokio::test]
    async fn test_create_with_nested_image_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/external/einvoices"))
            .and(header("X-ApiKey", "priv"))
            .and(body_string_contains("name=\"data\""))
            .and(body_string_contains("\"image\":null"))
            .and(body_string_contains("name=\"items[1].product.image\""))
            .and(body_string_contains("SWORDPNG"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "I2"}})))
            .expect(1)
            .mount(&server)
            .await;

        let invoice = object(RequestValue::object([
            ("contact_id", RequestValue::from("C1")),
            ("currency", RequestValue::from("USD")),
            (
                "items",
                RequestValue::Array(vec![
                    RequestValue::object([("price", 1i64), ("quantity", 2i64)]),
                    RequestValue::object([
                        ("price", RequestValue::from(3i64)),
                        ("quantity", RequestValue::from(1i64)),
                        (
                            "product",
                            RequestValue::object([(
                                "image",
                                Attachment::new(b"SWORDPNG".to_vec())
                                    .with_file_name("sword.png")
                                    .with_media_type("image/png"),
                            )]),
                        ),
                    ]),
                ]),
            ),
        ]));

        let client = client_for(&server).await;
        let response = client.einvoices().create(&invoice).await.unwrap();
        assert_eq!(response["data"]["id"], "I2");
        assert!(!server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_template_with_logo_uses_method_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/external/einvoices/templates/T1"))
            .and(body_string_contains("\"_method\":\"PUT\""))
            .and(body_string_contains("name=\"logo\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let template = object(RequestValue::object([
            ("name", RequestValue::from("Default")),
            ("colors", RequestValue::object([("primary", "#2060f0")])),
            ("logo", Attachment::new(b"LOGO".to_vec()).into()),
        ]));

        let client = client_for(&server).await;
        let response = client
            .einvoices()
            .update_template("T1", &template)
            .await
            .unwrap();
        assert_eq!(response["success"], true);
    }

    #[tokio::test]
    async fn test_update_product_without_image_keeps_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/external/einvoices/products/PR1"))
            .and(body_json(json!({"name": "Golden Sword", "image": "https://cdn.example/sword.png"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let product = object(RequestValue::object([
            ("name", "Golden Sword"),
            ("image", "https://cdn.example/sword.png"),
        ]));

        let client = client_for(&server).await;
        let response = client
            .einvoices()
            .update_product("PR1", &product)
            .await
            .unwrap();
        assert_eq!(response["success"], true);
    }

    #[tokio::test]
    async fn test_get_list_delete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/external/einvoices/I1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "I1"}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/external/einvoices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/external/einvoices/I1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let einvoices = client.einvoices();
        assert_eq!(
            einvoices.get::<()>("I1", None).await.unwrap()["data"]["id"],
            "I1"
        );
        assert_eq!(einvoices.list::<()>(None).await.unwrap()["data"], json!([]));
        assert_eq!(einvoices.delete("I1").await.unwrap()["success"], true);
    }
}
