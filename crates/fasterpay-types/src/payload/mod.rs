//! Adaptive encoding of request bodies that may embed binary attachments.
//!
//! Mutation endpoints (e-invoices, templates, products) accept nested request
//! objects in which files such as logos or product images may sit at any depth.
//! [`encode`] inspects the tree and picks the body shape:
//!
//! - No attachments: [`EncodedPayload::Json`], sent as `application/json`.
//! - One or more: [`EncodedPayload::Hybrid`], sent as `multipart/form-data` with
//!   the attachment-free structure serialized once into the [`SIDE_CHANNEL_FIELD`]
//!   part and one part per attachment, named by its [`FieldPath`].
//!
//! ```
//! use fasterpay_types::payload::{Attachment, RequestValue, encode};
//!
//! let RequestValue::Object(invoice) = RequestValue::object([
//!     ("currency", RequestValue::from("USD")),
//!     ("logo", Attachment::new(b"\x89PNG".to_vec()).into()),
//! ]) else { unreachable!() };
//!
//! let encoded = encode(&invoice);
//! assert!(encoded.is_hybrid());
//! assert_eq!(encoded.parts()[0].name(), "logo");
//! ```

mod encoder;
mod path;
mod value;

pub use encoder::AttachmentPart;
pub use path::{FieldPath, PathSegment};
pub use value::{Attachment, AttachmentError, RequestObject, RequestValue};

use http::Method;
use serde_json::Value;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use encoder::{Extractor, overlay};

/// Multipart field carrying the JSON structure of a hybrid body.
pub const SIDE_CHANNEL_FIELD: &str = "data";

/// Side-channel key stating the intended method of a hybrid update request.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

pub const JSON_CONTENT_TYPE: &str = "application/json";

pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// A body with attachments moved out into separate parts.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridPayload {
    structure: Value,
    parts: Vec<AttachmentPart>,
    method_override: Option<Method>,
}

impl HybridPayload {
    /// The request structure with every attachment replaced by `null`.
    pub fn structure(&self) -> &Value {
        &self.structure
    }

    pub fn parts(&self) -> &[AttachmentPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<AttachmentPart> {
        self.parts
    }

    /// The method the endpoint should apply, when it is not `POST`.
    pub fn method_override(&self) -> Option<&Method> {
        self.method_override.as_ref()
    }

    /// Hybrid bodies always travel as `POST`; see [`HybridPayload::method_override`].
    pub fn wire_method(&self) -> Method {
        Method::POST
    }

    /// JSON text of the [`SIDE_CHANNEL_FIELD`] part, including [`METHOD_OVERRIDE_FIELD`]
    /// when an override is set.
    pub fn side_channel(&self) -> String {
        match (&self.method_override, &self.structure) {
            (Some(method), Value::Object(map)) => {
                let mut map = map.clone();
                map.insert(
                    METHOD_OVERRIDE_FIELD.to_string(),
                    Value::String(method.as_str().to_string()),
                );
                Value::Object(map).to_string()
            }
            _ => self.structure.to_string(),
        }
    }
}

/// Outcome of [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedPayload {
    Json(Value),
    Hybrid(HybridPayload),
}

impl EncodedPayload {
    pub fn is_hybrid(&self) -> bool {
        matches!(self, EncodedPayload::Hybrid(_))
    }

    /// Extracted attachments; always empty for [`EncodedPayload::Json`].
    pub fn parts(&self) -> &[AttachmentPart] {
        match self {
            EncodedPayload::Json(_) => &[],
            EncodedPayload::Hybrid(hybrid) => hybrid.parts(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            EncodedPayload::Json(_) => JSON_CONTENT_TYPE,
            EncodedPayload::Hybrid(_) => MULTIPART_CONTENT_TYPE,
        }
    }

    /// Method to put on the wire for a request that means `intended`.
    pub fn wire_method(&self, intended: Method) -> Method {
        match self {
            EncodedPayload::Json(_) => intended,
            EncodedPayload::Hybrid(hybrid) => hybrid.wire_method(),
        }
    }

    /// Rebuilds the request tree by putting each attachment back at its path.
    pub fn reconstruct(&self) -> RequestValue {
        match self {
            EncodedPayload::Json(structure) => RequestValue::from(structure.clone()),
            EncodedPayload::Hybrid(hybrid) => {
                let mut root = RequestValue::from(hybrid.structure.clone());
                for part in &hybrid.parts {
                    overlay(&mut root, &part.path, part.attachment.clone());
                }
                root
            }
        }
    }
}

/// Encodes a create-style request body. Never injects a method override.
pub fn encode(object: &RequestObject) -> EncodedPayload {
    encode_for(object, &Method::POST)
}

/// Encodes a request body that is semantically sent with `method`.
///
/// For hybrid bodies a non-`POST` method is carried as [`METHOD_OVERRIDE_FIELD`]
/// inside the side channel. JSON bodies are left untouched.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "fasterpay.payload.encode", skip_all, fields(method = %method))
)]
pub fn encode_for(object: &RequestObject, method: &Method) -> EncodedPayload {
    let (structure, parts) = Extractor::default().extract(object);
    if parts.is_empty() {
        return EncodedPayload::Json(structure);
    }

    #[cfg(feature = "telemetry")]
    tracing::debug!(attachments = parts.len(), "Encoding hybrid body");

    let method_override = (method != Method::POST).then(|| method.clone());
    EncodedPayload::Hybrid(HybridPayload {
        structure,
        parts,
        method_override,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: RequestValue) -> RequestObject {
        match value {
            RequestValue::Object(object) => object,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn invoice_with_product_image() -> RequestObject {
        object(RequestValue::object([
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
                                Attachment::new(b"\x89PNG\r\n".to_vec())
                                    .with_file_name("sword.png")
                                    .with_media_type("image/png"),
                            )]),
                        ),
                    ]),
                ]),
            ),
        ]))
    }

    #[test]
    fn test_end_to_end_nested_item_image() {
        let encoded = encode(&invoice_with_product_image());
        let EncodedPayload::Hybrid(hybrid) = &encoded else {
            panic!("expected hybrid payload");
        };

        assert_eq!(
            hybrid.structure(),
            &json!({
                "contact_id": "C1",
                "currency": "USD",
                "items": [
                    {"price": 1, "quantity": 2},
                    {"price": 3, "quantity": 1, "product": {"image": null}}
                ]
            })
        );
        assert_eq!(hybrid.parts().len(), 1);
        let part = &hybrid.parts()[0];
        assert_eq!(part.name(), "items[1].product.image");
        assert_eq!(part.attachment.content(), b"\x89PNG\r\n");
        assert_eq!(part.attachment.file_name(), Some("sword.png"));

        let side_channel: Value = serde_json::from_str(&hybrid.side_channel()).unwrap();
        assert_eq!(side_channel["items"][1]["product"]["image"], Value::Null);
        assert!(side_channel.get(METHOD_OVERRIDE_FIELD).is_none());
        assert_eq!(encoded.content_type(), MULTIPART_CONTENT_TYPE);
    }

    #[test]
    fn test_without_attachments_is_plain_json() {
        let request = object(RequestValue::from(json!({
            "first_name": "Jon",
            "tags": ["a", "b"],
            "address": {"country": "US"}
        })));
        let encoded = encode_for(&request, &Method::PUT);
        assert_eq!(
            encoded,
            EncodedPayload::Json(json!({
                "first_name": "Jon",
                "tags": ["a", "b"],
                "address": {"country": "US"}
            }))
        );
        assert!(encoded.parts().is_empty());
        assert_eq!(encoded.content_type(), JSON_CONTENT_TYPE);
        assert_eq!(encoded.wire_method(Method::PUT), Method::PUT);
    }

    #[test]
    fn test_one_part_per_attachment() {
        let request = object(RequestValue::object([
            ("logo", RequestValue::from(Attachment::new(vec![1]))),
            (
                "gallery",
                RequestValue::from(vec![
                    Attachment::new(vec![2]),
                    Attachment::new(vec![3]),
                ]),
            ),
            (
                "matrix",
                RequestValue::Array(vec![RequestValue::Array(vec![
                    RequestValue::Null,
                    Attachment::new(vec![4]).into(),
                ])]),
            ),
        ]));
        let encoded = encode(&request);
        let names: Vec<String> = encoded.parts().iter().map(AttachmentPart::name).collect();
        assert_eq!(names, vec!["gallery[0]", "gallery[1]", "logo", "matrix[0][1]"]);
    }

    #[test]
    fn test_logo_url_string_stays_in_body() {
        let request = object(RequestValue::object([
            ("logo", "https://cdn.example/logo.png"),
            ("name", "Acme"),
        ]));
        assert_eq!(
            encode(&request),
            EncodedPayload::Json(json!({
                "logo": "https://cdn.example/logo.png",
                "name": "Acme"
            }))
        );
    }

    #[test]
    fn test_update_override_only_in_hybrid_side_channel() {
        let request = object(RequestValue::object([
            ("name", RequestValue::from("Template")),
            ("logo", Attachment::new(vec![9]).into()),
        ]));
        let encoded = encode_for(&request, &Method::PUT);
        let EncodedPayload::Hybrid(hybrid) = &encoded else {
            panic!("expected hybrid payload");
        };
        assert_eq!(hybrid.method_override(), Some(&Method::PUT));
        assert_eq!(encoded.wire_method(Method::PUT), Method::POST);

        let side_channel: Value = serde_json::from_str(&hybrid.side_channel()).unwrap();
        assert_eq!(side_channel[METHOD_OVERRIDE_FIELD], "PUT");
        assert_eq!(side_channel["name"], "Template");
        // The stored structure itself is unchanged.
        assert!(hybrid.structure().get(METHOD_OVERRIDE_FIELD).is_none());
    }

    #[test]
    fn test_reconstruct_restores_original() {
        let original = invoice_with_product_image();
        let encoded = encode_for(&original, &Method::PATCH);
        assert_eq!(encoded.reconstruct(), RequestValue::Object(original));

        let plain = object(RequestValue::object([("a", 1i64)]));
        assert_eq!(encode(&plain).reconstruct(), RequestValue::Object(plain));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let request = invoice_with_product_image();
        assert_eq!(encode(&request), encode(&request));
    }
}
