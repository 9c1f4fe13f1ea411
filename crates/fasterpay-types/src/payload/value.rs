//! The request tree accepted by the encoder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Fields of a request object, ordered by key.
pub type RequestObject = BTreeMap<String, RequestValue>;

/// A node of a request body.
///
/// Mirrors the JSON data model with one extra leaf, [`RequestValue::Attachment`],
/// which may appear at any depth.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<RequestValue>),
    Object(RequestObject),
    Attachment(Attachment),
}

impl RequestValue {
    /// Builds an object node from key/value pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RequestValue>,
    {
        RequestValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Converts any serializable value. The result never contains attachments.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(RequestValue::from)
    }

    pub fn as_object(&self) -> Option<&RequestObject> {
        match self {
            RequestValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut RequestObject> {
        match self {
            RequestValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            RequestValue::Attachment(attachment) => Some(attachment),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RequestValue::Null)
    }
}

impl From<serde_json::Value> for RequestValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RequestValue::Null,
            Value::Bool(b) => RequestValue::Bool(b),
            Value::Number(n) => RequestValue::Number(n),
            Value::String(s) => RequestValue::String(s),
            Value::Array(items) => {
                RequestValue::Array(items.into_iter().map(RequestValue::from).collect())
            }
            Value::Object(map) => RequestValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, RequestValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for RequestValue {
    fn from(value: bool) -> Self {
        RequestValue::Bool(value)
    }
}

impl From<&str> for RequestValue {
    fn from(value: &str) -> Self {
        RequestValue::String(value.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(value: String) -> Self {
        RequestValue::String(value)
    }
}

impl From<i64> for RequestValue {
    fn from(value: i64) -> Self {
        RequestValue::Number(value.into())
    }
}

impl From<i32> for RequestValue {
    fn from(value: i32) -> Self {
        RequestValue::Number(value.into())
    }
}

impl From<u64> for RequestValue {
    fn from(value: u64) -> Self {
        RequestValue::Number(value.into())
    }
}

impl From<u32> for RequestValue {
    fn from(value: u32) -> Self {
        RequestValue::Number(value.into())
    }
}

/// Non-finite floats have no JSON representation and become [`RequestValue::Null`].
impl From<f64> for RequestValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(RequestValue::Number)
            .unwrap_or(RequestValue::Null)
    }
}

impl From<Attachment> for RequestValue {
    fn from(value: Attachment) -> Self {
        RequestValue::Attachment(value)
    }
}

impl From<RequestObject> for RequestValue {
    fn from(value: RequestObject) -> Self {
        RequestValue::Object(value)
    }
}

impl<T: Into<RequestValue>> From<Vec<T>> for RequestValue {
    fn from(value: Vec<T>) -> Self {
        RequestValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RequestValue>> From<Option<T>> for RequestValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RequestValue::Null)
    }
}

/// Binary content embedded in a request, such as a logo or a product image.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    content: Vec<u8>,
    file_name: Option<String>,
    media_type: Option<String>,
}

impl Attachment {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            file_name: None,
            media_type: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Decodes an RFC 2397 `data:` URI with base64 payload, e.g.
    /// `data:image/png;base64,iVBORw0KGgo=`.
    pub fn from_data_uri(uri: &str) -> Result<Self, AttachmentError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(AttachmentError::NotADataUri)?;
        let (meta, data) = rest.split_once(',').ok_or(AttachmentError::NotADataUri)?;
        let media_type = meta
            .strip_suffix(";base64")
            .ok_or(AttachmentError::NotBase64Encoded)?;
        let content = b64.decode(data.trim())?;
        let attachment = Attachment::new(content);
        Ok(if media_type.is_empty() {
            attachment
        } else {
            attachment.with_media_type(media_type)
        })
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Not a data URI")]
    NotADataUri,
    #[error("Data URI is not base64-encoded")]
    NotBase64Encoded,
    #[error("Invalid base64 content: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value_preserves_structure() {
        let value = RequestValue::from(json!({"a": [1, "x", null], "b": {"c": true}}));
        let expected = RequestValue::object([
            (
                "a",
                RequestValue::Array(vec![1i64.into(), "x".into(), RequestValue::Null]),
            ),
            ("b", RequestValue::object([("c", true)])),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(RequestValue::from(f64::NAN).is_null());
        assert_eq!(
            RequestValue::from(1.5),
            RequestValue::Number(serde_json::Number::from_f64(1.5).unwrap())
        );
    }

    #[test]
    fn test_data_uri() {
        let attachment = Attachment::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(attachment.content(), b"hello");
        assert_eq!(attachment.media_type(), Some("image/png"));
        assert_eq!(attachment.file_name(), None);

        let untyped = Attachment::from_data_uri("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(untyped.media_type(), None);

        assert!(matches!(
            Attachment::from_data_uri("https://cdn.example/logo.png"),
            Err(AttachmentError::NotADataUri)
        ));
        assert!(matches!(
            Attachment::from_data_uri("data:text/plain,hello"),
            Err(AttachmentError::NotBase64Encoded)
        ));
        assert!(matches!(
            Attachment::from_data_uri("data:image/png;base64,***"),
            Err(AttachmentError::Decode(_))
        ));
    }

    #[test]
    fn test_debug_hides_content() {
        let attachment = Attachment::new(vec![0xde, 0xad]).with_file_name("logo.png");
        let debug = format!("{attachment:?}");
        assert!(debug.contains("logo.png"));
        assert!(debug.contains("len: 2"));
        assert!(!debug.contains("222"));
    }
}
