//! Depth-first traversal that moves attachments out of a request tree.

use serde_json::{Map, Value};

use super::path::{FieldPath, PathSegment};
use super::value::{Attachment, RequestObject, RequestValue};

/// An attachment removed from the tree, with the location it was removed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    pub path: FieldPath,
    pub attachment: Attachment,
}

impl AttachmentPart {
    /// Multipart part name.
    pub fn name(&self) -> String {
        self.path.to_string()
    }
}

/// Replaces every attachment with `null`, collecting it in visit order.
#[derive(Default)]
pub(super) struct Extractor {
    path: Vec<PathSegment>,
    parts: Vec<AttachmentPart>,
}

impl Extractor {
    pub fn extract(mut self, object: &RequestObject) -> (Value, Vec<AttachmentPart>) {
        let structure = Value::Object(self.visit_object(object));
        (structure, self.parts)
    }

    fn visit_object(&mut self, object: &RequestObject) -> Map<String, Value> {
        object
            .iter()
            .map(|(key, value)| {
                let value = self.descend(PathSegment::Key(key.clone()), value);
                (key.clone(), value)
            })
            .collect()
    }

    fn descend(&mut self, segment: PathSegment, value: &RequestValue) -> Value {
        self.path.push(segment);
        let value = self.visit(value);
        self.path.pop();
        value
    }

    fn visit(&mut self, value: &RequestValue) -> Value {
        match value {
            RequestValue::Null => Value::Null,
            RequestValue::Bool(b) => Value::Bool(*b),
            RequestValue::Number(n) => Value::Number(n.clone()),
            RequestValue::String(s) => Value::String(s.clone()),
            RequestValue::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.descend(PathSegment::Index(index), item))
                    .collect(),
            ),
            RequestValue::Object(object) => Value::Object(self.visit_object(object)),
            RequestValue::Attachment(attachment) => {
                self.parts.push(AttachmentPart {
                    path: FieldPath::new(self.path.clone()),
                    attachment: attachment.clone(),
                });
                Value::Null
            }
        }
    }
}

/// Puts `attachment` back at `path`. Paths that no longer resolve are ignored.
pub(super) fn overlay(root: &mut RequestValue, path: &FieldPath, attachment: Attachment) {
    let mut node = root;
    for segment in path.segments() {
        let next = match (segment, node) {
            (PathSegment::Key(key), RequestValue::Object(object)) => object.get_mut(key),
            (PathSegment::Index(index), RequestValue::Array(items)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(child) => node = child,
            None => return,
        }
    }
    *node = RequestValue::Attachment(attachment);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_in_key_order_and_nulls_slots() {
        let object = RequestObject::from([
            ("z".to_string(), Attachment::new(b"z".to_vec()).into()),
            ("a".to_string(), Attachment::new(b"a".to_vec()).into()),
            ("m".to_string(), "plain".into()),
        ]);
        let (structure, parts) = Extractor::default().extract(&object);
        assert_eq!(structure, serde_json::json!({"a": null, "m": "plain", "z": null}));
        let names: Vec<String> = parts.iter().map(AttachmentPart::name).collect();
        assert_eq!(names, vec!["a", "z"]);
    }

    #[test]
    fn test_overlay_ignores_unresolvable_path() {
        let mut root = RequestValue::object([("a", 1i64)]);
        let before = root.clone();
        let path = FieldPath::new(vec![PathSegment::Key("missing".to_string())]);
        overlay(&mut root, &path, Attachment::new(vec![1]));
        assert_eq!(root, before);
    }
}
