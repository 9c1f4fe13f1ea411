//! Wire form of hybrid payloads.

use fasterpay_types::payload::{HybridPayload, SIDE_CHANNEL_FIELD};
use reqwest::multipart::{Form, Part};

use crate::client::GatewayClientError;

/// Builds the `multipart/form-data` body of `payload`.
///
/// The side channel goes first, followed by one part per attachment named by its
/// field path. Attachments without a file name are sent with the part name as
/// file name, so the gateway treats them as uploads.
pub fn hybrid_form(payload: HybridPayload) -> Result<Form, GatewayClientError> {
    let mut form = Form::new().text(SIDE_CHANNEL_FIELD, payload.side_channel());
    for part in payload.into_parts() {
        let name = part.name();
        let file_name = part
            .attachment
            .file_name()
            .map(str::to_owned)
            .unwrap_or_else(|| name.clone());
        let media_type = part.attachment.media_type().map(str::to_owned);
        let mut body = Part::bytes(part.attachment.into_content()).file_name(file_name);
        if let Some(media_type) = media_type {
            body = body
                .mime_str(&media_type)
                .map_err(|e| GatewayClientError::Multipart {
                    context: "Invalid attachment media type",
                    source: e,
                })?;
        }
        form = form.part(name, body);
    }
    Ok(form)
}
