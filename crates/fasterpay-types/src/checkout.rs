//! Signed checkout form that redirects a customer to the hosted payment page.
//!
//! The merchant's server renders the form; the customer's browser posts it to
//! `{api_url}/payment/form`. The gateway recomputes the digest carried in
//! [`FORM_HASH_FIELD`] with the scheme declared in [`SIGN_VERSION_FIELD`] and
//! refuses the payment on mismatch.

use std::fmt::Write;
use std::sync::Arc;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::canonical::ParameterSet;
use crate::config::Credential;
use crate::signature::{FORM_HASH_FIELD, SIGN_VERSION_FIELD, Signer, SigningScheme, UnsupportedScheme};

/// Form field carrying the merchant's public key.
pub const API_KEY_FIELD: &str = "api_key";

/// Path of the hosted payment page, relative to the checkout API base URL.
pub const PAYMENT_FORM_PATH: &str = "payment/form";

/// `id` of the submit button, targeted by the auto-submit script.
pub const SUBMIT_BUTTON_ID: &str = "fasterpay-submit";

/// Input to [`PaymentForm::build_form`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutParams {
    /// Order fields: `amount`, `currency`, `description`, `merchant_order_id`,
    /// optionally `sign_version`, `email`, `success_url`, `pingback_url` and so on.
    pub payload: ParameterSet,
    /// Append a script that submits the form as soon as it is rendered.
    pub auto_submit_form: bool,
}

impl CheckoutParams {
    pub fn new(payload: ParameterSet) -> Self {
        Self {
            payload,
            auto_submit_form: false,
        }
    }

    pub fn with_auto_submit(mut self, auto_submit_form: bool) -> Self {
        self.auto_submit_form = auto_submit_form;
        self
    }
}

/// Builds signed checkout forms.
#[derive(Clone, Debug)]
pub struct PaymentForm {
    signer: Signer,
    action: String,
}

impl PaymentForm {
    pub fn new(credential: Arc<Credential>, api_url: &Url) -> Self {
        let action = format!(
            "{}/{PAYMENT_FORM_PATH}",
            api_url.as_str().trim_end_matches('/')
        );
        Self {
            signer: Signer::new(credential),
            action,
        }
    }

    /// URL the form posts to.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns `payload` completed with [`API_KEY_FIELD`] and [`FORM_HASH_FIELD`].
    ///
    /// The scheme is read from the payload's [`SIGN_VERSION_FIELD`], `v1` when absent.
    /// The digest covers every other field, including `api_key` and `sign_version`.
    /// A caller-supplied `hash` is discarded first.
    pub fn signed_fields(&self, mut payload: ParameterSet) -> Result<ParameterSet, UnsupportedScheme> {
        payload.remove(FORM_HASH_FIELD);
        payload.insert(API_KEY_FIELD, self.signer.credential().public_key());

        let indicator = payload.get(SIGN_VERSION_FIELD).map(ToString::to_string);
        let scheme = SigningScheme::from_indicator(indicator.as_deref())?;

        let hash = self.signer.sign(&payload, scheme);
        payload.insert(FORM_HASH_FIELD, hash);
        Ok(payload)
    }

    /// Renders the HTML `<form>` for `params`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.checkout.build_form", skip_all, err)
    )]
    pub fn build_form(&self, params: CheckoutParams) -> Result<String, UnsupportedScheme> {
        let fields = self.signed_fields(params.payload)?;

        let mut form = format!(
            "<form align=\"center\" method=\"post\" action=\"{}\">\n",
            escape_html(&self.action)
        );
        for (name, value) in &fields {
            // Writing into a String cannot fail.
            let _ = writeln!(
                form,
                "<input type=\"hidden\" name=\"{}\" value=\"{}\" />",
                escape_html(name),
                escape_html(&value.to_string())
            );
        }
        let _ = write!(
            form,
            "<input type=\"Submit\" value=\"Pay Now\" id=\"{SUBMIT_BUTTON_ID}\"/>\n</form>"
        );
        if params.auto_submit_form {
            let _ = write!(
                form,
                "\n<script type=\"text/javascript\">document.getElementById(\"{SUBMIT_BUTTON_ID}\").click();</script>"
            );
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(fields = fields.len(), "Built checkout form");

        Ok(form)
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_HASH: &str = "a34606c993c9f93413aec650eeed4301903179ef9aaffd9d9e547f5243e76ba6";
    const KEYED_HASH: &str = "8fad21eec21cbfc7d5e7ed255d4a96bfd5848f9fb8dc647a9db88a5b479c7461";

    fn form() -> PaymentForm {
        let api_url = Url::parse("https://pay.sandbox.fasterpay.com").unwrap();
        PaymentForm::new(Arc::new(Credential::new("priv", "pub")), &api_url)
    }

    fn order() -> ParameterSet {
        ParameterSet::from([
            ("amount", "10.00"),
            ("currency", "USD"),
            ("description", "Golden Sword"),
            ("merchant_order_id", "42"),
        ])
    }

    #[test]
    fn test_action_url() {
        assert_eq!(
            form().action(),
            "https://pay.sandbox.fasterpay.com/payment/form"
        );
    }

    #[test]
    fn test_signed_fields_default_to_legacy() {
        let fields = form().signed_fields(order()).unwrap();
        assert_eq!(fields.get(API_KEY_FIELD).unwrap().to_string(), "pub");
        assert_eq!(fields.get(FORM_HASH_FIELD).unwrap().to_string(), LEGACY_HASH);
        assert!(!fields.contains_key(SIGN_VERSION_FIELD));
    }

    #[test]
    fn test_signed_fields_include_declared_scheme() {
        let fields = form()
            .signed_fields(order().with(SIGN_VERSION_FIELD, "v2"))
            .unwrap();
        let hash = fields.get(FORM_HASH_FIELD).unwrap().to_string();
        // sign_version is part of the signed payload, so the digest differs from
        // the keyed digest of the order alone.
        assert_ne!(hash, KEYED_HASH);

        let signer = Signer::new(Arc::new(Credential::new("priv", "pub")));
        let mut signed = fields.clone();
        signed.remove(FORM_HASH_FIELD);
        assert_eq!(hash, signer.sign(&signed, SigningScheme::Keyed));
    }

    #[test]
    fn test_stale_hash_is_replaced() {
        let fields = form()
            .signed_fields(order().with(FORM_HASH_FIELD, "forged"))
            .unwrap();
        assert_eq!(fields.get(FORM_HASH_FIELD).unwrap().to_string(), LEGACY_HASH);
    }

    #[test]
    fn test_unknown_sign_version_is_rejected() {
        let result = form().build_form(CheckoutParams::new(order().with(SIGN_VERSION_FIELD, "v9")));
        assert_eq!(result, Err(UnsupportedScheme("v9".to_string())));
    }

    #[test]
    fn test_build_form_renders_hidden_inputs() {
        let html = form().build_form(CheckoutParams::new(order())).unwrap();
        assert!(html.starts_with(
            "<form align=\"center\" method=\"post\" action=\"https://pay.sandbox.fasterpay.com/payment/form\">"
        ));
        assert!(html.contains("<input type=\"hidden\" name=\"amount\" value=\"10.00\" />"));
        assert!(html.contains("<input type=\"hidden\" name=\"api_key\" value=\"pub\" />"));
        assert!(html.contains(&format!(
            "<input type=\"hidden\" name=\"hash\" value=\"{LEGACY_HASH}\" />"
        )));
        assert!(html.ends_with("id=\"fasterpay-submit\"/>\n</form>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_build_form_auto_submit() {
        let html = form()
            .build_form(CheckoutParams::new(order()).with_auto_submit(true))
            .unwrap();
        assert!(html.ends_with(
            "<script type=\"text/javascript\">document.getElementById(\"fasterpay-submit\").click();</script>"
        ));
    }

    #[test]
    fn test_values_are_html_escaped() {
        let html = form()
            .build_form(CheckoutParams::new(
                order().with("description", "<b>\"Tom & Jerry's\"</b>"),
            ))
            .unwrap();
        assert!(html.contains(
            "value=\"&lt;b&gt;&quot;Tom &amp; Jerry&#x27;s&quot;&lt;/b&gt;\""
        ));
    }
}
