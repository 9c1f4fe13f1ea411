#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! FasterPay in Rust.
//!
//! A single [`Gateway`] ties one merchant's [`GatewayConfig`] to everything built on it:
//!
//! - [`Gateway::payment_form`] renders the signed, auto-submittable checkout form;
//! - [`Gateway::pingback`] verifies the gateway's asynchronous notifications;
//! - [`Gateway::client`] calls the checkout and business REST APIs;
//! - [`Gateway::pingback_layer`] (feature `axum`) guards a pingback route.
//!
//! ```rust
//! use fasterpay::{CheckoutParams, Gateway, GatewayConfig, ParameterSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::new(GatewayConfig::new("<private key>", "<public key>").with_test_mode(true));
//!
//! let payload = ParameterSet::new()
//!     .with("amount", "5.00")
//!     .with("currency", "USD")
//!     .with("description", "Golden Ticket")
//!     .with("merchant_order_id", "1234")
//!     .with("sign_version", "v2");
//! let html = gateway
//!     .payment_form()
//!     .build_form(CheckoutParams::new(payload).with_auto_submit(true))?;
//! assert!(html.contains("https://pay.sandbox.fasterpay.com/payment/form"));
//! # Ok(())
//! # }
//! ```
//!
//! The underlying crates are re-exported as [`types`], [`client`] and (with `axum`)
//! [`axum`].
//!
//! ## Features
//!
//! - `axum` - Pingback middleware for axum servers
//! - `telemetry` - `tracing` spans and events across all crates

pub use fasterpay_reqwest as client;
pub use fasterpay_types as types;

#[cfg(feature = "axum")]
pub use fasterpay_axum as axum;

pub use fasterpay_reqwest::{GatewayClient, GatewayClientError};
pub use fasterpay_types::canonical::{ParamValue, ParameterSet};
pub use fasterpay_types::checkout::{CheckoutParams, PaymentForm};
pub use fasterpay_types::config::{Credential, Environment, GatewayConfig};
pub use fasterpay_types::payload::{Attachment, RequestObject, RequestValue};
pub use fasterpay_types::pingback::Pingback;
pub use fasterpay_types::signature::{Signer, SigningScheme, UnsupportedScheme};

/// Entry point for one merchant account.
#[derive(Clone, Debug)]
pub struct Gateway {
    config: GatewayConfig,
    signer: Signer,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        let signer = Signer::new(config.credential().clone());
        Self { config, signer }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Verifier for inbound pingbacks.
    pub fn pingback(&self) -> Pingback {
        Pingback::from_signer(self.signer.clone())
    }

    /// Checkout form posting to the configured checkout API.
    pub fn payment_form(&self) -> PaymentForm {
        PaymentForm::new(self.config.credential().clone(), self.config.api_url())
    }

    /// REST client for both gateway APIs.
    ///
    /// Fails only if the private key cannot be sent as a header value.
    pub fn client(&self) -> Result<GatewayClient, GatewayClientError> {
        GatewayClient::try_new(&self.config)
    }

    /// Middleware that rejects forged pingbacks.
    #[cfg(feature = "axum")]
    pub fn pingback_layer(&self) -> fasterpay_axum::PingbackLayer {
        fasterpay_axum::PingbackLayer::from_pingback(self.pingback())
    }
}

impl From<GatewayConfig> for Gateway {
    fn from(config: GatewayConfig) -> Self {
        Self::new(config)
    }
}
