#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! reqwest client for the FasterPay REST APIs.
//!
//! [`GatewayClient`] talks to both gateway APIs:
//!
//! - the checkout API (`pay.fasterpay.com`): subscription cancellation, refunds and
//!   delivery confirmations;
//! - the business API (`business.fasterpay.com`): contacts, address forms, payouts
//!   and e-invoices with their templates and products.
//!
//! ```rust,no_run
//! use fasterpay_reqwest::GatewayClient;
//! use fasterpay_types::config::GatewayConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new("<private key>", "<public key>").with_test_mode(true);
//! let client = GatewayClient::try_new(&config)?;
//! let fields = client.address().fields("US").await?;
//! println!("{fields}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `telemetry` - Emits a `tracing` span per API call; secrets and bodies are never recorded

mod client;
mod multipart;
pub mod resources;

pub use client::{GatewayClient, GatewayClientError};
pub use multipart::hybrid_form;
