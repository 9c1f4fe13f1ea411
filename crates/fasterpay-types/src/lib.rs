#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for integrating with the FasterPay payment gateway.
//!
//! This crate holds everything that does not perform I/O: the canonical forms and
//! digests that authenticate outbound checkout requests, the verifier for inbound
//! pingbacks, and the encoder that decides between a JSON body and a multipart
//! body when a request carries file attachments.
//!
//! # Overview
//!
//! A merchant holds a [`config::Credential`] (private + public key). Checkout
//! requests are signed by appending a digest of their parameters to the form, and
//! the gateway signs its asynchronous notifications ("pingbacks") with the same
//! private key. Two incompatible signing schemes coexist, `v1` and `v2`; the
//! scheme in use is always stated explicitly next to the digest.
//!
//! # Modules
//!
//! - [`canonical`] - Deterministic string forms of flat parameter sets
//! - [`signature`] - Signing schemes and the [`signature::Signer`]
//! - [`pingback`] - Verification of inbound notifications
//! - [`payload`] - JSON / multipart encoding of nested request bodies with attachments
//! - [`checkout`] - Signed, auto-submittable checkout form
//! - [`config`] - Credentials, environments and environment variable resolution
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod canonical;
pub mod checkout;
pub mod config;
pub mod payload;
pub mod pingback;
pub mod signature;
