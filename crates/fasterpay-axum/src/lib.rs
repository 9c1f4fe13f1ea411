//! Axum middleware for receiving [FasterPay](https://www.fasterpay.com) pingbacks.
//!
//! The gateway notifies merchants of payments, refunds and subscription changes by
//! `POST`ing a signed JSON body to a pingback URL. [`PingbackLayer`] authenticates
//! those requests with [`fasterpay_types::pingback::Pingback`] so the handler only
//! ever sees genuine notifications.
//!
//! See [`layer`] for status codes and an example.

pub mod layer;

pub use layer::{DEFAULT_BODY_LIMIT, PingbackLayer, PingbackService, VerifiedPingback};
