//! FasterPay Pingback Server
//!
//! A small HTTP service that receives the gateway's payment notifications, rejects
//! anything that fails verification, and logs the events it accepts.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration types and loading |
//! | [`handlers`] | HTTP routes and handlers |
//! | [`run`] | Server initialization and runtime |
//! | [`util`] | Shutdown signals and log/trace export |
//!
//! # Running the Server
//!
//! ```bash
//! FASTERPAY_PRIVATE_KEY=... FASTERPAY_PUBLIC_KEY=... \
//!   cargo run --package fasterpay-pingback -- --config pingback-server/config.example.json
//! ```

pub mod config;
pub mod handlers;
pub mod run;
pub mod util;

pub use run::run;
