//! Process-level helpers for the pingback server.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`sig_down`] | Graceful shutdown signal handling |
//! | [`telemetry`] | Log output and OpenTelemetry trace export |

pub mod sig_down;
pub mod telemetry;

pub use sig_down::*;
pub use telemetry::*;
