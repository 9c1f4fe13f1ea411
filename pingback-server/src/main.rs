//! FasterPay pingback receiver.
//!
//! Endpoints:
//! - `POST {path}` - Authenticated pingback, answered with `ok` (path defaults to `/pingback`)
//! - `GET /health` - Liveness probe
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON configuration file
//! - `HOST`, `PORT` control binding address when the file omits them
//! - `OTEL_*` variables enable trace export over OTLP

use std::process;

use fasterpay_pingback::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
