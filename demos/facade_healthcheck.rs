//! Check a GROWI site's health and list recent pages through `GrowiClient`.
//!
//! Run:
//! `cargo run --example facade_healthcheck`
//!
//! Env vars:
//! - `GROWI_BASE_URL` (required, for example `https://wiki.example.com`)
//! - `GROWI_ACCESS_TOKEN` (optional)

use growi_client::{CallOptions, GrowiClient};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = GrowiClient::from_env()?;

    let health: Value = client.v3().healthcheck(CallOptions::default())?.await?;
    println!("{}", serde_json::to_string_pretty(&health)?);

    let recent: Value = client
        .v3()
        .recent_pages(Some(5), None, CallOptions::default())?
        .await?;
    println!("{}", serde_json::to_string_pretty(&recent)?);
    Ok(())
}
