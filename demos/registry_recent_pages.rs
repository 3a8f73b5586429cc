//! Query two GROWI sites through the global instance registry.
//!
//! Run:
//! `cargo run --example registry_recent_pages`
//!
//! Env vars:
//! - `GROWI_SITE_A_URL`, `GROWI_SITE_A_TOKEN`
//! - `GROWI_SITE_B_URL`, `GROWI_SITE_B_TOKEN`

use growi_client::{ApiV3, CallOptions, ClientConfiguration, InstanceRegistry};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = InstanceRegistry::global();
    for site in ["A", "B"] {
        let base_url = std::env::var(format!("GROWI_SITE_{site}_URL"))?;
        let token = std::env::var(format!("GROWI_SITE_{site}_TOKEN")).unwrap_or_default();
        registry.register(
            format!("site{site}"),
            &ClientConfiguration::new(base_url, token),
        )?;
    }

    let api = ApiV3::global();
    for name in ["siteA", "siteB"] {
        let recent: Value = api
            .recent_pages(Some(3), None, CallOptions::instance(name))?
            .await?;
        println!("{name}: {}", serde_json::to_string_pretty(&recent)?);
    }
    Ok(())
}
