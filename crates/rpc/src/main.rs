//! `ledgerlens-health`: probe one ERP connection configured from the environment.
//!
//! Reads `<PREFIX>_URL`, `<PREFIX>_DB`, `<PREFIX>_USERNAME` and
//! `<PREFIX>_PASSWORD` (prefix `LEDGERLENS_ERP`, overridable through
//! `LEDGERLENS_CREDENTIALS_PREFIX`) and prints the report as JSON.

use anyhow::Context;

use ledgerlens_rpc::{ClientConfig, Credentials, RpcClient};

const DEFAULT_PREFIX: &str = "LEDGERLENS_ERP";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ledgerlens_observability::init();

    let prefix = std::env::var("LEDGERLENS_CREDENTIALS_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let credentials = Credentials::from_env(&prefix).context("loading ERP credentials")?;
    let config = ClientConfig::from_env();

    let client = RpcClient::http(credentials, config).context("building HTTP client")?;
    let report = client.health_check().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_healthy() {
        tracing::info!(endpoint = %report.endpoint, version = ?report.server_version, "ERP connection healthy");
        Ok(())
    } else {
        anyhow::bail!("ERP connection unhealthy: {}", report.message)
    }
}
