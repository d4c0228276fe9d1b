//! Example: Fetching every record of a table
//!
//! Reads credentials from the environment (or `caspio.toml`), fetches all
//! pages of a table and prints how the run ended.
//!
//! # Setup
//!
//! ```bash
//! export CASPIO_ACCOUNT_DOMAIN=c1abc123.caspio.com
//! export CASPIO_CLIENT_ID=...
//! export CASPIO_CLIENT_SECRET=...
//! RUST_LOG=caspio_proxy=debug cargo run --example fetch_table -- Orders "Status='Open'"
//! ```

use caspio_proxy_domain::QueryParams;
use caspio_proxy_infra::PlatformClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let table = args.next().unwrap_or_else(|| "Orders".to_string());
    let filter = args.next();

    let client = PlatformClient::from_env()?;

    let mut params = QueryParams::new();
    if let Some(filter) = filter {
        params = params.where_clause(filter);
    }

    let options = client.fetch_options().with_early_exit(|merged| merged.len() >= 5_000);
    let report = client
        .fetch_all_pages_with_report(&format!("tables/{table}/records"), params, Some(options))
        .await?;

    println!(
        "{} records from {} page(s), stopped: {}",
        report.records.len(),
        report.pages_fetched,
        report.stop_reason
    );
    if let Some(first) = report.records.first() {
        println!("first record: {}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
