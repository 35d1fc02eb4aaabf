//! Fetch a URL through a retrying transport.
//!
//! ```sh
//! RUST_LOG=again=debug cargo run -p again --example retry_get -- https://httpbin.org/status/503
//! ```

use again::{RetryClient, RetryConfig};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/status/503".to_string());

    let config = RetryConfig::new()
        .max_retries(3)
        .exponential(Duration::from_millis(200), Duration::from_secs(5))
        .notify(|err, wait| {
            tracing::info!(error = %err, wait_ms = wait.as_millis() as u64, "Retrying");
        });
    let client = RetryClient::with_config(config);

    let response = client.get(&url).await?;
    println!("{} {}", response.status(), response.text().await?);

    Ok(())
}
