//! Local mock of the expense API.
//!
//! Binds `MOCK_SERVER_ADDR` and serves demo data under `/api/v1`. Set
//! `MOCK_RATE_LIMIT=N` to answer the first N expense listings with 429.

use std::sync::Arc;

use expense_tracker::server::{self, MockState};
use expense_tracker::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    if config.mock_rate_limit > 0 {
        tracing::info!(
            count = config.mock_rate_limit,
            "Expense listings will be rate limited"
        );
    }

    let state = MockState::with_demo_data().rate_limited(config.mock_rate_limit);
    server::serve(config.mock_addr, Arc::new(state)).await
}
