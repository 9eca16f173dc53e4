pub mod alloc;
pub mod coverage;
pub mod holders;
pub mod overlap;
pub mod setup;
pub mod summary;
pub mod ui;

use crate::core::market::MarketDataProvider;
use crate::core::model::MarketSnapshot;
use anyhow::Result;

/// Loads a snapshot for `fund_ids` behind a spinner.
pub(crate) async fn load_snapshot(
    provider: &(dyn MarketDataProvider + Send + Sync),
    fund_ids: &[String],
) -> Result<MarketSnapshot> {
    let pb = ui::new_spinner("Fetching market data...");
    let snapshot = MarketSnapshot::load(provider, fund_ids).await;
    pb.finish_and_clear();
    snapshot
}
