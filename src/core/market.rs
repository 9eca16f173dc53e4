//! Market data abstractions and snapshot loading.

use crate::core::model::{Fund, Holding, Index, MarketSnapshot, Stock, StockUniverse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::debug;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_funds(&self) -> Result<Vec<Fund>>;
    async fn fetch_stocks(&self) -> Result<Vec<Stock>>;
    async fn fetch_holdings(&self, fund_id: &str) -> Result<Vec<Holding>>;
    async fn fetch_indices(&self) -> Result<Vec<Index>>;
    /// Stock ids of the constituents of an index.
    async fn fetch_index_members(&self, index_id: &str) -> Result<Vec<String>>;
}

impl MarketSnapshot {
    /// Fetches everything needed to value and compare the given funds.
    ///
    /// Funds, stocks and indices are requested concurrently, then the holdings
    /// of each requested fund. Returns only once every request has resolved; any
    /// failure fails the whole load.
    pub async fn load(
        provider: &(dyn MarketDataProvider + Send + Sync),
        fund_ids: &[String],
    ) -> Result<Self> {
        let (funds, stocks, indices) = futures::try_join!(
            provider.fetch_funds(),
            provider.fetch_stocks(),
            provider.fetch_indices(),
        )?;
        debug!(
            funds = funds.len(),
            stocks = stocks.len(),
            indices = indices.len(),
            "Fetched market data"
        );

        let known: Vec<&String> = fund_ids
            .iter()
            .filter(|id| funds.iter().any(|f| &f.fund_id == *id))
            .collect();
        let holdings_futures = known.iter().map(|id| async move {
            provider
                .fetch_holdings(id)
                .await
                .with_context(|| format!("Failed to fetch holdings for fund {id}"))
                .map(|holdings| ((*id).clone(), holdings))
        });
        let holdings: HashMap<String, Vec<Holding>> =
            try_join_all(holdings_futures).await?.into_iter().collect();

        Ok(MarketSnapshot {
            stocks: stocks.into_iter().collect::<StockUniverse>(),
            funds,
            holdings,
            indices,
            fetched_at: chrono::Utc::now(),
        })
    }
}
