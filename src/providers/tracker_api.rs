use super::util::{lenient_f64, lenient_i64, with_retry};
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::market::MarketDataProvider;
use crate::core::model::{Fund, Holding, Index, Stock};
use crate::store::KeyValueStore;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

const CACHE_COLLECTION: &str = "tracker_api";

/// Reads funds, stocks, holdings and indices from the tracker backend's REST API.
pub struct TrackerApiProvider {
    base_url: String,
    client: reqwest::Client,
    cache: Arc<dyn KeyValueCollection>,
    ttl: Option<Duration>,
}

impl TrackerApiProvider {
    pub fn new(base_url: &str, store: &KeyValueStore, persist: bool, ttl: Duration) -> Result<Self> {
        let cache = store
            .get_collection(CACHE_COLLECTION, persist, true)
            .ok_or_else(|| anyhow!("Failed to open cache collection {CACHE_COLLECTION}"))?;
        Self::with_collection(base_url, cache, Some(ttl))
    }

    pub fn with_collection(
        base_url: &str,
        cache: Arc<dyn KeyValueCollection>,
        ttl: Option<Duration>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("overlap-tracker/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache,
            ttl,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        if let Some(cached) = self.cache.get(path.as_bytes()).await {
            match serde_json::from_slice(&cached) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    debug!("Discarding unreadable cache entry for {}: {}", path, e);
                    self.cache.remove(path.as_bytes()).await;
                }
            }
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {}", url);
        let response = with_retry(
            || async { self.client.get(&url).send().await?.error_for_status() },
            3,
            500,
        )
        .await
        .with_context(|| format!("Request to {url} failed"))?;

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        let parsed = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %String::from_utf8_lossy(&body),
                    "Failed to parse response from {}", url
                );
                return Err(e).with_context(|| format!("Failed to parse response from {url}"));
            }
        };

        self.cache.put(path.as_bytes(), &body, self.ttl).await;
        Ok(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct FundRow {
    fund_id: String,
    fund_name: String,
    #[serde(default)]
    amc_id: Option<String>,
    #[serde(default)]
    fund_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_assets: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    nav: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    expense_ratio: Option<f64>,
    #[serde(default)]
    manager_name: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl From<FundRow> for Fund {
    fn from(row: FundRow) -> Self {
        Fund {
            fund_id: row.fund_id,
            name: row.fund_name,
            amc_id: row.amc_id,
            fund_type: row.fund_type,
            nav: row.nav,
            expense_ratio: row.expense_ratio,
            total_assets: row.total_assets,
            manager_name: row.manager_name,
            is_active: row.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StockRow {
    stock_id: String,
    #[serde(default)]
    isin_id: Option<String>,
    #[serde(default)]
    stock_symbol: Option<String>,
    stock_name: String,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    w_h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    w_l: Option<f64>,
    #[serde(default)]
    indices: Vec<String>,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Stock {
            stock_id: row.stock_id,
            isin: row.isin_id,
            symbol: row.stock_symbol,
            name: row.stock_name,
            sector: row.sector,
            exchange: row.exchange,
            market_cap: row.market_cap,
            // The last close stands in when no live price was scraped.
            current_price: row.current_price.or(row.close),
            week52_high: row.w_h,
            week52_low: row.w_l,
            indices: row.indices,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HoldingRow {
    s_stock_id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    f_shares_held: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    f_holding_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    index_id: String,
    index_name: String,
    #[serde(default)]
    index_cat: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ltp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    w_h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    w_l: Option<f64>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl From<IndexRow> for Index {
    fn from(row: IndexRow) -> Self {
        Index {
            index_id: row.index_id,
            name: row.index_name,
            category: row.index_cat,
            open: row.open,
            close: row.close,
            ltp: row.ltp,
            week52_high: row.w_h,
            week52_low: row.w_l,
            is_active: row.is_active.unwrap_or(true),
        }
    }
}

#[async_trait]
impl MarketDataProvider for TrackerApiProvider {
    async fn fetch_funds(&self) -> Result<Vec<Fund>> {
        let rows: Vec<FundRow> = self.get_json("/mutual-funds").await?;
        Ok(rows.into_iter().map(Fund::from).collect())
    }

    async fn fetch_stocks(&self) -> Result<Vec<Stock>> {
        let rows: Vec<StockRow> = self.get_json("/stocks").await?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    async fn fetch_holdings(&self, fund_id: &str) -> Result<Vec<Holding>> {
        let rows: Vec<HoldingRow> = self
            .get_json(&format!("/mutual-funds/{fund_id}/stocks"))
            .await?;
        let holdings = rows
            .into_iter()
            .filter_map(|row| match row.f_holding_percentage {
                Some(pct) => {
                    let shares_held = row.f_shares_held.unwrap_or_else(|| {
                        warn!(fund_id, stock_id = %row.s_stock_id, "Holding without share count, using 0");
                        0
                    });
                    Some(Holding {
                        stock_id: row.s_stock_id,
                        shares_held,
                        holding_percentage: pct,
                    })
                }
                None => {
                    warn!(fund_id, stock_id = %row.s_stock_id, "Holding without percentage skipped");
                    None
                }
            })
            .collect();
        Ok(holdings)
    }

    async fn fetch_indices(&self) -> Result<Vec<Index>> {
        let rows: Vec<IndexRow> = self.get_json("/indices").await?;
        Ok(rows.into_iter().map(Index::from).collect())
    }

    async fn fetch_index_members(&self, index_id: &str) -> Result<Vec<String>> {
        let rows: Vec<StockRow> = self
            .get_json(&format!("/indices/{index_id}/stocks"))
            .await?;
        Ok(rows.into_iter().map(|row| row.stock_id).collect())
    }
}
