use crate::core::overlap::DEFAULT_HOLDING_SUM_TOLERANCE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FundInvestment {
    pub fund_id: String,
    #[serde(default)]
    pub units: Option<f64>,
    pub invested: f64,
    /// Overrides `units * nav` when set.
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StockInvestment {
    pub stock_id: String,
    #[serde(default)]
    pub units: Option<f64>,
    pub invested: f64,
    /// Overrides `units * current_price` when set.
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum Investment {
    MutualFund(FundInvestment),
    Stock(StockInvestment),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Portfolio {
    pub name: String,
    pub investments: Vec<Investment>,
}

impl Portfolio {
    pub fn fund_ids(&self) -> impl Iterator<Item = &str> {
        self.investments.iter().filter_map(|i| match i {
            Investment::MutualFund(mf) => Some(mf.fund_id.as_str()),
            Investment::Stock(_) => None,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub api: Option<ApiProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            api: Some(ApiProviderConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
            }),
        }
    }
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "CacheConfig::default_persist")]
    pub persist: bool,
}

impl CacheConfig {
    fn default_ttl_secs() -> u64 {
        900
    }

    fn default_persist() -> bool {
        true
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            persist: Self::default_persist(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OverlapConfig {
    /// Percentage points a fund's holdings may exceed 100% by.
    #[serde(default = "OverlapConfig::default_tolerance")]
    pub holding_sum_tolerance: f64,
}

impl OverlapConfig {
    fn default_tolerance() -> f64 {
        DEFAULT_HOLDING_SUM_TOLERANCE
    }
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            holding_sum_tolerance: Self::default_tolerance(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub portfolios: Vec<Portfolio>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub currency: String,
    pub data_path: Option<String>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub overlap: OverlapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("io", "overlaptracker", "overlap-tracker")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn api_base_url(&self) -> &str {
        self.providers
            .api
            .as_ref()
            .map_or(DEFAULT_API_BASE_URL, |p| p.base_url.as_str())
    }

    /// Fund ids held across all portfolios, first occurrence first.
    pub fn all_fund_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.portfolios.iter().flat_map(Portfolio::fund_ids) {
            if !ids.iter().any(|i| i == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
portfolios:
  - name: "Core"
    investments:
      - fund_id: "MF001"
        units: 120.5
        invested: 10000
      - fund_id: "MF002"
        invested: 5000
        current_value: 5600
        category: "Index"
      - stock_id: "INFY"
        units: 10
        invested: 14000
  - name: "Satellite"
    investments:
      - fund_id: "MF001"
        units: 10
        invested: 900
currency: "INR"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.portfolios.len(), 2);
        assert_eq!(config.portfolios[0].name, "Core");
        assert_eq!(config.portfolios[0].investments.len(), 3);
        if let Investment::MutualFund(mf) = &config.portfolios[0].investments[0] {
            assert_eq!(mf.fund_id, "MF001");
            assert_eq!(mf.units, Some(120.5));
            assert_eq!(mf.invested, 10000.0);
            assert!(mf.current_value.is_none());
        } else {
            panic!("Expected a mutual fund investment");
        }
        if let Investment::MutualFund(mf) = &config.portfolios[0].investments[1] {
            assert_eq!(mf.current_value, Some(5600.0));
            assert_eq!(mf.category.as_deref(), Some("Index"));
        } else {
            panic!("Expected a mutual fund investment");
        }
        if let Investment::Stock(s) = &config.portfolios[0].investments[2] {
            assert_eq!(s.stock_id, "INFY");
            assert_eq!(s.units, Some(10.0));
        } else {
            panic!("Expected a stock investment");
        }

        assert_eq!(config.currency, "INR");
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.cache.ttl_secs, 900);
        assert!(config.cache.persist);
        assert_eq!(
            config.overlap.holding_sum_tolerance,
            DEFAULT_HOLDING_SUM_TOLERANCE
        );
        assert_eq!(config.all_fund_ids(), vec!["MF001", "MF002"]);
    }

    #[test]
    fn test_config_with_providers_and_cache() {
        let yaml_str = r#"
portfolios: []
providers:
  api:
    base_url: "http://example.com/api"
cache:
  ttl_secs: 60
overlap:
  holding_sum_tolerance: 1.5
data_path: "/tmp/overlap-tracker"
currency: "USD"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.api_base_url(), "http://example.com/api");
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.cache.persist);
        assert_eq!(config.overlap.holding_sum_tolerance, 1.5);
        assert_eq!(
            config.data_path().unwrap(),
            PathBuf::from("/tmp/overlap-tracker")
        );
    }
}
