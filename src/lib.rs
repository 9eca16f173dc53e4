pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use cli::alloc::AllocationBasis;
pub use crate::core::config;

use crate::core::overlap::OverlapOptions;
use crate::providers::TrackerApiProvider;
use crate::store::KeyValueStore;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Summary,
    Alloc {
        by: AllocationBasis,
    },
    Overlap {
        funds: Vec<String>,
        include_inactive: bool,
    },
    Coverage {
        index: String,
        include_inactive: bool,
    },
    Holders {
        stock: String,
        include_inactive: bool,
    },
}

fn open_store(config: &config::AppConfig) -> KeyValueStore {
    if !config.cache.persist {
        return KeyValueStore::in_memory();
    }
    match config.data_path() {
        Ok(path) => KeyValueStore::new(Some(path.as_path())),
        Err(e) => {
            warn!(error = %e, "No data directory, caching in memory");
            KeyValueStore::in_memory()
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Overlap Tracker starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = open_store(&config);
    let provider = TrackerApiProvider::new(
        config.api_base_url(),
        &store,
        config.cache.persist,
        Duration::from_secs(config.cache.ttl_secs),
    )?;

    match command {
        AppCommand::Summary => {
            cli::summary::run(&config.portfolios, &provider, &config.currency).await
        }
        AppCommand::Alloc { by } => {
            cli::alloc::run(&config.portfolios, &provider, &config.currency, by).await
        }
        AppCommand::Overlap {
            funds,
            include_inactive,
        } => {
            let fund_ids = if funds.is_empty() {
                config.all_fund_ids()
            } else {
                funds
            };
            let options = OverlapOptions {
                include_inactive,
                holding_sum_tolerance: config.overlap.holding_sum_tolerance,
            };
            cli::overlap::run(&fund_ids, &provider, &options).await
        }
        AppCommand::Coverage {
            index,
            include_inactive,
        } => {
            cli::coverage::run(&config.all_fund_ids(), &index, &provider, include_inactive).await
        }
        AppCommand::Holders {
            stock,
            include_inactive,
        } => {
            let options = OverlapOptions {
                include_inactive,
                holding_sum_tolerance: config.overlap.holding_sum_tolerance,
            };
            cli::holders::run(&config.all_fund_ids(), &stock, &provider, &options).await
        }
    }
}
