use overlap_tracker::core::{MarketSnapshot, OverlapOptions, detect_overlap};
use overlap_tracker::providers::TrackerApiProvider;
use overlap_tracker::store::memory::MemoryCollection;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount_json(server: &MockServer, url_path: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    /// A tracker backend with two overlapping equity funds, one debt fund and
    /// an inactive fund.
    pub async fn create_tracker_mock_server() -> MockServer {
        let server = MockServer::start().await;

        mount_json(
            &server,
            "/mutual-funds",
            r#"[
                {"fund_id": "MF001", "fund_name": "Bluechip Growth", "fund_type": "Equity",
                 "total_assets": "1000", "nav": 50.0, "is_active": true},
                {"fund_id": "MF002", "fund_name": "Flexi Cap", "fund_type": "Equity",
                 "total_assets": 500, "nav": "20.5"},
                {"fund_id": "MF003", "fund_name": "Short Term Debt", "fund_type": "Debt",
                 "total_assets": 800, "nav": 12.0},
                {"fund_id": "MF004", "fund_name": "Wound Up", "fund_type": "Equity",
                 "total_assets": 100, "nav": 9.0, "is_active": false}
            ]"#,
        )
        .await;

        mount_json(
            &server,
            "/stocks",
            r#"[
                {"stock_id": "INFY", "stock_name": "Infosys", "sector": "IT", "close": 1500.0,
                 "indices": ["NIFTY50"]},
                {"stock_id": "HDFCBANK", "stock_name": "HDFC Bank", "sector": "Financials",
                 "current_price": "1650.25", "indices": ["NIFTY50"]},
                {"stock_id": "TRENT", "stock_name": "Trent", "sector": "Consumer", "close": 4100}
            ]"#,
        )
        .await;

        mount_json(
            &server,
            "/indices",
            r#"[{"index_id": "NIFTY50", "index_name": "Nifty 50", "index_cat": "Broad", "ltp": 22000}]"#,
        )
        .await;

        mount_json(
            &server,
            "/indices/NIFTY50/stocks",
            r#"[{"stock_id": "INFY", "stock_name": "Infosys"},
                {"stock_id": "HDFCBANK", "stock_name": "HDFC Bank"}]"#,
        )
        .await;

        mount_json(
            &server,
            "/mutual-funds/MF001/stocks",
            r#"[
                {"s_stock_id": "INFY", "f_shares_held": 1000, "f_holding_percentage": 10},
                {"s_stock_id": "HDFCBANK", "f_shares_held": 800, "f_holding_percentage": "8.5"}
            ]"#,
        )
        .await;

        mount_json(
            &server,
            "/mutual-funds/MF002/stocks",
            r#"[
                {"s_stock_id": "INFY", "f_shares_held": 400, "f_holding_percentage": 20},
                {"s_stock_id": "TRENT", "f_shares_held": 90, "f_holding_percentage": 6}
            ]"#,
        )
        .await;

        mount_json(&server, "/mutual-funds/MF003/stocks", "[]").await;
        mount_json(
            &server,
            "/mutual-funds/MF004/stocks",
            r#"[{"s_stock_id": "INFY", "f_shares_held": 10, "f_holding_percentage": 50}]"#,
        )
        .await;

        server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str, persist: bool) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
portfolios:
  - name: "Equity"
    investments:
      - fund_id: "MF001"
        units: 100.0
        invested: 4000.0
      - fund_id: "MF002"
        units: 50.0
        invested: 1200.0
      - stock_id: "INFY"
        units: 2
        invested: 2800.0
  - name: "Debt"
    investments:
      - fund_id: "MF003"
        invested: 1000.0
        current_value: 1075.0
      - fund_id: "MF004"
        units: 10.0
        invested: 100.0
providers:
  api:
    base_url: "{base_url}"
currency: "INR"
data_path: "{data_path}"
cache:
  persist: {persist}
"#,
            data_path = dir.join("data").display(),
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

async fn run_against_mock(command: overlap_tracker::AppCommand, persist: bool) -> anyhow::Result<()> {
    let server = test_utils::create_tracker_mock_server().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &server.uri(), persist);

    overlap_tracker::run_command(command, Some(config_path.to_str().unwrap())).await
}

#[test_log::test(tokio::test)]
async fn test_summary_flow_with_mock() {
    let result = run_against_mock(overlap_tracker::AppCommand::Summary, true).await;
    assert!(result.is_ok(), "Summary failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_alloc_flow_with_mock() {
    for by in [
        overlap_tracker::AllocationBasis::Category,
        overlap_tracker::AllocationBasis::AssetClass,
    ] {
        let result = run_against_mock(overlap_tracker::AppCommand::Alloc { by }, false).await;
        assert!(result.is_ok(), "Alloc failed with: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_overlap_flow_with_configured_funds() {
    let result = run_against_mock(
        overlap_tracker::AppCommand::Overlap {
            funds: Vec::new(),
            include_inactive: false,
        },
        true,
    )
    .await;
    assert!(result.is_ok(), "Overlap failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_overlap_flow_with_selected_funds() {
    let result = run_against_mock(
        overlap_tracker::AppCommand::Overlap {
            funds: vec!["MF002".to_string(), "MF004".to_string()],
            include_inactive: true,
        },
        false,
    )
    .await;
    assert!(result.is_ok(), "Overlap failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_coverage_flow_with_mock() {
    let result = run_against_mock(
        overlap_tracker::AppCommand::Coverage {
            index: "NIFTY50".to_string(),
            include_inactive: false,
        },
        true,
    )
    .await;
    assert!(result.is_ok(), "Coverage failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_holders_flow_with_mock() {
    for include_inactive in [false, true] {
        let result = run_against_mock(
            overlap_tracker::AppCommand::Holders {
                stock: "INFY".to_string(),
                include_inactive,
            },
            false,
        )
        .await;
        assert!(result.is_ok(), "Holders failed with: {:?}", result.err());
    }

    let result = run_against_mock(
        overlap_tracker::AppCommand::Holders {
            stock: "NOSUCH".to_string(),
            include_inactive: false,
        },
        false,
    )
    .await;
    let err = result.expect_err("Holders should fail for an unknown stock");
    assert!(err.to_string().contains("NOSUCH"));
}

#[test_log::test(tokio::test)]
async fn test_overlap_figures_from_backend() {
    let server = test_utils::create_tracker_mock_server().await;
    let provider =
        TrackerApiProvider::with_collection(&server.uri(), Arc::new(MemoryCollection::new()), None)
            .expect("Failed to build provider");
    let ids = vec!["MF001".to_string(), "MF002".to_string(), "MF004".to_string()];

    let snapshot = MarketSnapshot::load(&provider, &ids)
        .await
        .expect("Failed to load snapshot");
    let report = detect_overlap(
        &snapshot.funds_with_holdings(&ids),
        &snapshot.stocks,
        &OverlapOptions::default(),
    );

    // MF001: 10% of 1000, MF002: 20% of 500. MF004 is inactive.
    let infy = report.row("INFY").expect("INFY row");
    assert!((infy.total_exposure - 200.0).abs() < 1e-9);
    assert!(infy.is_overlapping);
    let ratio = infy.overlap_ratio.value().expect("ratio");
    assert!((ratio - 200.0 / 1500.0).abs() < 1e-9);
    let holders: Vec<&str> = report
        .holders("INFY")
        .iter()
        .map(|f| f.fund_id.as_str())
        .collect();
    assert_eq!(holders, vec!["MF001", "MF002"]);

    // "8.5" arrives as a string
    let hdfc = report.row("HDFCBANK").expect("HDFCBANK row");
    assert!((hdfc.total_exposure - 85.0).abs() < 1e-9);
    assert!(!hdfc.is_overlapping);

    assert_eq!(report.rows[0].stock_id, "INFY");
    assert_eq!(report.excluded_funds, vec!["MF004"]);
    assert_eq!(report.fund_pairs.len(), 1);
    assert_eq!(report.fund_pairs[0].common_stocks, vec!["INFY"]);
    assert!((report.fund_pairs[0].overlap_pct - 10.0).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_persistent_cache_written_to_data_path() {
    let server = test_utils::create_tracker_mock_server().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &server.uri(), true);

    overlap_tracker::run_command(
        overlap_tracker::AppCommand::Summary,
        Some(config_path.to_str().unwrap()),
    )
    .await
    .expect("Summary failed");

    let cache_dir = dir.path().join("data").join("cache");
    info!(path = %cache_dir.display(), "Checking cache directory");
    assert!(cache_dir.exists());
}

#[test_log::test(tokio::test)]
async fn test_backend_error_fails_command() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &server.uri(), false);

    let result = overlap_tracker::run_command(
        overlap_tracker::AppCommand::Summary,
        Some(config_path.to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("Summary should fail when the backend is down");
    assert!(format!("{err:#}").contains("503"), "unexpected error: {err:#}");
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let missing = dir.path().join("nope.yaml");

    let result = overlap_tracker::run_command(
        overlap_tracker::AppCommand::Summary,
        Some(missing.to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
    assert!(!missing.exists());
}

#[test]
fn test_setup_writes_loadable_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.yaml");

    overlap_tracker::cli::setup::setup_at_path(&path).expect("Setup failed");

    let content = fs::read_to_string(&path).expect("Failed to read config");
    assert!(content.contains("# Example configuration file for overlap-tracker"));
    let config = overlap_tracker::config::AppConfig::load_from_path(&path).expect("Invalid config");
    assert_eq!(config.currency, "INR");
}
