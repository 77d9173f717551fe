//! End-to-end batch runner behavior against an in-memory provider stub.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tempfile::tempdir;

use fin_ratios::api::{FundamentalsProvider, ProviderError};
use fin_ratios::models::{
    CompanyProfile, CompanyReport, DividendPayment, Exchange, LineItems, PricePoint,
};
use fin_ratios::runner::{run_batch, BatchConfig};
use fin_ratios::sink::YearlyCsvSink;

#[derive(Default)]
struct StubProvider {
    reports: HashMap<String, CompanyReport>,
    failing: HashSet<String>,
}

impl StubProvider {
    fn with_report(mut self, symbol: &str, report: CompanyReport) -> Self {
        self.reports.insert(symbol.to_string(), report);
        self
    }

    fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    fn report(&self, symbol: &str) -> Result<&CompanyReport, ProviderError> {
        if self.failing.contains(symbol) {
            return Err(ProviderError::SymbolNotFound(symbol.to_string()));
        }
        self.reports
            .get(symbol)
            .ok_or_else(|| ProviderError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl FundamentalsProvider for StubProvider {
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError> {
        Ok(self.report(symbol)?.profile.clone())
    }

    async fn get_income_statements(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError> {
        Ok(self.report(symbol)?.income_statements.clone())
    }

    async fn get_balance_sheets(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError> {
        Ok(self.report(symbol)?.balance_sheets.clone())
    }

    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, ProviderError> {
        Ok(self.report(symbol)?.prices.clone())
    }

    async fn get_dividend_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<DividendPayment>, ProviderError> {
        Ok(self.report(symbol)?.dividends.clone())
    }
}

fn line_items(pairs: &[(&str, f64)]) -> LineItems {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// A company matching the worked example: EPS 2.00, BVPS 20.00, ROA 0.02,
/// P/E 10.00, MB 1.00 for both 2021 and 2022.
fn acme_report() -> CompanyReport {
    let mut income_statements = BTreeMap::new();
    let mut balance_sheets = BTreeMap::new();
    for year in [2021, 2022] {
        income_statements.insert(year, line_items(&[("Net Income", 1_000_000.0)]));
        balance_sheets.insert(
            year,
            line_items(&[
                ("Stockholders Equity", 10_000_000.0),
                ("Total Assets", 50_000_000.0),
                ("Total Debt", 20_000_000.0),
            ]),
        );
    }

    CompanyReport {
        code: "ACM".to_string(),
        symbol: "ACM".to_string(),
        profile: CompanyProfile {
            name: Some("Acme Ltd".to_string()),
            sector: Some("Industrials".to_string()),
            industry: Some("Machinery".to_string()),
            shares_outstanding: Some(500_000.0),
            previous_close: Some(20.0),
        },
        income_statements,
        balance_sheets,
        prices: vec![
            PricePoint {
                date: NaiveDate::from_ymd_opt(2021, 12, 30).unwrap(),
                close: 20.0,
            },
            PricePoint {
                date: NaiveDate::from_ymd_opt(2022, 12, 29).unwrap(),
                close: 20.0,
            },
        ],
        dividends: vec![DividendPayment {
            date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            amount: 0.5,
        }],
    }
}

fn config(workers: usize) -> BatchConfig {
    BatchConfig {
        exchange: Exchange::Raw,
        num_workers: workers,
        ..BatchConfig::default()
    }
}

#[tokio::test]
async fn test_records_written_per_year() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(StubProvider::default().with_report("ACM", acme_report()));
    let sink = Arc::new(YearlyCsvSink::new(dir.path(), "fin_data").unwrap());

    let summary = run_batch(
        provider,
        Arc::clone(&sink),
        vec!["ACM".to_string()],
        config(2),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_companies, 1);
    assert_eq!(summary.processed_companies, 1);
    assert_eq!(summary.failed_companies, 0);
    assert_eq!(summary.records_written, 2);

    for year in [2021, 2022] {
        let content = std::fs::read_to_string(sink.path_for(year)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2, "one header and one row for {}", year);
        assert!(lines[0].starts_with("Company code"));
        let row = lines[1];
        assert!(row.starts_with("ACM,Acme Ltd,Industrials,Machinery"));
        assert!(row.contains(",2.0,"), "EPS in {}", row);
        assert!(row.contains(",0.02,"), "ROA in {}", row);
        assert!(row.contains(",10.0,"), "P/E in {}", row);
    }

    // 2022 saw a dividend, 2021 did not
    let row_2021 = std::fs::read_to_string(sink.path_for(2021)).unwrap();
    assert!(row_2021.contains("NaN"));
    let row_2022 = std::fs::read_to_string(sink.path_for(2022)).unwrap();
    assert!(row_2022.contains(",0.5,"));
}

#[tokio::test]
async fn test_failed_company_is_isolated() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(
        StubProvider::default()
            .with_report("ACM", acme_report())
            .with_failure("BAD"),
    );
    let sink = Arc::new(YearlyCsvSink::new(dir.path(), "fin_data").unwrap());

    let summary = run_batch(
        provider,
        Arc::clone(&sink),
        vec!["BAD".to_string(), "ACM".to_string()],
        config(2),
    )
    .await
    .unwrap();

    assert_eq!(summary.total_companies, 2);
    assert_eq!(summary.processed_companies, 1);
    assert_eq!(summary.failed_companies, 1);
    assert_eq!(summary.records_written, 2);

    let content = std::fs::read_to_string(sink.path_for(2022)).unwrap();
    assert!(content.contains("ACM"));
    assert!(!content.contains("BAD"));
}

#[tokio::test]
async fn test_company_with_no_fiscal_years_yields_no_records() {
    let dir = tempdir().unwrap();
    let empty = CompanyReport {
        code: "NIL".to_string(),
        symbol: "NIL".to_string(),
        ..CompanyReport::default()
    };
    let provider = Arc::new(StubProvider::default().with_report("NIL", empty));
    let sink = Arc::new(YearlyCsvSink::new(dir.path(), "fin_data").unwrap());

    let summary = run_batch(provider, Arc::clone(&sink), vec!["NIL".to_string()], config(1))
        .await
        .unwrap();

    assert_eq!(summary.processed_companies, 1);
    assert_eq!(summary.failed_companies, 0);
    assert_eq!(summary.records_written, 0);
    assert!(sink.years_written().is_empty());
}

#[tokio::test]
async fn test_exchange_qualification_reaches_provider() {
    let dir = tempdir().unwrap();
    // Report keyed by the qualified symbol; the runner is handed the bare code
    let provider = Arc::new(StubProvider::default().with_report("ACM.AX", acme_report()));
    let sink = Arc::new(YearlyCsvSink::new(dir.path(), "asx_fin_data").unwrap());

    let batch_config = BatchConfig {
        exchange: Exchange::Asx,
        num_workers: 1,
        ..BatchConfig::default()
    };
    let summary = run_batch(provider, Arc::clone(&sink), vec!["ACM".to_string()], batch_config)
        .await
        .unwrap();

    assert_eq!(summary.processed_companies, 1);
    // Output carries the bare code, not the qualified symbol
    let content = std::fs::read_to_string(sink.path_for(2022)).unwrap();
    assert!(content.contains("ACM,Acme Ltd"));
    assert!(!content.contains("ACM.AX"));
}

#[tokio::test]
async fn test_max_companies_limit() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(
        StubProvider::default()
            .with_report("A", acme_report())
            .with_report("B", acme_report()),
    );
    let sink = Arc::new(YearlyCsvSink::new(dir.path(), "fin_data").unwrap());

    let batch_config = BatchConfig {
        exchange: Exchange::Raw,
        num_workers: 1,
        max_companies: Some(1),
        ..BatchConfig::default()
    };
    let summary = run_batch(
        provider,
        sink,
        vec!["A".to_string(), "B".to_string()],
        batch_config,
    )
    .await
    .unwrap();

    assert_eq!(summary.total_companies, 1);
    assert_eq!(summary.processed_companies, 1);
}
