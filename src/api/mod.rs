use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{CompanyProfile, CompanyReport, DividendPayment, LineItems, PricePoint};

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Provider failure taxonomy. Any of these is terminal for the company being
/// processed and must never abort the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("missing data in provider response: {0}")]
    MissingData(String),
}

/// Simple rate limiter for API requests
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// The market-data provider as the pipeline sees it: five independent
/// sub-queries per symbol.
#[async_trait]
pub trait FundamentalsProvider {
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError>;
    async fn get_income_statements(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError>;
    async fn get_balance_sheets(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError>;
    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, ProviderError>;
    async fn get_dividend_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<DividendPayment>, ProviderError>;
}

/// Run all sub-queries for one company. Any sub-query failure fails the whole
/// fetch; the caller isolates it to this company.
pub async fn fetch_company_report<P>(
    provider: &P,
    code: &str,
    symbol: &str,
) -> Result<CompanyReport, ProviderError>
where
    P: FundamentalsProvider + ?Sized,
{
    let profile = provider.get_profile(symbol).await?;
    let income_statements = provider.get_income_statements(symbol).await?;
    let balance_sheets = provider.get_balance_sheets(symbol).await?;
    let prices = provider.get_price_history(symbol).await?;
    let dividends = provider.get_dividend_history(symbol).await?;

    debug!(
        "Fetched {}: {} statement years, {} price points, {} dividend payments",
        symbol,
        income_statements.len(),
        prices.len(),
        dividends.len()
    );

    Ok(CompanyReport {
        code: code.to_string(),
        symbol: symbol.to_string(),
        profile,
        income_statements,
        balance_sheets,
        prices,
        dividends,
    })
}
