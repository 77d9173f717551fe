//! Yahoo quote-API client.
//!
//! Statements and company metadata come from the `quoteSummary` endpoint,
//! price and dividend histories from the `chart` endpoint. All requests go
//! through the shared rate limiter. The base URL is injectable so tests can
//! point the client at a local mock server.

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use super::{ApiRateLimiter, FundamentalsProvider, ProviderError};
use crate::models::{CompanyProfile, Config, DividendPayment, LineItems, PricePoint};
use crate::ratios::{
    BASIC_EPS, NET_INCOME, STOCKHOLDERS_EQUITY, TOTAL_ASSETS, TOTAL_DEBT,
    TOTAL_EQUITY_GROSS_MINORITY, TOTAL_LIABILITIES,
};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Provider JSON field -> statement line-item name.
const INCOME_LINE_ITEMS: &[(&str, &str)] = &[("netIncome", NET_INCOME), ("basicEps", BASIC_EPS)];
const BALANCE_LINE_ITEMS: &[(&str, &str)] = &[
    ("totalAssets", TOTAL_ASSETS),
    ("totalStockholderEquity", STOCKHOLDERS_EQUITY),
    ("totalEquityGrossMinorityInterest", TOTAL_EQUITY_GROSS_MINORITY),
    ("totalDebt", TOTAL_DEBT),
    ("totalLiab", TOTAL_LIABILITIES),
];

pub struct YahooClient {
    client: Client,
    base_url: Url,
    rate_limiter: ApiRateLimiter,
}

impl YahooClient {
    /// Create a client against the live provider.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a client against an arbitrary base URL (tests use a mock server).
    pub fn with_base_url(config: &Config, base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent("fin-ratios/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_minute),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value, ProviderError> {
        self.rate_limiter.wait().await;

        debug!("Making request to: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch one or more `quoteSummary` modules and return the first result
    /// object.
    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value, ProviderError> {
        let mut url = self
            .base_url
            .join(&format!("v10/finance/quoteSummary/{}", symbol))
            .map_err(|e| ProviderError::MissingData(format!("bad symbol {}: {}", symbol, e)))?;
        url.query_pairs_mut().append_pair("modules", modules);

        let body = self.get_json(url).await?;
        let result = body
            .pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| ProviderError::SymbolNotFound(symbol.to_string()))?;
        Ok(result)
    }

    async fn chart(&self, symbol: &str) -> Result<Value, ProviderError> {
        let mut url = self
            .base_url
            .join(&format!("v8/finance/chart/{}", symbol))
            .map_err(|e| ProviderError::MissingData(format!("bad symbol {}: {}", symbol, e)))?;
        url.query_pairs_mut()
            .append_pair("range", "max")
            .append_pair("interval", "1d")
            .append_pair("events", "div");

        let body = self.get_json(url).await?;
        let result = body
            .pointer("/chart/result/0")
            .cloned()
            .ok_or_else(|| ProviderError::SymbolNotFound(symbol.to_string()))?;
        Ok(result)
    }
}

/// Numbers in `quoteSummary` responses are wrapped as `{"raw": ..., "fmt": ...}`;
/// accept a bare number as well.
fn raw_f64(value: &Value) -> Option<f64> {
    value
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| value.as_f64())
}

fn raw_i64(value: &Value) -> Option<i64> {
    value
        .get("raw")
        .and_then(Value::as_i64)
        .or_else(|| value.as_i64())
}

fn statement_year(statement: &Value) -> Option<i32> {
    let ts = statement.get("endDate").and_then(raw_i64)?;
    DateTime::from_timestamp(ts, 0).map(|dt| dt.year())
}

fn collect_line_items(statement: &Value, mapping: &[(&str, &str)]) -> LineItems {
    let mut items = LineItems::new();
    for (json_key, item_name) in mapping {
        if let Some(value) = statement.get(*json_key).and_then(raw_f64) {
            items.insert((*item_name).to_string(), value);
        }
    }
    items
}

/// Parse a statement-history module into per-year line items. Statements with
/// an unparseable end date are skipped.
fn parse_statement_history(
    module: &Value,
    list_pointer: &str,
    mapping: &[(&str, &str)],
) -> BTreeMap<i32, LineItems> {
    let mut by_year = BTreeMap::new();
    if let Some(statements) = module.pointer(list_pointer).and_then(Value::as_array) {
        for statement in statements {
            if let Some(year) = statement_year(statement) {
                by_year.insert(year, collect_line_items(statement, mapping));
            }
        }
    }
    by_year
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError> {
        let result = self
            .quote_summary(symbol, "price,assetProfile,defaultKeyStatistics")
            .await?;

        Ok(CompanyProfile {
            name: result
                .pointer("/price/longName")
                .and_then(Value::as_str)
                .map(str::to_string),
            sector: result
                .pointer("/assetProfile/sector")
                .and_then(Value::as_str)
                .map(str::to_string),
            industry: result
                .pointer("/assetProfile/industry")
                .and_then(Value::as_str)
                .map(str::to_string),
            shares_outstanding: result
                .pointer("/defaultKeyStatistics/sharesOutstanding")
                .and_then(raw_f64),
            previous_close: result
                .pointer("/price/regularMarketPreviousClose")
                .and_then(raw_f64),
        })
    }

    async fn get_income_statements(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError> {
        let result = self.quote_summary(symbol, "incomeStatementHistory").await?;
        Ok(parse_statement_history(
            &result,
            "/incomeStatementHistory/incomeStatementHistory",
            INCOME_LINE_ITEMS,
        ))
    }

    async fn get_balance_sheets(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<i32, LineItems>, ProviderError> {
        let result = self.quote_summary(symbol, "balanceSheetHistory").await?;
        Ok(parse_statement_history(
            &result,
            "/balanceSheetHistory/balanceSheetStatements",
            BALANCE_LINE_ITEMS,
        ))
    }

    async fn get_price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, ProviderError> {
        let result = self.chart(symbol).await?;

        let timestamps = result
            .pointer("/timestamp")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProviderError::MissingData(format!("no timestamps in chart for {}", symbol))
            })?;
        let closes = result
            .pointer("/indicators/quote/0/close")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProviderError::MissingData(format!("no close prices in chart for {}", symbol))
            })?;

        let mut prices = Vec::with_capacity(timestamps.len());
        for (ts, close) in timestamps.iter().zip(closes) {
            // Halted sessions come back as null closes; skip them
            let (Some(ts), Some(close)) = (ts.as_i64(), close.as_f64()) else {
                continue;
            };
            if let Some(dt) = DateTime::from_timestamp(ts, 0) {
                prices.push(PricePoint {
                    date: dt.date_naive(),
                    close,
                });
            }
        }
        prices.sort_by_key(|p| p.date);

        debug!("Retrieved {} price points for {}", prices.len(), symbol);
        Ok(prices)
    }

    async fn get_dividend_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<DividendPayment>, ProviderError> {
        let result = self.chart(symbol).await?;

        let mut dividends = Vec::new();
        if let Some(events) = result
            .pointer("/events/dividends")
            .and_then(Value::as_object)
        {
            for payment in events.values() {
                let (Some(ts), Some(amount)) = (
                    payment.get("date").and_then(Value::as_i64),
                    payment.get("amount").and_then(Value::as_f64),
                ) else {
                    continue;
                };
                if let Some(dt) = DateTime::from_timestamp(ts, 0) {
                    dividends.push(DividendPayment {
                        date: dt.date_naive(),
                        amount,
                    });
                }
            }
        }
        dividends.sort_by_key(|d| d.date);

        debug!(
            "Retrieved {} dividend payments for {}",
            dividends.len(),
            symbol
        );
        Ok(dividends)
    }
}
