use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Named statement line item -> reported value. A missing item is an absent key.
pub type LineItems = HashMap<String, f64>;

/// Exchange the company list belongs to, used to qualify bare company codes
/// into provider symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Asx,
    Sgx,
    Hkex,
    /// Codes are already full provider symbols; pass them through unchanged.
    Raw,
}

impl Exchange {
    /// Map a bare company code to the provider's symbol for this exchange.
    pub fn qualify(&self, code: &str) -> String {
        match self {
            Exchange::Asx => format!("{}.AX", code),
            Exchange::Sgx => format!("{}.SI", code),
            // HKEX codes are numeric and zero-padded to four digits
            Exchange::Hkex => format!("{:0>4}.HK", code),
            Exchange::Raw => code.to_string(),
        }
    }

    /// Output file prefix, one family of yearly files per exchange.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Exchange::Asx => "asx_fin_data",
            Exchange::Sgx => "sgx_fin_data",
            Exchange::Hkex => "hk_fin_data",
            Exchange::Raw => "fin_data",
        }
    }
}

impl FromStr for Exchange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asx" => Ok(Exchange::Asx),
            "sgx" => Ok(Exchange::Sgx),
            "hkex" | "hk" => Ok(Exchange::Hkex),
            "raw" | "none" => Ok(Exchange::Raw),
            other => Err(anyhow::anyhow!("unknown exchange: {}", other)),
        }
    }
}

/// Company metadata returned by the provider alongside the statements.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub shares_outstanding: Option<f64>,
    pub previous_close: Option<f64>,
}

/// One closing price observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One cash dividend payment, amount is per share as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendPayment {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Everything fetched for one company in a single pass: statements keyed by
/// fiscal year, plus the full price and dividend histories.
#[derive(Debug, Clone, Default)]
pub struct CompanyReport {
    pub code: String,
    pub symbol: String,
    pub profile: CompanyProfile,
    pub income_statements: BTreeMap<i32, LineItems>,
    pub balance_sheets: BTreeMap<i32, LineItems>,
    pub prices: Vec<PricePoint>,
    pub dividends: Vec<DividendPayment>,
}

impl CompanyReport {
    /// Fiscal years with an income statement, in ascending order.
    pub fn fiscal_years(&self) -> Vec<i32> {
        self.income_statements.keys().copied().collect()
    }
}

/// Period a dividend total is aggregated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingPeriod {
    /// Payments dated within the calendar year.
    FiscalYear(i32),
    /// Payments within the 365 days before the as-of date.
    TrailingTwelveMonths,
}

/// Run-level choice of reporting period, resolved per fiscal year by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPolicy {
    CalendarYear,
    TrailingTwelveMonths,
}

impl FromStr for PeriodPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "year" | "fiscal" => Ok(PeriodPolicy::CalendarYear),
            "ttm" => Ok(PeriodPolicy::TrailingTwelveMonths),
            other => Err(anyhow::anyhow!("unknown period policy: {}", other)),
        }
    }
}

/// Market inputs the ratio engine needs besides the statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketContext {
    pub shares_outstanding: Option<f64>,
    pub year_end_price: Option<f64>,
}

/// One output row: identification fields plus the derived ratios for a single
/// (company, fiscal year) pair. A ratio that could not be computed is `None`
/// and serializes as the `NaN` sentinel.
#[derive(Debug, Clone, Serialize)]
pub struct RatioRecord {
    #[serde(rename = "Company code")]
    pub code: String,
    #[serde(rename = "Company Name")]
    pub name: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "EPS", serialize_with = "nan_when_missing")]
    pub eps: Option<f64>,
    #[serde(rename = "BVPS", serialize_with = "nan_when_missing")]
    pub bvps: Option<f64>,
    #[serde(rename = "ROA", serialize_with = "nan_when_missing")]
    pub roa: Option<f64>,
    #[serde(rename = "ROE", serialize_with = "nan_when_missing")]
    pub roe: Option<f64>,
    #[serde(rename = "DIV", serialize_with = "nan_when_missing")]
    pub div: Option<f64>,
    #[serde(rename = "P/E Ratio", serialize_with = "nan_when_missing")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "DAR", serialize_with = "nan_when_missing")]
    pub dar: Option<f64>,
    #[serde(rename = "MB", serialize_with = "nan_when_missing")]
    pub mb: Option<f64>,
    #[serde(rename = "DY", serialize_with = "nan_when_missing")]
    pub dy: Option<f64>,
    #[serde(rename = "Market Cap", serialize_with = "nan_when_missing")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Total Assets", serialize_with = "nan_when_missing")]
    pub total_assets: Option<f64>,
    #[serde(rename = "Year end price", serialize_with = "nan_when_missing")]
    pub year_end_price: Option<f64>,
}

/// Serialize an uncomputable field as the `NaN` sentinel rather than an empty
/// cell, so downstream cleaning can spot it unambiguously.
fn nan_when_missing<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str("NaN"),
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: String,
    pub rate_limit_per_minute: u32,
    pub num_workers: usize,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            num_workers: std::env::var("NUM_WORKERS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }
}
