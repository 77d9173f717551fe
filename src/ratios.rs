//! Ratio engine: derive the per-fiscal-year financial indicators for one
//! company from its raw statement line items, market context, and dividends.
//!
//! The engine is pure and degrades field by field: a missing input or a zero
//! denominator yields `None` for that ratio only, never an error for the
//! whole record.

use chrono::{Datelike, NaiveDate};

use crate::models::{
    CompanyProfile, DividendPayment, LineItems, MarketContext, PricePoint, RatioRecord,
    ReportingPeriod,
};

// Provider line-item vocabulary.
pub const NET_INCOME: &str = "Net Income";
pub const BASIC_EPS: &str = "Basic EPS";
pub const STOCKHOLDERS_EQUITY: &str = "Stockholders Equity";
pub const TOTAL_ASSETS: &str = "Total Assets";
pub const TOTAL_EQUITY_GROSS_MINORITY: &str = "Total Equity Gross Minority Interest";
pub const TOTAL_DEBT: &str = "Total Debt";
pub const TOTAL_LIABILITIES: &str = "Total Liabilities Net Minority Interest";

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn item(items: &LineItems, name: &str) -> Option<f64> {
    items.get(name).copied().and_then(finite)
}

/// Guarded division: `None` on a missing operand, a zero denominator, or a
/// non-finite result.
fn div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => finite(n / d),
        _ => None,
    }
}

fn mul(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => finite(a * b),
        _ => None,
    }
}

/// Resolve the fiscal year's price as the last close traded on or before
/// December 31 of that year.
pub fn year_end_price(prices: &[PricePoint], year: i32) -> Option<f64> {
    let cutoff = NaiveDate::from_ymd_opt(year, 12, 31)?;
    prices
        .iter()
        .filter(|p| p.date <= cutoff)
        .max_by_key(|p| p.date)
        .and_then(|p| finite(p.close))
}

/// Total per-share dividends paid over the reporting period. `None` when the
/// period saw no payments, so dividend yield degrades instead of reading as
/// a genuine zero payout.
pub fn dividend_total(
    dividends: &[DividendPayment],
    period: ReportingPeriod,
    as_of: NaiveDate,
) -> Option<f64> {
    let mut total = 0.0;
    let mut seen = false;
    for payment in dividends {
        let in_period = match period {
            ReportingPeriod::FiscalYear(year) => payment.date.year() == year,
            ReportingPeriod::TrailingTwelveMonths => {
                payment.date > as_of - chrono::Duration::days(365) && payment.date <= as_of
            }
        };
        if in_period {
            total += payment.amount;
            seen = true;
        }
    }
    if seen {
        finite(total)
    } else {
        None
    }
}

/// Derive one `RatioRecord` for a single (company, fiscal year) pair.
///
/// Definitions settled here (the upstream data scripts disagreed between
/// variants): ROE is Net Income / Stockholders Equity and DAR is
/// Total Debt / Total Assets.
pub fn compute_ratios(
    code: &str,
    profile: &CompanyProfile,
    income: &LineItems,
    balance: &LineItems,
    market: &MarketContext,
    dividend_total: Option<f64>,
    year: i32,
) -> RatioRecord {
    let shares = market.shares_outstanding.and_then(finite);
    let price = market.year_end_price.and_then(finite);

    let net_income = item(income, NET_INCOME);
    let equity = item(balance, STOCKHOLDERS_EQUITY);
    let total_assets = item(balance, TOTAL_ASSETS);
    let total_debt = item(balance, TOTAL_DEBT);

    // Prefer the reported figure, fall back to deriving from net income.
    let eps = item(income, BASIC_EPS).or_else(|| div(net_income, shares));
    let bvps = div(equity, shares);

    RatioRecord {
        code: code.to_string(),
        name: profile.name.clone().unwrap_or_else(|| "N/A".to_string()),
        sector: profile.sector.clone().unwrap_or_else(|| "N/A".to_string()),
        industry: profile.industry.clone().unwrap_or_else(|| "N/A".to_string()),
        year,
        eps,
        bvps,
        roa: div(net_income, total_assets),
        roe: div(net_income, equity),
        div: dividend_total,
        pe_ratio: div(price, eps),
        dar: div(total_debt, total_assets),
        mb: div(price, bvps),
        dy: div(dividend_total, price),
        market_cap: mul(price, shares),
        total_assets,
        year_end_price: price,
    }
}
