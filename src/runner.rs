//! Concurrent batch runner.
//!
//! Maps the fetch -> compute -> append pipeline over a company list with a
//! bounded pool of worker tasks. Companies share nothing but the append-only
//! output sink; one company's failure is logged and never stops the rest.

use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};

use crate::api::{fetch_company_report, FundamentalsProvider};
use crate::models::{Exchange, LineItems, MarketContext, PeriodPolicy, ReportingPeriod};
use crate::ratios::{compute_ratios, dividend_total, year_end_price};
use crate::sink::YearlyCsvSink;

/// Configuration for one batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub exchange: Exchange,
    pub num_workers: usize,
    pub period: PeriodPolicy,
    /// Optional limit on companies processed (for testing)
    pub max_companies: Option<usize>,
    /// Optional pause after each company, to stay under provider rate limits
    pub pause_between: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            exchange: Exchange::Raw,
            num_workers: 3,
            period: PeriodPolicy::CalendarYear,
            max_companies: None,
            pause_between: None,
        }
    }
}

/// Result of one batch run
#[derive(Debug)]
pub struct RunSummary {
    pub total_companies: usize,
    pub processed_companies: usize,
    pub failed_companies: usize,
    pub records_written: usize,
}

/// Internal counters shared by worker tasks
#[derive(Debug, Default)]
struct RunCounters {
    processed_companies: usize,
    failed_companies: usize,
    records_written: usize,
}

/// Process a company list concurrently and append one record per fiscal year
/// to the sink.
pub async fn run_batch(
    provider: Arc<dyn FundamentalsProvider + Send + Sync>,
    sink: Arc<YearlyCsvSink>,
    codes: Vec<String>,
    config: BatchConfig,
) -> Result<RunSummary> {
    let codes = match config.max_companies {
        Some(limit) => codes.into_iter().take(limit).collect::<Vec<_>>(),
        None => codes,
    };
    let total_companies = codes.len();

    info!(
        "Starting batch run: {} companies, {} workers",
        total_companies, config.num_workers
    );

    let queue = Arc::new(Mutex::new(codes));
    let counters = Arc::new(Mutex::new(RunCounters::default()));

    let mut handles = Vec::new();
    for worker_id in 0..config.num_workers.max(1) {
        let queue = Arc::clone(&queue);
        let provider = Arc::clone(&provider);
        let sink = Arc::clone(&sink);
        let counters = Arc::clone(&counters);
        let config = config.clone();

        let handle = tokio::spawn(async move {
            worker(worker_id, queue, provider, sink, counters, config).await
        });
        handles.push(handle);
    }

    for result in futures::future::join_all(handles).await {
        result??;
    }

    let counters = counters.lock().unwrap();
    let summary = RunSummary {
        total_companies,
        processed_companies: counters.processed_companies,
        failed_companies: counters.failed_companies,
        records_written: counters.records_written,
    };

    info!(
        "Batch run completed: {} processed, {} failed, {} records written",
        summary.processed_companies, summary.failed_companies, summary.records_written
    );

    Ok(summary)
}

async fn worker(
    worker_id: usize,
    queue: Arc<Mutex<Vec<String>>>,
    provider: Arc<dyn FundamentalsProvider + Send + Sync>,
    sink: Arc<YearlyCsvSink>,
    counters: Arc<Mutex<RunCounters>>,
    config: BatchConfig,
) -> Result<()> {
    loop {
        let code = {
            let mut queue = queue.lock().unwrap();
            if queue.is_empty() {
                break;
            }
            queue.remove(0)
        };

        match process_company(provider.as_ref(), &sink, &code, &config).await {
            Ok(records) => {
                info!(
                    "Worker {}: completed {} ({} records)",
                    worker_id, code, records
                );
                let mut counters = counters.lock().unwrap();
                counters.processed_companies += 1;
                counters.records_written += records;
            }
            Err(e) => {
                error!("Worker {}: failed {} - {:#}", worker_id, code, e);
                counters.lock().unwrap().failed_companies += 1;
            }
        }

        if let Some(pause) = config.pause_between {
            tokio::time::sleep(pause).await;
        }
    }

    Ok(())
}

/// Fetch one company and emit a record per fiscal year found in its income
/// statements. A sink write failure aborts this company only.
async fn process_company(
    provider: &(dyn FundamentalsProvider + Send + Sync),
    sink: &YearlyCsvSink,
    code: &str,
    config: &BatchConfig,
) -> Result<usize> {
    let symbol = config.exchange.qualify(code);
    let report = fetch_company_report(provider, code, &symbol).await?;

    let today = Utc::now().date_naive();
    let empty = LineItems::new();
    let mut written = 0;

    for (year, income) in &report.income_statements {
        let balance = report.balance_sheets.get(year).unwrap_or(&empty);
        let market = MarketContext {
            shares_outstanding: report.profile.shares_outstanding,
            year_end_price: year_end_price(&report.prices, *year),
        };
        let period = match config.period {
            PeriodPolicy::CalendarYear => ReportingPeriod::FiscalYear(*year),
            PeriodPolicy::TrailingTwelveMonths => ReportingPeriod::TrailingTwelveMonths,
        };
        let dividend = dividend_total(&report.dividends, period, today);

        let record = compute_ratios(
            code,
            &report.profile,
            income,
            balance,
            &market,
            dividend,
            *year,
        );
        sink.append(&record)?;
        written += 1;
    }

    Ok(written)
}
