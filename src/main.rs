use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fin_ratios::api::YahooClient;
use fin_ratios::models::{Config, Exchange, PeriodPolicy};
use fin_ratios::runner::{run_batch, BatchConfig};
use fin_ratios::sink::YearlyCsvSink;
use fin_ratios::universe::load_company_codes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fin_ratios=info")),
        )
        .init();

    let matches = Command::new("fin-ratios")
        .version("0.1")
        .about("Fetch company fundamentals and derive per-fiscal-year financial ratios")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .help("Company list CSV")
                .required(true),
        )
        .arg(
            Arg::new("column")
                .long("column")
                .value_name("NAME")
                .help("Column holding the company codes")
                .default_value("Ticker"),
        )
        .arg(
            Arg::new("exchange")
                .long("exchange")
                .value_name("EXCHANGE")
                .help("Exchange the codes belong to: asx, sgx, hkex, or raw")
                .default_value("raw"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Number of concurrent workers (defaults to NUM_WORKERS)"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .help("Only process the first N companies"),
        )
        .arg(
            Arg::new("out_dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Output directory for yearly files (defaults to OUTPUT_DIR)"),
        )
        .arg(
            Arg::new("period")
                .long("period")
                .value_name("POLICY")
                .help("Dividend aggregation period: year or ttm")
                .default_value("year"),
        )
        .arg(
            Arg::new("pause_ms")
                .long("pause-ms")
                .value_name("MS")
                .help("Pause between companies on each worker"),
        )
        .get_matches();

    let config = Config::from_env()?;

    let input = matches.get_one::<String>("input").expect("required arg");
    let column = matches.get_one::<String>("column").expect("has default");
    let exchange: Exchange = matches
        .get_one::<String>("exchange")
        .expect("has default")
        .parse()?;
    let period: PeriodPolicy = matches
        .get_one::<String>("period")
        .expect("has default")
        .parse()?;
    let workers = match matches.get_one::<String>("workers") {
        Some(w) => w.parse()?,
        None => config.num_workers,
    };
    let limit = matches
        .get_one::<String>("limit")
        .map(|l| l.parse())
        .transpose()?;
    let out_dir = matches
        .get_one::<String>("out_dir")
        .cloned()
        .unwrap_or_else(|| config.output_dir.clone());
    let pause_between = matches
        .get_one::<String>("pause_ms")
        .map(|p| p.parse::<u64>())
        .transpose()?
        .map(Duration::from_millis);

    let codes = load_company_codes(std::path::Path::new(input), column, limit)?;
    if codes.is_empty() {
        println!("❌ No company codes found in {}", input);
        return Ok(());
    }

    let provider = Arc::new(YahooClient::new(&config)?);
    let sink = Arc::new(YearlyCsvSink::new(&out_dir, exchange.file_prefix())?);

    info!(
        "Processing {} companies from {} ({:?})",
        codes.len(),
        input,
        exchange
    );

    let batch_config = BatchConfig {
        exchange,
        num_workers: workers,
        period,
        max_companies: limit,
        pause_between,
    };
    let summary = run_batch(provider, sink, codes, batch_config).await?;

    println!("📊 Batch run finished");
    println!(
        "   {} attempted, {} succeeded, {} failed, {} records written",
        summary.total_companies,
        summary.processed_companies,
        summary.failed_companies,
        summary.records_written
    );
    if summary.failed_companies > 0 {
        println!("⚠️  Some companies failed; see the log for reasons");
    } else {
        println!("✅ All companies processed");
    }

    Ok(())
}
