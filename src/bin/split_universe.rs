use anyhow::Result;
use clap::{Arg, Command};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use fin_ratios::universe::split_universe;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fin_ratios=info")),
        )
        .init();

    let matches = Command::new("split_universe")
        .version("0.1")
        .about("Split a large company list into fixed-size part files")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .help("Company list CSV")
                .required(true),
        )
        .arg(
            Arg::new("rows_per_file")
                .long("rows-per-file")
                .value_name("N")
                .help("Rows per part file")
                .default_value("500"),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").expect("required arg");
    let rows_per_file: usize = matches
        .get_one::<String>("rows_per_file")
        .expect("has default")
        .parse()?;

    let parts = split_universe(Path::new(input), rows_per_file)?;

    println!("✅ Wrote {} part files:", parts.len());
    for part in parts {
        println!("   {}", part.display());
    }

    Ok(())
}
