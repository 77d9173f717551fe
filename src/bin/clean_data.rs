use anyhow::Result;
use clap::{Arg, Command};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use fin_ratios::clean::clean_yearly_file;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fin_ratios=info")),
        )
        .init();

    let matches = Command::new("clean_data")
        .version("0.1")
        .about("Drop unusable rows and duplicate companies from a yearly ratios file")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .help("Yearly ratios CSV to clean")
                .required(true),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").expect("required arg");
    let output = clean_yearly_file(Path::new(input))?;

    println!("✅ Cleaned data saved to {}", output.display());
    Ok(())
}
