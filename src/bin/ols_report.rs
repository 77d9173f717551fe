use anyhow::Result;
use clap::{Arg, Command};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use fin_ratios::regression::{fit_ols, load_regression_data, RESPONSE_COLUMN};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fin_ratios=info")),
        )
        .init();

    let matches = Command::new("ols_report")
        .version("0.1")
        .about("Regress year-end price on the derived ratios for one cleaned yearly file")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .help("Cleaned yearly ratios CSV")
                .required(true),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").expect("required arg");
    let (names, rows, response) = load_regression_data(Path::new(input))?;

    println!(
        "📈 Fitting {} ~ const + {} predictors on {} rows",
        RESPONSE_COLUMN,
        names.len(),
        response.len()
    );

    let fit = fit_ols(&names, &rows, &response)?;
    println!("{}", fit);

    Ok(())
}
