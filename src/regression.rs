//! Ordinary least squares on one cleaned yearly file: year-end price as the
//! response, the derived ratios as predictors, intercept included.

use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, Array2};
use std::fmt;
use std::path::Path;

pub const RESPONSE_COLUMN: &str = "Year end price";
pub const PREDICTOR_COLUMNS: &[&str] = &[
    "EPS",
    "BVPS",
    "ROA",
    "ROE",
    "DIV",
    "DAR",
    "MB",
    "DY",
    "P/E Ratio",
    "Market Cap",
    "Total Assets",
];

/// Fitted model: intercept first, then one coefficient per predictor.
#[derive(Debug)]
pub struct OlsFit {
    pub terms: Vec<(String, f64)>,
    pub r_squared: f64,
    pub observations: usize,
}

impl fmt::Display for OlsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OLS fit ({} observations)", self.observations)?;
        writeln!(f, "{:<16} {:>16}", "term", "coefficient")?;
        for (name, coef) in &self.terms {
            writeln!(f, "{:<16} {:>16.6}", name, coef)?;
        }
        write!(f, "R-squared: {:.4}", self.r_squared)
    }
}

/// Fit `response ~ const + predictors` via the normal equations.
pub fn fit_ols(names: &[String], rows: &[Vec<f64>], response: &[f64]) -> Result<OlsFit> {
    let n = response.len();
    let k = names.len();
    if rows.len() != n {
        return Err(anyhow!("predictor rows ({}) != responses ({})", rows.len(), n));
    }
    if n <= k + 1 {
        return Err(anyhow!(
            "need more than {} observations to fit {} predictors, got {}",
            k + 1,
            k,
            n
        ));
    }

    // Design matrix with a leading intercept column.
    let mut x = Array2::<f64>::zeros((n, k + 1));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != k {
            return Err(anyhow!("row {} has {} values, expected {}", i, row.len(), k));
        }
        x[[i, 0]] = 1.0;
        for (j, value) in row.iter().enumerate() {
            x[[i, j + 1]] = *value;
        }
    }
    let y = Array1::from(response.to_vec());

    let xtx = x.t().dot(&x);
    let xty = x.t().dot(&y);
    let beta = solve(xtx, xty)?;

    let fitted = x.dot(&beta);
    let y_mean = y.mean().unwrap_or(0.0);
    let ss_res: f64 = y
        .iter()
        .zip(fitted.iter())
        .map(|(yi, fi)| (yi - fi).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let mut terms = vec![("const".to_string(), beta[0])];
    for (j, name) in names.iter().enumerate() {
        terms.push((name.clone(), beta[j + 1]));
    }

    Ok(OlsFit {
        terms,
        r_squared,
        observations: n,
    })
}

/// Gaussian elimination with partial pivoting on the (small) normal-equation
/// system.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[[i, col]]
                    .abs()
                    .partial_cmp(&a[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(anyhow!(
                "design matrix is singular; a predictor may be constant or collinear"
            ));
        }
        if pivot != col {
            for j in 0..n {
                a.swap([col, j], [pivot, j]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for j in col..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for j in (row + 1)..n {
            acc -= a[[row, j]] * x[j];
        }
        x[row] = acc / a[[row, row]];
    }
    Ok(x)
}

/// Load response and predictor columns from a cleaned yearly file. Rows with
/// any remaining non-finite value are skipped.
pub fn load_regression_data(path: &Path) -> Result<(Vec<String>, Vec<Vec<f64>>, Vec<f64>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let response_index = headers
        .iter()
        .position(|h| h == RESPONSE_COLUMN)
        .ok_or_else(|| anyhow!("missing '{}' column in {}", RESPONSE_COLUMN, path.display()))?;
    let predictor_indexes: Vec<(String, usize)> = PREDICTOR_COLUMNS
        .iter()
        .filter_map(|name| {
            headers
                .iter()
                .position(|h| h == *name)
                .map(|i| (name.to_string(), i))
        })
        .collect();
    if predictor_indexes.is_empty() {
        return Err(anyhow!("no predictor columns found in {}", path.display()));
    }

    let mut rows = Vec::new();
    let mut response = Vec::new();
    for result in reader.records() {
        let record = result?;

        let y: Option<f64> = record
            .get(response_index)
            .and_then(|v| v.parse().ok())
            .filter(|v: &f64| v.is_finite());
        let xs: Option<Vec<f64>> = predictor_indexes
            .iter()
            .map(|(_, i)| {
                record
                    .get(*i)
                    .and_then(|v| v.parse().ok())
                    .filter(|v: &f64| v.is_finite())
            })
            .collect();

        if let (Some(y), Some(xs)) = (y, xs) {
            response.push(y);
            rows.push(xs);
        }
    }

    let names = predictor_indexes.into_iter().map(|(n, _)| n).collect();
    Ok((names, rows, response))
}
