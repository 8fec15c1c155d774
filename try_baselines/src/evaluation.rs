use std::fmt;

use serde::Serialize;

use pricecast::{ForecastError, Result, TimeSeries};
use stats::{mean_absolute_error, mean_squared_error};

use crate::predictors::{Method, PredictionSeries};

/// Error measures of one prediction series against the held-out actuals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Number of scored dates
    pub n: usize,
}

/// Score `predicted` against `actual`.
///
/// Both must cover exactly the same dates in the same order. The first
/// differing position, or the end of the shorter index, is reported as an
/// `Alignment` error.
pub fn score(predicted: &PredictionSeries, actual: &TimeSeries) -> Result<Score> {
    let method = predicted.method.to_string();
    let (p_dates, a_dates) = (predicted.dates.as_slice(), actual.dates());

    let mismatch = p_dates
        .iter()
        .zip(a_dates)
        .position(|(p, a)| p != a)
        .or_else(|| (p_dates.len() != a_dates.len()).then(|| p_dates.len().min(a_dates.len())));
    if let Some(position) = mismatch {
        return Err(ForecastError::Alignment {
            method,
            position,
            predicted: p_dates.get(position).copied(),
            actual: a_dates.get(position).copied(),
        });
    }
    if predicted.values.len() != p_dates.len() {
        return Err(ForecastError::ShapeMismatch {
            method,
            what: "predicted values",
            expected: p_dates.len(),
            got: predicted.values.len(),
        });
    }
    if p_dates.is_empty() {
        return Err(ForecastError::InsufficientData {
            method,
            rows: 0,
            required: 1,
        });
    }

    let mse = mean_squared_error(&predicted.values, actual.values());
    Ok(Score {
        mse,
        rmse: mse.sqrt(),
        mae: mean_absolute_error(&predicted.values, actual.values()),
        n: p_dates.len(),
    })
}

/// One line of the comparison table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub method: Method,
    pub name: &'static str,
    pub score: Option<Score>,
    pub error: Option<String>,
}

/// Methods ranked by RMSE, lowest first. Failed methods follow the scored
/// ones in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonTable {
    rows: Vec<TableRow>,
}

impl ComparisonTable {
    pub fn new<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (Method, std::result::Result<Score, &'a ForecastError>)>,
    {
        let mut rows: Vec<TableRow> = outcomes
            .into_iter()
            .map(|(method, outcome)| match outcome {
                Ok(score) => TableRow {
                    method,
                    name: method.name(),
                    score: Some(score),
                    error: None,
                },
                Err(e) => TableRow {
                    method,
                    name: method.name(),
                    score: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        // Stable sort keeps failed rows in input order
        rows.sort_by(|a, b| match (&a.score, &b.score) {
            (Some(x), Some(y)) => x.rmse.total_cmp(&y.rmse),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Lowest-RMSE method, if any succeeded
    pub fn best(&self) -> Option<&TableRow> {
        self.rows.first().filter(|r| r.score.is_some())
    }

    pub fn n_failed(&self) -> usize {
        self.rows.iter().filter(|r| r.score.is_none()).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<5} {:<28} {:>14} {:>12} {:>12}",
            "Rank", "Method", "MSE", "RMSE", "MAE"
        )?;
        writeln!(f, "{}", "-".repeat(75))?;

        let mut rank = 0;
        for row in &self.rows {
            match (&row.score, &row.error) {
                (Some(s), _) => {
                    rank += 1;
                    writeln!(
                        f,
                        "{:<5} {:<28} {:>14.4} {:>12.4} {:>12.4}",
                        rank, row.name, s.mse, s.rmse, s.mae
                    )?;
                }
                (None, error) => {
                    writeln!(
                        f,
                        "{:<5} {:<28} failed: {}",
                        "-",
                        row.name,
                        error.as_deref().unwrap_or("unknown error")
                    )?;
                }
            }
        }
        Ok(())
    }
}
