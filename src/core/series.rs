//! Date-indexed univariate series and the store that owns the adjusted copy.

use std::ops::Range;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::io::load_close_series;
use crate::error::{ForecastError, Result};

/// Ordered (date, value) pairs with strictly increasing unique dates.
///
/// Dates and values are kept in parallel vectors. No calendar is inferred:
/// consecutive entries are consecutive observations whatever their spacing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series, checking lengths and date ordering
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::data_load(
                "series",
                format!("{} dates but {} values", dates.len(), values.len()),
            ));
        }
        if let Some(pos) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::data_load(
                "series",
                format!(
                    "dates not strictly increasing at position {} ({} then {})",
                    pos + 1,
                    dates[pos],
                    dates[pos + 1]
                ),
            ));
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of `date`, found by binary search
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Value observed on `date`, if present
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.position(date).map(|i| self.values[i])
    }

    /// Sub-series over a positional range
    pub fn slice(&self, range: Range<usize>) -> Result<TimeSeries> {
        if range.start > range.end || range.end > self.len() {
            return Err(ForecastError::IndexRange {
                start: range.start,
                end: range.end,
                width: 0,
                len: self.len(),
            });
        }
        Ok(TimeSeries {
            dates: self.dates[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
        })
    }
}

/// Scalar correction for a stock split: every value dated strictly before
/// `cutoff` is divided by `divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitAdjustment {
    pub cutoff: NaiveDate,
    pub divisor: f64,
}

impl SplitAdjustment {
    pub fn new(cutoff: NaiveDate, divisor: f64) -> Self {
        Self { cutoff, divisor }
    }

    /// Return an adjusted copy of `series`
    pub fn apply(&self, series: &TimeSeries) -> TimeSeries {
        let values = series
            .dates
            .iter()
            .zip(&series.values)
            .map(|(&d, &v)| if d < self.cutoff { v / self.divisor } else { v })
            .collect();
        TimeSeries {
            dates: series.dates.clone(),
            values,
        }
    }
}

/// Owns the split-adjusted series. Only shared access is handed out, so the
/// series is immutable once the store exists.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    series: TimeSeries,
}

impl SeriesStore {
    pub fn new(series: TimeSeries, adjustment: Option<SplitAdjustment>) -> Result<Self> {
        let series = match adjustment {
            Some(adj) => {
                if !(adj.divisor.is_finite() && adj.divisor > 0.0) {
                    return Err(ForecastError::data_load(
                        "split adjustment",
                        format!("divisor must be positive and finite, got {}", adj.divisor),
                    ));
                }
                let n_adjusted = series.dates.iter().filter(|&&d| d < adj.cutoff).count();
                info!(
                    cutoff = %adj.cutoff,
                    divisor = adj.divisor,
                    n_adjusted,
                    "applied split adjustment"
                );
                adj.apply(&series)
            }
            None => series,
        };
        Ok(Self { series })
    }

    /// Load a `Date`/`Close` CSV and apply the adjustment once
    pub fn load<P: AsRef<Path>>(path: P, adjustment: Option<SplitAdjustment>) -> Result<Self> {
        let series = load_close_series(path)?;
        Self::new(series, adjustment)
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }
}
