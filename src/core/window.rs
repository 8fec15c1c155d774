//! Sliding-window feature construction.
//!
//! Row `k` of a matrix built over rows `start..end` holds the `width` values
//! `series[i .. i + width]` (with `i = start + k`) in chronological order and
//! targets `series[i + width]`. Column `j` therefore carries lag label
//! `width - j`: the first column is the furthest lag, the last column is lag
//! 1, the value immediately preceding the target.

use std::ops::Range;

use chrono::NaiveDate;
use tracing::debug;

use crate::core::io::SplitPlan;
use crate::core::series::TimeSeries;
use crate::error::{ForecastError, Result};

/// Lagged features with aligned targets, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    data: Vec<f64>,
    targets: Vec<f64>,
    dates: Vec<NaiveDate>,
}

impl FeatureMatrix {
    /// Assemble a matrix from raw parts; `data` must hold `targets.len()` rows
    /// of `width` values and `dates` one entry per row.
    pub fn from_parts(
        width: usize,
        data: Vec<f64>,
        targets: Vec<f64>,
        dates: Vec<NaiveDate>,
    ) -> Result<Self> {
        if data.len() != width * targets.len() {
            return Err(ForecastError::ShapeMismatch {
                method: "FeatureMatrix".to_string(),
                what: "feature values",
                expected: width * targets.len(),
                got: data.len(),
            });
        }
        if dates.len() != targets.len() {
            return Err(ForecastError::ShapeMismatch {
                method: "FeatureMatrix".to_string(),
                what: "row dates",
                expected: targets.len(),
                got: dates.len(),
            });
        }
        Ok(Self {
            width,
            data,
            targets,
            dates,
        })
    }

    /// Number of lag columns
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        self.targets.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics; a zero-width matrix has no rows to yield
        self.data.chunks_exact(self.width.max(1))
    }

    /// Flat row-major feature values
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Date of each row's target
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Lag label of every column, `width` down to 1
    pub fn lag_labels(&self) -> Vec<usize> {
        (1..=self.width).rev().collect()
    }
}

/// Build the feature matrix for window rows `rows` of `series`.
///
/// Fails with `IndexRange` if the range is reversed, the width is zero, or
/// the last target would fall past the end of the series.
pub fn build_windows(series: &TimeSeries, width: usize, rows: Range<usize>) -> Result<FeatureMatrix> {
    let len = series.len();
    let out_of_range = ForecastError::IndexRange {
        start: rows.start,
        end: rows.end,
        width,
        len,
    };

    if width == 0 || rows.start > rows.end {
        return Err(out_of_range);
    }
    match rows.end.checked_add(width) {
        Some(last) if last <= len => {}
        _ => return Err(out_of_range),
    }

    let values = series.values();
    let n_rows = rows.len();
    let mut data = Vec::with_capacity(n_rows * width);
    let mut targets = Vec::with_capacity(n_rows);
    let mut dates = Vec::with_capacity(n_rows);

    for i in rows {
        data.extend_from_slice(&values[i..i + width]);
        targets.push(values[i + width]);
        dates.push(series.dates()[i + width]);
    }

    debug!(n_rows, width, "built feature matrix");

    Ok(FeatureMatrix {
        width,
        data,
        targets,
        dates,
    })
}

/// Train and test matrices built from one plan
#[derive(Debug, Clone)]
pub struct WindowedSplit {
    pub train: FeatureMatrix,
    pub test: FeatureMatrix,
}

impl WindowedSplit {
    pub fn build(series: &TimeSeries, plan: &SplitPlan) -> Result<Self> {
        Ok(Self {
            train: build_windows(series, plan.window_width, plan.train_rows())?,
            test: build_windows(series, plan.window_width, plan.test_rows())?,
        })
    }
}
