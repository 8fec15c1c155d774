use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::series::TimeSeries;
use crate::error::Result;

/// Single source of every range used by one experiment.
///
/// The windowed targets start where the non-windowed holdout starts, so the
/// two families of methods are always scored on the same dates:
///
/// ```text
/// |<------------- holdout_size ------------->|<-- test_size -->|
/// |<-- window_width -->|<---- train_size --->|
///                      ^ first train target   ^ first test target
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub window_width: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub holdout_size: usize,
}

/// Non-windowed view of one experiment
#[derive(Debug, Clone)]
pub struct SeriesSplit {
    /// Observations before the holdout boundary
    pub history: TimeSeries,
    /// Held-out observations every method is scored against
    pub actual: TimeSeries,
}

impl Default for SplitPlan {
    fn default() -> Self {
        Self {
            window_width: 80,
            train_size: 100,
            test_size: 68,
            holdout_size: 180,
        }
    }
}

impl SplitPlan {
    /// Check that the holdout boundary and the first test target coincide
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.window_width == 0 || self.train_size == 0 || self.test_size == 0 {
            return Err("window_width, train_size and test_size must be greater than 0".to_string());
        }
        if self.window_width + self.train_size != self.holdout_size {
            return Err(format!(
                "window_width ({}) + train_size ({}) must equal holdout_size ({})",
                self.window_width, self.train_size, self.holdout_size
            ));
        }
        Ok(())
    }

    /// Window rows used for training
    pub fn train_rows(&self) -> Range<usize> {
        0..self.train_size
    }

    /// Window rows used for testing
    pub fn test_rows(&self) -> Range<usize> {
        self.train_size..self.train_size + self.test_size
    }

    /// Series positions of the held-out targets
    pub fn actual_range(&self) -> Range<usize> {
        self.holdout_size..self.holdout_size + self.test_size
    }

    /// Minimum series length the plan needs
    pub fn required_len(&self) -> usize {
        self.holdout_size + self.test_size
    }

    /// Slice the history and the held-out actuals out of `series`
    pub fn split_series(&self, series: &TimeSeries) -> Result<SeriesSplit> {
        Ok(SeriesSplit {
            history: series.slice(0..self.holdout_size)?,
            actual: series.slice(self.actual_range())?,
        })
    }
}
