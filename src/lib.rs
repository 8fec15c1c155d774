//! Walk-forward baseline forecasting of a single closing-price series.
//!
//! - `core::series` - date-indexed series, split adjustment and the store
//! - `core::io` - CSV loading, experiment ranges, file output
//! - `core::window` - lagged feature matrices with aligned targets
//! - `models` - least squares, Lasso and a small feed-forward regressor

pub mod core;
pub mod error;
pub mod models;

pub use crate::core::io::{SeriesSplit, SplitPlan, load_close_series, output_path, write_output};
pub use crate::core::series::{SeriesStore, SplitAdjustment, TimeSeries};
pub use crate::core::window::{FeatureMatrix, WindowedSplit, build_windows};
pub use error::{ForecastError, Result};
