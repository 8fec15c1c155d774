use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised while loading, windowing, fitting, predicting or scoring.
///
/// `DataLoad` is fatal to a run. Every other variant is confined to the
/// method or scoring call that raised it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("cannot load series from {source_name}: {message}")]
    DataLoad { source_name: String, message: String },

    #[error("window rows {start}..{end} at width {width} exceed series of length {len}")]
    IndexRange {
        start: usize,
        end: usize,
        width: usize,
        len: usize,
    },

    #[error("{method}: insufficient training data, need at least {required} rows, got {rows}")]
    InsufficientData {
        method: String,
        rows: usize,
        required: usize,
    },

    #[error("{method}: shape mismatch for {what}, expected {expected}, got {got}")]
    ShapeMismatch {
        method: String,
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{method}: invalid sample weights, {reason}")]
    InvalidWeights { method: String, reason: &'static str },

    #[error("{method}: prediction and actual indices differ at position {position} ({predicted:?} vs {actual:?})")]
    Alignment {
        method: String,
        position: usize,
        predicted: Option<NaiveDate>,
        actual: Option<NaiveDate>,
    },

    #[error("{method}: expects {expected} input")]
    InputKind { method: String, expected: &'static str },
}

impl ForecastError {
    pub(crate) fn data_load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ForecastError::DataLoad {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
