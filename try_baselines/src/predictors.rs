//! The eight baseline methods behind one `fit` / `predict` interface.
//!
//! Average and WeightedAverage learn from the raw closing series and predict
//! one constant for every held-out date. The other six consume lagged
//! feature matrices and predict row by row.

use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use matlib::seeded_rng;
use pricecast::models::{
    CoordinateDescent, FeedForward, LassoFit, LinearFit, LossHistory, TrainingConfig, fit_least_squares,
};
use pricecast::{FeatureMatrix, ForecastError, Result, TimeSeries};
use stats::{linear_ramp, mean, weighted_mean};

/// Forecasting method identifiers, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Average,
    WeightedAverage,
    MovingAverage,
    WeightedMovingAverage,
    LinearRegression,
    WeightedLinearRegression,
    #[value(alias = "lasso")]
    #[serde(alias = "lasso")]
    RegularizedRegression,
    #[value(alias = "nn")]
    #[serde(alias = "nn")]
    WindowedNeuralRegressor,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Average,
        Method::WeightedAverage,
        Method::MovingAverage,
        Method::WeightedMovingAverage,
        Method::LinearRegression,
        Method::WeightedLinearRegression,
        Method::RegularizedRegression,
        Method::WindowedNeuralRegressor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Average => "Average",
            Method::WeightedAverage => "Weighted Average",
            Method::MovingAverage => "Moving Average",
            Method::WeightedMovingAverage => "Weighted Moving Average",
            Method::LinearRegression => "Linear Regression",
            Method::WeightedLinearRegression => "Weighted Linear Regression",
            Method::RegularizedRegression => "Lasso Regression",
            Method::WindowedNeuralRegressor => "Neural Network",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a predictor consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Series,
    Windows,
}

impl InputKind {
    fn describe(&self) -> &'static str {
        match self {
            InputKind::Series => "a raw series",
            InputKind::Windows => "a windowed feature matrix",
        }
    }
}

/// Training or prediction input. For a series method the prediction input
/// is the held-out slice; only its dates are read.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Series(&'a TimeSeries),
    Windows(&'a FeatureMatrix),
}

impl Input<'_> {
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Series(_) => InputKind::Series,
            Input::Windows(_) => InputKind::Windows,
        }
    }
}

/// Learned state of one method
#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    /// A single value predicted for every date
    Constant(f64),
    /// Per-column weights, normalised by their sum at prediction time
    LagWeights(Vec<f64>),
    Linear(LinearFit),
    Lasso(LassoFit),
    Network { net: FeedForward, history: LossHistory },
}

/// Immutable result of `fit`
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    method: Method,
    /// Feature width seen at fit time, `None` for series methods
    width: Option<usize>,
    state: ModelState,
}

impl FittedModel {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn width(&self) -> Option<usize> {
        self.width
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn loss_history(&self) -> Option<&LossHistory> {
        match &self.state {
            ModelState::Network { history, .. } => Some(history),
            _ => None,
        }
    }
}

/// Predicted values aligned 1:1 with a set of target dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSeries {
    pub method: Method,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl PredictionSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Uniform interface over the forecasting methods.
///
/// `fit` never mutates the predictor; all learned state lives in the
/// returned `FittedModel`.
pub trait Predictor {
    fn method(&self) -> Method;

    fn input_kind(&self) -> InputKind;

    /// Learn from `train`. `weights`, when given, holds one weight per
    /// training observation (oldest first).
    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel>;

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries>;
}

// ============================================================================
// Shared checks
// ============================================================================

fn expect_series<'a>(method: Method, input: &Input<'a>) -> Result<&'a TimeSeries> {
    match input {
        Input::Series(s) => Ok(*s),
        Input::Windows(_) => Err(ForecastError::InputKind {
            method: method.to_string(),
            expected: InputKind::Series.describe(),
        }),
    }
}

fn expect_windows<'a>(method: Method, input: &Input<'a>) -> Result<&'a FeatureMatrix> {
    match input {
        Input::Windows(m) => Ok(*m),
        Input::Series(_) => Err(ForecastError::InputKind {
            method: method.to_string(),
            expected: InputKind::Windows.describe(),
        }),
    }
}

fn check_weights(method: Method, weights: Option<&[f64]>, rows: usize) -> Result<()> {
    match weights {
        Some(w) if w.len() != rows => Err(ForecastError::ShapeMismatch {
            method: method.to_string(),
            what: "sample weights",
            expected: rows,
            got: w.len(),
        }),
        Some(w) if w.iter().any(|v| !v.is_finite() || *v < 0.0) => Err(ForecastError::InvalidWeights {
            method: method.to_string(),
            reason: "weights must be finite and non-negative",
        }),
        Some(w) if w.iter().sum::<f64>() <= 0.0 => Err(ForecastError::InvalidWeights {
            method: method.to_string(),
            reason: "weights sum to zero",
        }),
        _ => Ok(()),
    }
}

/// Windowed training needs at least as many rows as lag columns
fn check_training_windows(method: Method, train: &FeatureMatrix) -> Result<()> {
    if train.n_rows() < train.width() {
        return Err(ForecastError::InsufficientData {
            method: method.to_string(),
            rows: train.n_rows(),
            required: train.width(),
        });
    }
    if train.targets().len() != train.n_rows() {
        return Err(ForecastError::ShapeMismatch {
            method: method.to_string(),
            what: "training targets",
            expected: train.n_rows(),
            got: train.targets().len(),
        });
    }
    Ok(())
}

fn check_owner(method: Method, model: &FittedModel) -> Result<()> {
    if model.method != method {
        return Err(foreign_model(method, model));
    }
    Ok(())
}

fn check_width(model: &FittedModel, test: &FeatureMatrix) -> Result<()> {
    let expected = model.width.unwrap_or(0);
    if test.width() != expected {
        return Err(ForecastError::ShapeMismatch {
            method: model.method.to_string(),
            what: "feature width",
            expected,
            got: test.width(),
        });
    }
    Ok(())
}

fn foreign_model(method: Method, model: &FittedModel) -> ForecastError {
    ForecastError::InputKind {
        method: method.to_string(),
        expected: if model.method == method {
            "a model with matching state"
        } else {
            "a model fitted by the same method"
        },
    }
}

/// Lag label of the largest non-zero coefficient
fn strongest_lag(train: &FeatureMatrix, coefficients: &[f64]) -> Option<usize> {
    train
        .lag_labels()
        .into_iter()
        .zip(coefficients)
        .filter(|(_, c)| **c != 0.0)
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(lag, _)| lag)
}

fn predict_rows(method: Method, test: &FeatureMatrix, f: impl Fn(&[f64]) -> f64) -> PredictionSeries {
    PredictionSeries {
        method,
        dates: test.dates().to_vec(),
        values: test.rows().map(f).collect(),
    }
}

/// Fit and predict shared by the two constant-valued series methods
fn fit_constant(method: Method, train: &Input<'_>, weights: Option<&[f64]>, default_ramp: bool) -> Result<FittedModel> {
    let series = expect_series(method, train)?;
    if series.is_empty() {
        return Err(ForecastError::InsufficientData {
            method: method.to_string(),
            rows: 0,
            required: 1,
        });
    }
    check_weights(method, weights, series.len())?;

    let value = match weights {
        Some(w) => weighted_mean(series.values(), w),
        None if default_ramp => weighted_mean(series.values(), &linear_ramp(series.len())),
        None => mean(series.values()),
    };
    debug!(method = %method, value, n = series.len(), "fitted constant");

    Ok(FittedModel {
        method,
        width: None,
        state: ModelState::Constant(value),
    })
}

fn predict_constant(method: Method, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
    let target = expect_series(method, input)?;
    match model.state {
        ModelState::Constant(value) if model.method == method => Ok(PredictionSeries {
            method,
            dates: target.dates().to_vec(),
            values: vec![value; target.len()],
        }),
        _ => Err(foreign_model(method, model)),
    }
}

/// Fit and predict shared by the two moving averages
fn fit_lag_weights(method: Method, train: &Input<'_>, weights: Option<&[f64]>, lag_weights: fn(usize) -> Vec<f64>) -> Result<FittedModel> {
    let train = expect_windows(method, train)?;
    check_training_windows(method, train)?;
    check_weights(method, weights, train.n_rows())?;

    Ok(FittedModel {
        method,
        width: Some(train.width()),
        state: ModelState::LagWeights(lag_weights(train.width())),
    })
}

fn predict_lag_weights(method: Method, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
    let test = expect_windows(method, input)?;
    check_owner(method, model)?;
    let ModelState::LagWeights(w) = &model.state else {
        return Err(foreign_model(method, model));
    };
    check_width(model, test)?;
    Ok(predict_rows(method, test, |row| weighted_mean(row, w)))
}

fn fit_linear(method: Method, train: &Input<'_>, weights: Option<&[f64]>, default_ramp: bool) -> Result<FittedModel> {
    let train = expect_windows(method, train)?;
    check_training_windows(method, train)?;
    check_weights(method, weights, train.n_rows())?;

    let ramp;
    let weights = match weights {
        Some(w) => Some(w),
        None if default_ramp => {
            ramp = linear_ramp(train.n_rows());
            Some(ramp.as_slice())
        }
        None => None,
    };

    let fit = fit_least_squares(train.data(), train.n_rows(), train.width(), train.targets(), weights)
        .ok_or_else(|| ForecastError::InsufficientData {
            method: method.to_string(),
            rows: train.n_rows(),
            required: train.width(),
        })?;
    info!(
        method = %method,
        r_squared = fit.r_squared,
        strongest_lag = ?strongest_lag(train, &fit.coefficients),
        "fitted least squares"
    );

    Ok(FittedModel {
        method,
        width: Some(train.width()),
        state: ModelState::Linear(fit),
    })
}

fn predict_linear(method: Method, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
    let test = expect_windows(method, input)?;
    check_owner(method, model)?;
    let ModelState::Linear(fit) = &model.state else {
        return Err(foreign_model(method, model));
    };
    check_width(model, test)?;
    Ok(predict_rows(method, test, |row| fit.predict_row(row)))
}

// ============================================================================
// Methods
// ============================================================================

/// Unweighted mean of the training series
#[derive(Debug, Clone, Copy, Default)]
pub struct Average;

impl Predictor for Average {
    fn method(&self) -> Method {
        Method::Average
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Series
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_constant(self.method(), train, weights, false)
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_constant(self.method(), model, input)
    }
}

/// Mean of the training series with weights `(t+1)/N`, oldest to newest
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAverage;

impl Predictor for WeightedAverage {
    fn method(&self) -> Method {
        Method::WeightedAverage
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Series
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_constant(self.method(), train, weights, true)
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_constant(self.method(), model, input)
    }
}

/// Mean of each row's lag values
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverage;

impl Predictor for MovingAverage {
    fn method(&self) -> Method {
        Method::MovingAverage
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_lag_weights(self.method(), train, weights, |w| vec![1.0; w])
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_lag_weights(self.method(), model, input)
    }
}

/// Row mean with column weight `(j+1)/W`: the nearest lag counts most
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMovingAverage;

impl Predictor for WeightedMovingAverage {
    fn method(&self) -> Method {
        Method::WeightedMovingAverage
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_lag_weights(self.method(), train, weights, linear_ramp)
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_lag_weights(self.method(), model, input)
    }
}

/// Ordinary least squares on the lag columns
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegression;

impl Predictor for LinearRegression {
    fn method(&self) -> Method {
        Method::LinearRegression
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_linear(self.method(), train, weights, false)
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_linear(self.method(), model, input)
    }
}

/// Least squares with row weights `(k+1)/N` favouring recent training rows
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedLinearRegression;

impl Predictor for WeightedLinearRegression {
    fn method(&self) -> Method {
        Method::WeightedLinearRegression
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        fit_linear(self.method(), train, weights, true)
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        predict_linear(self.method(), model, input)
    }
}

/// Lasso regression on the lag columns
#[derive(Debug, Clone, Copy)]
pub struct RegularizedRegression {
    pub lambda: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for RegularizedRegression {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

impl Predictor for RegularizedRegression {
    fn method(&self) -> Method {
        Method::RegularizedRegression
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    /// Sample weights are validated but not used
    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        let method = self.method();
        let train = expect_windows(method, train)?;
        check_training_windows(method, train)?;
        check_weights(method, weights, train.n_rows())?;

        let mut cd = CoordinateDescent::new(train.data(), train.targets(), train.width());
        let lambda_max = cd.lambda_thresh(1.0);
        if self.lambda >= lambda_max {
            warn!(method = %method, lambda = self.lambda, lambda_max, "lambda zeroes every coefficient");
        }
        let fit = cd.core_train(1.0, self.lambda, self.max_iterations, self.tolerance);
        if !fit.converged {
            warn!(method = %method, sweeps = fit.iterations, "coordinate descent hit the sweep limit");
        }
        info!(
            method = %method,
            lambda = self.lambda,
            n_active = fit.n_active(),
            strongest_lag = ?strongest_lag(train, &fit.beta),
            explained = fit.explained,
            "fitted lasso"
        );

        Ok(FittedModel {
            method,
            width: Some(train.width()),
            state: ModelState::Lasso(fit),
        })
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        let method = self.method();
        let test = expect_windows(method, input)?;
        check_owner(method, model)?;
        let ModelState::Lasso(fit) = &model.state else {
            return Err(foreign_model(method, model));
        };
        check_width(model, test)?;
        Ok(predict_rows(method, test, |row| fit.predict_row(row)))
    }
}

/// Dense network over the lag columns, trained from a fixed seed
#[derive(Debug, Clone, Default)]
pub struct WindowedNeuralRegressor {
    pub training: TrainingConfig,
}

impl Predictor for WindowedNeuralRegressor {
    fn method(&self) -> Method {
        Method::WindowedNeuralRegressor
    }

    fn input_kind(&self) -> InputKind {
        InputKind::Windows
    }

    /// Sample weights are validated but not used
    fn fit(&self, train: &Input<'_>, weights: Option<&[f64]>) -> Result<FittedModel> {
        let method = self.method();
        let train = expect_windows(method, train)?;
        check_training_windows(method, train)?;
        check_weights(method, weights, train.n_rows())?;

        let mut rng = seeded_rng(self.training.seed);
        let mut net = FeedForward::windowed_regressor(&mut rng, train.width());
        let history = net.train(train.data(), train.targets(), &self.training);
        info!(
            method = %method,
            epochs = history.train.len(),
            final_train_loss = history.train.last().copied(),
            final_val_loss = history.validation.last().copied(),
            "trained network"
        );

        Ok(FittedModel {
            method,
            width: Some(train.width()),
            state: ModelState::Network { net, history },
        })
    }

    fn predict(&self, model: &FittedModel, input: &Input<'_>) -> Result<PredictionSeries> {
        let method = self.method();
        let test = expect_windows(method, input)?;
        check_owner(method, model)?;
        let ModelState::Network { net, .. } = &model.state else {
            return Err(foreign_model(method, model));
        };
        check_width(model, test)?;
        Ok(predict_rows(method, test, |row| net.predict(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricecast::build_windows;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::new(dates, values.to_vec()).unwrap()
    }

    fn matrix(width: usize, data: Vec<f64>, targets: Vec<f64>) -> FeatureMatrix {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let dates = (0..targets.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        FeatureMatrix::from_parts(width, data, targets, dates).unwrap()
    }

    #[test]
    fn test_average_is_constant() {
        let train = series(&[1.0, 2.0, 3.0, 6.0]);
        let target = series(&[10.0, 11.0, 12.0]);
        let model = Average.fit(&Input::Series(&train), None).unwrap();
        let pred = Average.predict(&model, &Input::Series(&target)).unwrap();

        assert_eq!(pred.values, vec![3.0; 3]);
        assert_eq!(pred.dates, target.dates());
    }

    #[test]
    fn test_weighted_average_uses_ramp() {
        // weights 1/3, 2/3, 1 -> (3 + 12 + 9) / 6
        let train = series(&[3.0, 6.0, 3.0]);
        let model = WeightedAverage.fit(&Input::Series(&train), None).unwrap();
        let pred = WeightedAverage.predict(&model, &Input::Series(&series(&[0.0, 0.0]))).unwrap();

        assert!((pred.values[0] - 4.0).abs() < 1e-12);
        assert_eq!(pred.values[0], pred.values[1]);
    }

    #[test]
    fn test_weighted_average_stays_in_range() {
        let train = series(&[5.0, 1.0, 9.0, 2.0, 7.0]);
        let model = WeightedAverage.fit(&Input::Series(&train), None).unwrap();
        let ModelState::Constant(v) = model.state() else {
            panic!("expected a constant");
        };
        assert!(*v >= 1.0 && *v <= 9.0);
    }

    #[test]
    fn test_average_needs_data() {
        let empty = TimeSeries::new(Vec::new(), Vec::new()).unwrap();
        let err = Average.fit(&Input::Series(&empty), None).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { rows: 0, .. }));
    }

    #[test]
    fn test_moving_average_three_by_two() {
        let m = matrix(2, vec![1.0, 3.0, 2.0, 6.0, 10.0, 20.0], vec![0.0; 3]);
        let model = MovingAverage.fit(&Input::Windows(&m), None).unwrap();
        let pred = MovingAverage.predict(&model, &Input::Windows(&m)).unwrap();
        assert_eq!(pred.values, vec![2.0, 4.0, 15.0]);
    }

    #[test]
    fn test_weighted_moving_average_normalised() {
        // weights 1/3, 2/3, 1 on [3, 6, 9] -> (1 + 4 + 9) / 2
        let m = matrix(3, vec![3.0, 6.0, 9.0, 1.0, 1.0, 1.0, 0.0, 0.0, 3.0], vec![0.0; 3]);
        let model = WeightedMovingAverage.fit(&Input::Windows(&m), None).unwrap();
        let pred = WeightedMovingAverage.predict(&model, &Input::Windows(&m)).unwrap();

        assert!((pred.values[0] - 7.0).abs() < 1e-12);
        assert!((pred.values[1] - 1.0).abs() < 1e-12);
        assert!((pred.values[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_linear_regression_recovers_trend() {
        // (i+2)^2 = 2 (i+1)^2 - i^2 + 2
        let values: Vec<f64> = (0..40).map(|i| (i as f64).powi(2)).collect();
        let s = series(&values);
        let train = build_windows(&s, 2, 0..30).unwrap();
        let test = build_windows(&s, 2, 30..38).unwrap();

        for predictor in [&LinearRegression as &dyn Predictor, &WeightedLinearRegression] {
            let model = predictor.fit(&Input::Windows(&train), None).unwrap();
            let pred = predictor.predict(&model, &Input::Windows(&test)).unwrap();
            for (p, a) in pred.values.iter().zip(test.targets()) {
                assert!((p - a).abs() < 1e-5, "{}: {} vs {}", predictor.method(), p, a);
            }
        }
    }

    #[test]
    fn test_explicit_weights_checked() {
        let m = matrix(1, vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]);
        let err = LinearRegression.fit(&Input::Windows(&m), Some(&[1.0, 1.0])).unwrap_err();
        assert_eq!(
            err,
            ForecastError::ShapeMismatch {
                method: "Linear Regression".to_string(),
                what: "sample weights",
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_insufficient_rows_for_width() {
        let m = matrix(80, vec![1.0; 5 * 80], vec![1.0; 5]);
        for method in [Method::MovingAverage, Method::LinearRegression, Method::RegularizedRegression] {
            let predictor: Box<dyn Predictor> = match method {
                Method::MovingAverage => Box::new(MovingAverage),
                Method::LinearRegression => Box::new(LinearRegression),
                _ => Box::new(RegularizedRegression::default()),
            };
            let err = predictor.fit(&Input::Windows(&m), None).unwrap_err();
            assert_eq!(
                err,
                ForecastError::InsufficientData {
                    method: method.to_string(),
                    rows: 5,
                    required: 80
                }
            );
        }
    }

    #[test]
    fn test_width_mismatch_on_predict() {
        let train = matrix(2, vec![1.0, 2.0, 2.0, 3.0], vec![3.0, 4.0]);
        let test = matrix(3, vec![1.0, 2.0, 3.0], vec![4.0]);
        let model = MovingAverage.fit(&Input::Windows(&train), None).unwrap();
        let err = MovingAverage.predict(&model, &Input::Windows(&test)).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ShapeMismatch {
                what: "feature width",
                expected: 2,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_input_kind() {
        let s = series(&[1.0, 2.0]);
        let err = MovingAverage.fit(&Input::Series(&s), None).unwrap_err();
        assert!(matches!(err, ForecastError::InputKind { .. }));

        let m = matrix(1, vec![1.0], vec![2.0]);
        assert!(Average.fit(&Input::Windows(&m), None).is_err());
    }

    #[test]
    fn test_negative_or_zero_weights_rejected() {
        let m = matrix(1, vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]);
        let err = WeightedLinearRegression
            .fit(&Input::Windows(&m), Some(&[1.0, -1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidWeights { .. }));

        let err = LinearRegression.fit(&Input::Windows(&m), Some(&[0.0; 3])).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InvalidWeights {
                method: "Linear Regression".to_string(),
                reason: "weights sum to zero"
            }
        );

        let s = series(&[1.0, 2.0]);
        let err = WeightedAverage.fit(&Input::Series(&s), Some(&[0.0, 0.0])).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidWeights { .. }));
        assert!(Average.fit(&Input::Series(&s), Some(&[f64::NAN, 1.0])).is_err());

        // Zero weights are fine when some row still carries weight
        assert!(LinearRegression.fit(&Input::Windows(&m), Some(&[0.0, 1.0, 1.0])).is_ok());
    }

    #[test]
    fn test_model_from_other_method_rejected() {
        let s = series(&[1.0, 2.0]);
        let model = Average.fit(&Input::Series(&s), None).unwrap();
        assert!(WeightedAverage.predict(&model, &Input::Series(&s)).is_err());

        // Same model state, different owner
        let train = matrix(2, vec![1.0, 2.0, 2.0, 4.0, 3.0, 5.0], vec![3.0, 5.0, 6.0]);
        let test = matrix(2, vec![4.0, 6.0], vec![7.0]);
        let model = MovingAverage.fit(&Input::Windows(&train), None).unwrap();
        let err = WeightedMovingAverage.predict(&model, &Input::Windows(&test)).unwrap_err();
        assert!(matches!(err, ForecastError::InputKind { .. }));

        let model = LinearRegression.fit(&Input::Windows(&train), None).unwrap();
        let err = WeightedLinearRegression.predict(&model, &Input::Windows(&test)).unwrap_err();
        assert!(matches!(err, ForecastError::InputKind { .. }));
        assert!(LinearRegression.predict(&model, &Input::Windows(&test)).is_ok());
    }

    #[test]
    fn test_lasso_large_lambda_predicts_mean() {
        let values: Vec<f64> = (0..30).map(|i| 50.0 + (i % 4) as f64).collect();
        let s = series(&values);
        let train = build_windows(&s, 3, 0..20).unwrap();
        let test = build_windows(&s, 3, 20..27).unwrap();
        let lasso = RegularizedRegression {
            lambda: 1e6,
            ..RegularizedRegression::default()
        };

        let model = lasso.fit(&Input::Windows(&train), None).unwrap();
        let pred = lasso.predict(&model, &Input::Windows(&test)).unwrap();
        let target_mean = mean(train.targets());
        assert!(pred.values.iter().all(|p| (p - target_mean).abs() < 1e-9));
        assert!(matches!(model.state(), ModelState::Lasso(fit) if fit.n_active() == 0));
    }

    #[test]
    fn test_strongest_lag_names_largest_coefficient() {
        let m = matrix(3, vec![1.0; 6], vec![1.0; 2]);
        // Columns hold lags 3, 2, 1
        assert_eq!(strongest_lag(&m, &[0.1, -2.0, 0.5]), Some(2));
        assert_eq!(strongest_lag(&m, &[0.0, 0.0, 0.3]), Some(1));
        assert_eq!(strongest_lag(&m, &[0.0; 3]), None);
    }

    #[test]
    fn test_network_reproducible_with_history() {
        let values: Vec<f64> = (0..60).map(|i| 1.0 + 0.1 * (i as f64 * 0.3).sin()).collect();
        let s = series(&values);
        let train = build_windows(&s, 4, 0..40).unwrap();
        let test = build_windows(&s, 4, 40..50).unwrap();
        let nn = WindowedNeuralRegressor {
            training: TrainingConfig {
                epochs: 5,
                ..TrainingConfig::default()
            },
        };

        let a = nn.fit(&Input::Windows(&train), None).unwrap();
        let b = nn.fit(&Input::Windows(&train), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.loss_history().map(|h| h.train.len()), Some(5));

        let pred = nn.predict(&a, &Input::Windows(&test)).unwrap();
        assert_eq!(pred.len(), 10);
        assert!(pred.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_method_names_unique() {
        let mut names: Vec<&str> = Method::ALL.iter().map(|m| m.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
