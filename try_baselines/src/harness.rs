//! Runs every selected method against one split of the series.

use tracing::{info, warn};

use pricecast::{ForecastError, Result, SeriesSplit, SplitPlan, TimeSeries, WindowedSplit};

use crate::config::Config;
use crate::evaluation::{ComparisonTable, Score, score};
use crate::predictors::{
    Average, FittedModel, Input, InputKind, LinearRegression, Method, MovingAverage, PredictionSeries,
    Predictor, RegularizedRegression, WeightedAverage, WeightedLinearRegression, WeightedMovingAverage,
    WindowedNeuralRegressor,
};

/// Successful fit, prediction and score of one method
#[derive(Debug, Clone)]
pub struct MethodRun {
    pub model: FittedModel,
    pub predictions: PredictionSeries,
    pub score: Score,
}

#[derive(Debug, Clone)]
pub struct MethodReport {
    pub method: Method,
    pub outcome: std::result::Result<MethodRun, ForecastError>,
}

#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub plan: SplitPlan,
    /// History and actuals, absent if the series could not be split
    pub split: Option<SeriesSplit>,
    pub reports: Vec<MethodReport>,
    pub table: ComparisonTable,
}

impl ExperimentResult {
    pub fn report(&self, method: Method) -> Option<&MethodReport> {
        self.reports.iter().find(|r| r.method == method)
    }
}

/// Predictor for `method` with the settings from `config`
pub fn build_predictor(method: Method, config: &Config) -> Box<dyn Predictor> {
    match method {
        Method::Average => Box::new(Average),
        Method::WeightedAverage => Box::new(WeightedAverage),
        Method::MovingAverage => Box::new(MovingAverage),
        Method::WeightedMovingAverage => Box::new(WeightedMovingAverage),
        Method::LinearRegression => Box::new(LinearRegression),
        Method::WeightedLinearRegression => Box::new(WeightedLinearRegression),
        Method::RegularizedRegression => Box::new(RegularizedRegression {
            lambda: config.lasso_lambda,
            max_iterations: config.lasso_max_iterations,
            tolerance: config.lasso_tolerance,
        }),
        Method::WindowedNeuralRegressor => Box::new(WindowedNeuralRegressor {
            training: config.training(),
        }),
    }
}

pub fn build_predictors(config: &Config) -> Vec<Box<dyn Predictor>> {
    config
        .selected_methods()
        .into_iter()
        .map(|m| build_predictor(m, config))
        .collect()
}

fn run_method(
    predictor: &dyn Predictor,
    split: &Result<SeriesSplit>,
    windows: &Result<WindowedSplit>,
) -> Result<MethodRun> {
    let split = split.as_ref().map_err(Clone::clone)?;

    let (model, predictions) = match predictor.input_kind() {
        InputKind::Series => {
            let model = predictor.fit(&Input::Series(&split.history), None)?;
            let predictions = predictor.predict(&model, &Input::Series(&split.actual))?;
            (model, predictions)
        }
        InputKind::Windows => {
            let windows = windows.as_ref().map_err(Clone::clone)?;
            let model = predictor.fit(&Input::Windows(&windows.train), None)?;
            let predictions = predictor.predict(&model, &Input::Windows(&windows.test))?;
            (model, predictions)
        }
    };

    let score = score(&predictions, &split.actual)?;
    Ok(MethodRun {
        model,
        predictions,
        score,
    })
}

/// Fit, predict and score each predictor on the ranges given by `plan`.
///
/// Windows are built once and shared. A failing method, including one
/// that fails because the shared windows could not be built, is logged and
/// recorded while the remaining methods still run.
pub fn run_experiment(series: &TimeSeries, plan: &SplitPlan, predictors: &[Box<dyn Predictor>]) -> ExperimentResult {
    info!(
        n_obs = series.len(),
        window_width = plan.window_width,
        train_size = plan.train_size,
        test_size = plan.test_size,
        holdout_size = plan.holdout_size,
        "starting experiment"
    );
    if series.len() < plan.required_len() {
        warn!(
            n_obs = series.len(),
            required = plan.required_len(),
            "series is shorter than the plan needs"
        );
    }

    let split = plan.split_series(series);
    let windows = WindowedSplit::build(series, plan);

    let reports: Vec<MethodReport> = predictors
        .iter()
        .map(|predictor| {
            let method = predictor.method();
            let outcome = run_method(predictor.as_ref(), &split, &windows);
            match &outcome {
                Ok(run) => info!(
                    method = %method,
                    width = ?run.model.width(),
                    rmse = run.score.rmse,
                    mse = run.score.mse,
                    "method scored"
                ),
                Err(e) => warn!(method = %method, error = %e, "method failed"),
            }
            MethodReport { method, outcome }
        })
        .collect();

    let table = ComparisonTable::new(
        reports
            .iter()
            .map(|r| (r.method, r.outcome.as_ref().map(|run| run.score))),
    );

    ExperimentResult {
        plan: *plan,
        split: split.ok(),
        reports,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ramp_series(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let dates = (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect();
        let values = (0..n).map(|i| 100.0 + i as f64).collect();
        TimeSeries::new(dates, values).unwrap()
    }

    fn plan() -> SplitPlan {
        SplitPlan {
            window_width: 3,
            train_size: 10,
            test_size: 5,
            holdout_size: 13,
        }
    }

    fn quick_config() -> Config {
        Config {
            data_file: "unused.csv".to_string(),
            nn_epochs: 3,
            ..Config::default()
        }
    }

    #[test]
    fn test_all_methods_score_on_same_dates() {
        let series = ramp_series(20);
        let predictors = build_predictors(&quick_config());
        let result = run_experiment(&series, &plan(), &predictors);

        assert_eq!(result.reports.len(), 8);
        let actual = &series.dates()[13..18];
        for report in &result.reports {
            let run = report.outcome.as_ref().unwrap();
            assert_eq!(run.predictions.dates, actual, "{}", report.method);
            assert_eq!(run.score.n, 5);
            let expected_width = match report.method {
                Method::Average | Method::WeightedAverage => None,
                _ => Some(3),
            };
            assert_eq!(run.model.width(), expected_width, "{}", report.method);
        }
        assert_eq!(result.table.n_failed(), 0);
    }

    #[test]
    fn test_linear_trend_is_exact_for_regression() {
        let series = ramp_series(20);
        let predictors = vec![build_predictor(Method::LinearRegression, &quick_config())];
        let result = run_experiment(&series, &plan(), &predictors);
        let run = result.reports[0].outcome.as_ref().unwrap();
        assert!(run.score.rmse < 1e-6);
    }

    #[test]
    fn test_short_series_fails_every_method() {
        let series = ramp_series(12);
        assert!(series.len() < plan().required_len());
        let predictors = build_predictors(&quick_config());
        let result = run_experiment(&series, &plan(), &predictors);

        assert!(result.split.is_none());
        assert!(result.reports.iter().all(|r| r.outcome.is_err()));
        assert!(result.table.best().is_none());
    }

    #[test]
    fn test_order_does_not_change_results() {
        let series = ramp_series(20);
        let config = quick_config();
        let forward = build_predictors(&config);
        let reversed: Vec<Box<dyn Predictor>> = Method::ALL
            .iter()
            .rev()
            .map(|&m| build_predictor(m, &config))
            .collect();

        let a = run_experiment(&series, &plan(), &forward);
        let b = run_experiment(&series, &plan(), &reversed);
        for method in Method::ALL {
            let sa = a.report(method).unwrap().outcome.as_ref().unwrap().score;
            let sb = b.report(method).unwrap().outcome.as_ref().unwrap().score;
            assert_eq!(sa, sb, "{}", method);
        }
    }
}
