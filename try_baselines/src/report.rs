use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use pricecast::models::LossHistory;
use pricecast::{SplitPlan, output_path, write_output};

use crate::config::Config;
use crate::evaluation::TableRow;
use crate::harness::ExperimentResult;
use crate::predictors::Method;

pub const LOG_FILE: &str = "BASELINES.LOG";
pub const SUMMARY_FILE: &str = "summary.json";

/// Machine-readable experiment summary
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub data_file: &'a str,
    pub plan: SplitPlan,
    pub split_adjusted: bool,
    pub results: &'a [TableRow],
    /// Per-epoch network losses, if the network was trained
    pub loss_history: Option<&'a LossHistory>,
}

impl<'a> Summary<'a> {
    pub fn new(config: &'a Config, result: &'a ExperimentResult) -> Self {
        let loss_history = result
            .report(Method::WindowedNeuralRegressor)
            .and_then(|r| r.outcome.as_ref().ok())
            .and_then(|run| run.model.loss_history());
        Self {
            data_file: &config.data_file,
            plan: result.plan,
            split_adjusted: !config.no_split,
            results: result.table.rows(),
            loss_history,
        }
    }
}

/// Write configuration and the ranking table to `BASELINES.LOG` in `dir`
pub fn write_results<P: AsRef<Path>>(dir: P, config: &Config, result: &ExperimentResult) -> Result<PathBuf> {
    let path = output_path(dir, LOG_FILE)?;
    let mut file = File::create(&path)?;

    writeln!(file, "Baseline forecast comparison")?;
    writeln!(file, "{}", "=".repeat(75))?;
    writeln!(file, "Data file: {}", config.data_file)?;
    if config.no_split {
        writeln!(file, "Split adjustment: none")?;
    } else {
        writeln!(
            file,
            "Split adjustment: values before {} divided by {}",
            config.split_date, config.split_divisor
        )?;
    }
    writeln!(file, "Window width: {}", result.plan.window_width)?;
    writeln!(
        file,
        "Training windows: {}  Test dates: {}  Holdout boundary: {}",
        result.plan.train_size, result.plan.test_size, result.plan.holdout_size
    )?;
    writeln!(
        file,
        "Lasso: lambda={} max_iterations={} tolerance={}",
        config.lasso_lambda, config.lasso_max_iterations, config.lasso_tolerance
    )?;
    writeln!(
        file,
        "Network: epochs={} batch={} validation_split={} lr={} seed={}",
        config.nn_epochs, config.nn_batch_size, config.nn_validation_split, config.nn_learning_rate, config.seed
    )?;

    if let Some(split) = &result.split {
        if let (Some(first), Some(last)) = (split.actual.first_date(), split.actual.last_date()) {
            writeln!(file, "Scored dates: {} to {}", first, last)?;
        }
    }

    writeln!(file)?;
    write!(file, "{}", result.table)?;

    if let Some(best) = result.table.best() {
        writeln!(file)?;
        writeln!(file, "Best method: {}", best.name)?;
    }

    Ok(path)
}

/// Write the JSON summary to `summary.json` in `dir`
pub fn write_summary<P: AsRef<Path>>(dir: P, config: &Config, result: &ExperimentResult) -> Result<PathBuf> {
    let summary = Summary::new(config, result);
    let json = serde_json::to_string_pretty(&summary)?;
    Ok(write_output(dir, SUMMARY_FILE, json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{build_predictors, run_experiment};
    use chrono::NaiveDate;
    use pricecast::TimeSeries;
    use tempfile::tempdir;

    fn experiment(config: &Config) -> ExperimentResult {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let dates = (0..30).map(|i| start + chrono::Duration::days(i)).collect();
        let values = (0..30).map(|i| 50.0 + (i % 5) as f64).collect();
        let series = TimeSeries::new(dates, values).unwrap();
        run_experiment(&series, &config.plan(), &build_predictors(config))
    }

    fn config() -> Config {
        Config {
            data_file: "prices.csv".to_string(),
            window_width: 4,
            train_size: 12,
            test_size: 6,
            holdout_size: 16,
            nn_epochs: 2,
            ..Config::default()
        }
    }

    #[test]
    fn test_log_and_summary() {
        let dir = tempdir().unwrap();
        let config = config();
        let result = experiment(&config);

        let log = write_results(dir.path(), &config, &result).unwrap();
        let text = std::fs::read_to_string(log).unwrap();
        assert!(text.contains("Data file: prices.csv"));
        assert!(text.contains("Window width: 4"));
        assert!(text.contains("Best method:"));

        let summary = write_summary(dir.path(), &config, &result).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(summary).unwrap()).unwrap();
        assert_eq!(json["plan"]["window_width"], 4);
        assert_eq!(json["results"].as_array().map(|a| a.len()), Some(8));
        assert_eq!(json["loss_history"]["train"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_summary_without_network() {
        let config = Config {
            methods: vec![Method::Average],
            ..config()
        };
        let result = experiment(&config);
        let summary = Summary::new(&config, &result);
        assert!(summary.loss_history.is_none());
        assert_eq!(summary.results.len(), 1);
    }
}
