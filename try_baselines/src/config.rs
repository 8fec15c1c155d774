use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

use pricecast::models::TrainingConfig;
use pricecast::core::io::DATE_FORMAT;
use pricecast::{SplitAdjustment, SplitPlan};

use crate::predictors::Method;

const DEFAULT_SPLIT_DATE: &str = "2015-06-15";

/// Configuration for the baseline comparison
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "try_baselines")]
#[command(about = "One-step closing price forecasts from eight baseline methods, scored on a held-out window")]
#[serde(default)]
pub struct Config {
    /// Path to a CSV file with `Date` (YYYY-MM-DD) and `Close` columns
    #[arg(value_name = "DATA_FILE", default_value = "")]
    pub data_file: String,

    /// Read every option from this TOML file instead of the command line
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<String>,

    /// Number of lagged values per window
    #[arg(long, default_value_t = 80)]
    pub window_width: usize,

    /// Number of training windows
    #[arg(long, default_value_t = 100)]
    pub train_size: usize,

    /// Number of held-out dates to forecast
    #[arg(long, default_value_t = 68)]
    pub test_size: usize,

    /// Observations before the held-out dates
    #[arg(long, default_value_t = 180)]
    pub holdout_size: usize,

    /// Values dated before this day are divided by `split_divisor`
    #[arg(long, default_value = DEFAULT_SPLIT_DATE)]
    pub split_date: String,

    /// Stock split ratio
    #[arg(long, default_value_t = 2.0)]
    pub split_divisor: f64,

    /// Use the series as loaded, without split adjustment
    #[arg(long)]
    pub no_split: bool,

    /// L1 penalty for the Lasso regression
    #[arg(long, default_value_t = 1.0)]
    pub lasso_lambda: f64,

    /// Maximum coordinate descent sweeps
    #[arg(long, default_value_t = 1000)]
    pub lasso_max_iterations: usize,

    /// Convergence tolerance on the largest coefficient change
    #[arg(long, default_value_t = 1e-4)]
    pub lasso_tolerance: f64,

    /// Training epochs for the neural network
    #[arg(long, default_value_t = 250)]
    pub nn_epochs: usize,

    /// Mini-batch size for the neural network
    #[arg(long, default_value_t = 32)]
    pub nn_batch_size: usize,

    /// Fraction of training windows held out for validation
    #[arg(long, default_value_t = 0.25)]
    pub nn_validation_split: f64,

    /// RMSprop learning rate
    #[arg(long, default_value_t = 0.001)]
    pub nn_learning_rate: f64,

    /// Seed for network initialisation and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Comma separated methods to run (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub methods: Vec<Method>,

    /// Directory for the log, summary and plots
    #[arg(long, default_value = "results/")]
    pub output_path: String,

    /// Write PNG plots of predictions and network loss
    #[arg(long)]
    pub plot: bool,
}

impl Default for Config {
    fn default() -> Self {
        let plan = SplitPlan::default();
        let training = TrainingConfig::default();
        Self {
            data_file: String::new(),
            config: None,
            window_width: plan.window_width,
            train_size: plan.train_size,
            test_size: plan.test_size,
            holdout_size: plan.holdout_size,
            split_date: DEFAULT_SPLIT_DATE.to_string(),
            split_divisor: 2.0,
            no_split: false,
            lasso_lambda: 1.0,
            lasso_max_iterations: 1000,
            lasso_tolerance: 1e-4,
            nn_epochs: training.epochs,
            nn_batch_size: training.batch_size,
            nn_validation_split: training.validation_split,
            nn_learning_rate: training.learning_rate,
            seed: training.seed,
            methods: Vec::new(),
            output_path: "results/".to_string(),
            plot: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.data_file.is_empty() {
            anyhow::bail!("a data file is required");
        }

        if let Err(msg) = self.plan().validate() {
            anyhow::bail!("{}", msg);
        }

        if !self.no_split {
            self.split_cutoff()?;
            if !(self.split_divisor.is_finite() && self.split_divisor > 0.0) {
                anyhow::bail!("split_divisor must be positive, got {}", self.split_divisor);
            }
        }

        if self.lasso_lambda < 0.0 {
            anyhow::bail!("lasso_lambda must be non-negative, got {}", self.lasso_lambda);
        }

        if self.lasso_max_iterations == 0 {
            anyhow::bail!("lasso_max_iterations must be greater than 0");
        }

        if self.nn_epochs == 0 {
            anyhow::bail!("nn_epochs must be greater than 0");
        }

        if self.nn_batch_size == 0 {
            anyhow::bail!("nn_batch_size must be greater than 0");
        }

        if !(0.0..1.0).contains(&self.nn_validation_split) {
            anyhow::bail!(
                "nn_validation_split must be in range [0, 1), got {}",
                self.nn_validation_split
            );
        }

        if self.nn_learning_rate <= 0.0 {
            anyhow::bail!("nn_learning_rate must be positive, got {}", self.nn_learning_rate);
        }

        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn plan(&self) -> SplitPlan {
        SplitPlan {
            window_width: self.window_width,
            train_size: self.train_size,
            test_size: self.test_size,
            holdout_size: self.holdout_size,
        }
    }

    fn split_cutoff(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.split_date, DATE_FORMAT)
            .map_err(|e| anyhow::anyhow!("invalid split_date '{}': {}", self.split_date, e))
    }

    /// Split correction to apply on load, `None` with `--no-split`
    pub fn adjustment(&self) -> Result<Option<SplitAdjustment>> {
        if self.no_split {
            return Ok(None);
        }
        Ok(Some(SplitAdjustment::new(self.split_cutoff()?, self.split_divisor)))
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.nn_epochs,
            batch_size: self.nn_batch_size,
            validation_split: self.nn_validation_split,
            learning_rate: self.nn_learning_rate,
            seed: self.seed,
            ..TrainingConfig::default()
        }
    }

    /// Requested methods in reporting order, all of them if none were named
    pub fn selected_methods(&self) -> Vec<Method> {
        if self.methods.is_empty() {
            return Method::ALL.to_vec();
        }
        Method::ALL
            .into_iter()
            .filter(|m| self.methods.contains(m))
            .collect()
    }
}
