pub mod config;
pub mod evaluation;
pub mod harness;
pub mod predictors;
pub mod report;
pub mod visualization;

pub use config::Config;
pub use evaluation::{ComparisonTable, Score, TableRow, score};
pub use harness::{ExperimentResult, MethodReport, MethodRun, build_predictor, build_predictors, run_experiment};
pub use predictors::{
    Average, FittedModel, Input, InputKind, LinearRegression, Method, ModelState, MovingAverage,
    PredictionSeries, Predictor, RegularizedRegression, WeightedAverage, WeightedLinearRegression,
    WeightedMovingAverage, WindowedNeuralRegressor,
};
pub use report::{Summary, write_results, write_summary};
pub use visualization::{plot_loss_history, plot_prediction};
