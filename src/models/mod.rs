pub mod lasso;
pub mod network;
pub mod ols;

pub use lasso::{CoordinateDescent, LassoFit};
pub use network::{Activation, DenseLayer, FeedForward, LossHistory, TrainingConfig};
pub use ols::{LinearFit, fit_least_squares};
