//! Small dense regression network trained with an explicit mini-batch loop.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use matlib::{glorot_uniform, seeded_rng, shuffled_indices};

/// Activation function types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Linear,
}

impl Activation {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::Linear => x,
        }
    }

    /// Derivative with respect to the pre-activation value
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
        }
    }
}

/// A fully connected layer; `weights` is `output_size x input_size` row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    pub activation: Activation,
    input_size: usize,
    output_size: usize,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero biases
    pub fn new<R: Rng>(rng: &mut R, input_size: usize, output_size: usize, activation: Activation) -> Self {
        Self {
            weights: glorot_uniform(rng, input_size, output_size),
            biases: vec![0.0; output_size],
            activation,
            input_size,
            output_size,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Pre-activation values
    fn linear(&self, input: &[f64]) -> Vec<f64> {
        (0..self.output_size)
            .map(|o| {
                let w = &self.weights[o * self.input_size..(o + 1) * self.input_size];
                self.biases[o] + w.iter().zip(input).map(|(a, b)| a * b).sum::<f64>()
            })
            .collect()
    }

    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.linear(input)
            .into_iter()
            .map(|z| self.activation.apply(z))
            .collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.input_size * self.output_size + self.output_size
    }
}

/// Optimiser and loop settings for `FeedForward::train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of rows, taken from the end, held out for validation
    pub validation_split: f64,
    pub learning_rate: f64,
    /// RMSprop decay of the squared-gradient average
    pub rho: f64,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 250,
            batch_size: 32,
            validation_split: 0.25,
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-7,
            seed: 42,
        }
    }
}

/// Per-epoch mean squared error on the training and validation rows.
/// `validation` is empty when no rows were held out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub train: Vec<f64>,
    pub validation: Vec<f64>,
}

/// Running squared-gradient averages for one layer
struct RmsProp {
    cache_w: Vec<f64>,
    cache_b: Vec<f64>,
}

impl RmsProp {
    fn new(layer: &DenseLayer) -> Self {
        Self {
            cache_w: vec![0.0; layer.weights.len()],
            cache_b: vec![0.0; layer.biases.len()],
        }
    }

    fn step(cache: &mut [f64], params: &mut [f64], grads: &[f64], cfg: &TrainingConfig) {
        for ((c, p), &g) in cache.iter_mut().zip(params.iter_mut()).zip(grads) {
            *c = cfg.rho * *c + (1.0 - cfg.rho) * g * g;
            *p -= cfg.learning_rate * g / (c.sqrt() + cfg.epsilon);
        }
    }

    fn update(&mut self, layer: &mut DenseLayer, grad_w: &[f64], grad_b: &[f64], cfg: &TrainingConfig) {
        Self::step(&mut self.cache_w, &mut layer.weights, grad_w, cfg);
        Self::step(&mut self.cache_b, &mut layer.biases, grad_b, cfg);
    }
}

/// Stack of dense layers ending in a single linear output unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForward {
    layers: Vec<DenseLayer>,
}

impl FeedForward {
    /// Hidden layers as `(units, activation)` followed by one linear output
    pub fn new<R: Rng>(rng: &mut R, input_size: usize, hidden: &[(usize, Activation)]) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut prev_size = input_size;
        for &(size, activation) in hidden {
            layers.push(DenseLayer::new(rng, prev_size, size, activation));
            prev_size = size;
        }
        layers.push(DenseLayer::new(rng, prev_size, 1, Activation::Linear));
        Self { layers }
    }

    /// 64 ReLU units, then 32 linear units, then the output
    pub fn windowed_regressor<R: Rng>(rng: &mut R, input_size: usize) -> Self {
        Self::new(rng, input_size, &[(64, Activation::ReLU), (32, Activation::Linear)])
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(DenseLayer::num_parameters).sum()
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut current = features.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current[0]
    }

    /// Mean squared error over the listed rows of `x` (row-major)
    pub fn mse(&self, x: &[f64], y: &[f64], rows: &[usize]) -> f64 {
        let width = self.input_size();
        if rows.is_empty() {
            return f64::NAN;
        }
        rows.iter()
            .map(|&r| (self.predict(&x[r * width..(r + 1) * width]) - y[r]).powi(2))
            .sum::<f64>()
            / rows.len() as f64
    }

    /// Train on `x` (`y.len()` rows of `input_size` values) for a fixed
    /// number of epochs. No early stopping.
    ///
    /// The last `validation_split` fraction of rows is held out. Each epoch
    /// shuffles the remaining rows, takes one RMSprop step per mini-batch and
    /// records the mean training loss and the validation loss.
    pub fn train(&mut self, x: &[f64], y: &[f64], cfg: &TrainingConfig) -> LossHistory {
        let width = self.input_size();
        let n_rows = y.len();
        let n_train = ((n_rows as f64) * (1.0 - cfg.validation_split)).floor() as usize;
        let n_train = n_train.clamp(1.min(n_rows), n_rows);
        let val_rows: Vec<usize> = (n_train..n_rows).collect();

        let mut rng = seeded_rng(cfg.seed.wrapping_add(1));
        let mut optim: Vec<RmsProp> = self.layers.iter().map(RmsProp::new).collect();
        let mut history = LossHistory::default();
        let batch_size = cfg.batch_size.max(1);

        for epoch in 0..cfg.epochs {
            let order = shuffled_indices(&mut rng, n_train);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(batch_size) {
                epoch_loss += self.train_batch(x, y, batch, width, &mut optim, cfg);
            }

            let train_loss = epoch_loss / n_train.max(1) as f64;
            history.train.push(train_loss);
            if !val_rows.is_empty() {
                history.validation.push(self.mse(x, y, &val_rows));
            }

            if epoch % 50 == 0 || epoch + 1 == cfg.epochs {
                debug!(epoch, train_loss, val_loss = history.validation.last().copied(), "epoch done");
            }
        }

        history
    }

    /// One gradient step on `batch`; returns the summed squared error
    /// measured before the step.
    fn train_batch(
        &mut self,
        x: &[f64],
        y: &[f64],
        batch: &[usize],
        width: usize,
        optim: &mut [RmsProp],
        cfg: &TrainingConfig,
    ) -> f64 {
        let n_layers = self.layers.len();
        let mut grad_w: Vec<Vec<f64>> = self.layers.iter().map(|l| vec![0.0; l.weights.len()]).collect();
        let mut grad_b: Vec<Vec<f64>> = self.layers.iter().map(|l| vec![0.0; l.biases.len()]).collect();
        let scale = 2.0 / batch.len() as f64;
        let mut sq_err = 0.0;

        for &r in batch {
            // Forward pass keeping inputs and pre-activations of every layer
            let mut inputs: Vec<Vec<f64>> = Vec::with_capacity(n_layers);
            let mut pre: Vec<Vec<f64>> = Vec::with_capacity(n_layers);
            let mut current = x[r * width..(r + 1) * width].to_vec();
            for layer in &self.layers {
                let z = layer.linear(&current);
                let a: Vec<f64> = z.iter().map(|&v| layer.activation.apply(v)).collect();
                inputs.push(current);
                pre.push(z);
                current = a;
            }

            let err = current[0] - y[r];
            sq_err += err * err;

            // Backward pass
            let mut upstream = vec![scale * err];
            for l in (0..n_layers).rev() {
                let layer = &self.layers[l];
                let delta: Vec<f64> = upstream
                    .iter()
                    .zip(&pre[l])
                    .map(|(g, &z)| g * layer.activation.derivative(z))
                    .collect();

                let n_in = layer.input_size;
                for (o, &d) in delta.iter().enumerate() {
                    if d == 0.0 {
                        continue;
                    }
                    grad_b[l][o] += d;
                    let gw = &mut grad_w[l][o * n_in..(o + 1) * n_in];
                    for (g, &a) in gw.iter_mut().zip(&inputs[l]) {
                        *g += d * a;
                    }
                }

                if l > 0 {
                    let mut next = vec![0.0; n_in];
                    for (o, &d) in delta.iter().enumerate() {
                        if d == 0.0 {
                            continue;
                        }
                        let w = &layer.weights[o * n_in..(o + 1) * n_in];
                        for (nv, &wv) in next.iter_mut().zip(w) {
                            *nv += wv * d;
                        }
                    }
                    upstream = next;
                }
            }
        }

        for (l, layer) in self.layers.iter_mut().enumerate() {
            optim[l].update(layer, &grad_w[l], &grad_b[l], cfg);
        }

        sq_err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Target is the mean of the inputs
    fn toy_data(rows: usize, width: usize) -> (Vec<f64>, Vec<f64>) {
        let mut x = Vec::with_capacity(rows * width);
        let mut y = Vec::with_capacity(rows);
        for r in 0..rows {
            let row: Vec<f64> = (0..width)
                .map(|c| (((r * 31 + c * 17) % 23) as f64) / 23.0)
                .collect();
            y.push(row.iter().sum::<f64>() / width as f64);
            x.extend(row);
        }
        (x, y)
    }

    fn small_config(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            epochs,
            batch_size: 8,
            validation_split: 0.25,
            learning_rate: 0.005,
            seed: 9,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_architecture() {
        let mut rng = seeded_rng(1);
        let net = FeedForward::windowed_regressor(&mut rng, 80);
        let sizes: Vec<(usize, usize)> = net
            .layers()
            .iter()
            .map(|l| (l.input_size(), l.output_size()))
            .collect();
        assert_eq!(sizes, vec![(80, 64), (64, 32), (32, 1)]);
        assert_eq!(net.layers()[0].activation, Activation::ReLU);
        assert_eq!(net.layers()[1].activation, Activation::Linear);
        assert_eq!(net.num_parameters(), 80 * 64 + 64 + 64 * 32 + 32 + 32 + 1);
    }

    #[test]
    fn test_history_lengths() {
        let (x, y) = toy_data(40, 5);
        let mut net = FeedForward::new(&mut seeded_rng(2), 5, &[(8, Activation::ReLU)]);
        let history = net.train(&x, &y, &small_config(12));

        assert_eq!(history.train.len(), 12);
        assert_eq!(history.validation.len(), 12);
        assert!(history.train.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_no_validation_rows() {
        let (x, y) = toy_data(20, 3);
        let cfg = TrainingConfig {
            validation_split: 0.0,
            ..small_config(3)
        };
        let mut net = FeedForward::new(&mut seeded_rng(2), 3, &[(4, Activation::ReLU)]);
        let history = net.train(&x, &y, &cfg);
        assert_eq!(history.train.len(), 3);
        assert!(history.validation.is_empty());
    }

    #[test]
    fn test_training_reduces_loss() {
        let (x, y) = toy_data(64, 6);
        let mut net = FeedForward::new(
            &mut seeded_rng(4),
            6,
            &[(16, Activation::ReLU), (8, Activation::Linear)],
        );
        let history = net.train(&x, &y, &small_config(200));

        let first = history.train[0];
        let last = *history.train.last().unwrap();
        assert!(last < first, "loss went from {} to {}", first, last);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = toy_data(30, 4);
        let cfg = small_config(10);

        let mut a = FeedForward::windowed_regressor(&mut seeded_rng(5), 4);
        let mut b = FeedForward::windowed_regressor(&mut seeded_rng(5), 4);
        let ha = a.train(&x, &y, &cfg);
        let hb = b.train(&x, &y, &cfg);

        assert_eq!(ha, hb);
        assert_eq!(a.predict(&x[..4]), b.predict(&x[..4]));
    }

    #[test]
    fn test_linear_gradient_step() {
        // Single linear unit, one row: the step moves the output toward the target
        let mut net = FeedForward::new(&mut seeded_rng(3), 2, &[]);
        let x = vec![1.0, 2.0];
        let y = vec![10.0];
        let before = (net.predict(&x) - 10.0).abs();

        let cfg = TrainingConfig {
            epochs: 5,
            batch_size: 1,
            validation_split: 0.0,
            learning_rate: 0.1,
            ..TrainingConfig::default()
        };
        net.train(&x, &y, &cfg);
        let after = (net.predict(&x) - 10.0).abs();
        assert!(after < before);
    }
}
