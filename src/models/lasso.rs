use serde::{Deserialize, Serialize};
use tracing::debug;

use matlib::{column_means, dot};

/// Fitted elastic-net coefficients in the original feature units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LassoFit {
    pub beta: Vec<f64>,
    pub intercept: f64,
    /// Fraction of centered target variance explained in-sample
    pub explained: f64,
    /// Coordinate sweeps performed
    pub iterations: usize,
    pub converged: bool,
}

impl LassoFit {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept + dot(&self.beta, row)
    }

    /// Number of nonzero coefficients
    pub fn n_active(&self) -> usize {
        self.beta.iter().filter(|&&b| b != 0.0).count()
    }
}

/// Coordinate descent for elastic-net regression with an intercept.
///
/// Minimises `(1/2n) |y - c - X b|^2 + lambda * (alpha |b|_1 + (1 - alpha)/2 |b|^2)`.
/// `alpha = 1` is the Lasso. Features and target are centered but not
/// scaled, so the penalty acts in the units of the data.
#[derive(Debug, Clone)]
pub struct CoordinateDescent {
    nvars: usize,
    ncases: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    xss: Vec<f64>,
    resid: Vec<f64>,
    beta: Vec<f64>,
    xmeans: Vec<f64>,
    ymean: f64,
}

impl CoordinateDescent {
    /// Copy and center the data. `xx` is `ncases x nvars` row-major.
    pub fn new(xx: &[f64], yy: &[f64], nvars: usize) -> Self {
        let ncases = yy.len();
        let xmeans = column_means(xx, ncases, nvars, None);
        let ymean = column_means(yy, ncases, 1, None)[0];

        let mut x = vec![0.0; ncases * nvars];
        for icase in 0..ncases {
            for ivar in 0..nvars {
                x[icase * nvars + ivar] = xx[icase * nvars + ivar] - xmeans[ivar];
            }
        }
        let y: Vec<f64> = yy.iter().map(|v| v - ymean).collect();

        // Mean square of each centered column
        let xss = (0..nvars)
            .map(|ivar| {
                (0..ncases)
                    .map(|icase| x[icase * nvars + ivar].powi(2))
                    .sum::<f64>()
                    / ncases.max(1) as f64
            })
            .collect();

        CoordinateDescent {
            nvars,
            ncases,
            resid: y.clone(),
            x,
            y,
            xss,
            beta: vec![0.0; nvars],
            xmeans,
            ymean,
        }
    }

    /// Smallest lambda at which every coefficient stays at zero
    pub fn lambda_thresh(&self, alpha: f64) -> f64 {
        let mut thresh: f64 = 0.0;
        for ivar in 0..self.nvars {
            let mut sum = 0.0;
            for icase in 0..self.ncases {
                sum += self.x[icase * self.nvars + ivar] * self.y[icase];
            }
            thresh = thresh.max((sum / self.ncases as f64).abs());
        }
        thresh / (alpha + 1.0e-60)
    }

    /// Run coordinate descent from zero coefficients.
    ///
    /// Sweeps alternate between all variables and only the active ones. The
    /// loop stops once a full sweep moves no coefficient by more than `eps`
    /// and leaves the active set unchanged, or after `maxits` sweeps.
    pub fn core_train(&mut self, alpha: f64, lambda: f64, maxits: usize, eps: f64) -> LassoFit {
        let s_threshold = alpha * lambda;
        let mut do_active_only = false;
        let mut converged = false;
        let mut iterations = 0;

        self.beta.iter_mut().for_each(|b| *b = 0.0);
        self.resid.copy_from_slice(&self.y);

        for _iter in 0..maxits {
            iterations += 1;
            let mut active_set_changed = false;
            let mut max_change: f64 = 0.0;

            for ivar in 0..self.nvars {
                if do_active_only && self.beta[ivar] == 0.0 {
                    continue;
                }

                let xss = self.xss[ivar];
                if xss <= 0.0 {
                    continue;
                }
                let update_factor = xss + lambda * (1.0 - alpha);

                // Argument to the soft-thresholding operator
                let mut residual_sum = 0.0;
                for icase in 0..self.ncases {
                    residual_sum += self.x[icase * self.nvars + ivar] * self.resid[icase];
                }
                let argument = residual_sum / self.ncases as f64 + xss * self.beta[ivar];

                let new_beta = if argument > 0.0 && s_threshold < argument {
                    (argument - s_threshold) / update_factor
                } else if argument < 0.0 && s_threshold < -argument {
                    (argument + s_threshold) / update_factor
                } else {
                    0.0
                };

                let correction = new_beta - self.beta[ivar];
                max_change = max_change.max(correction.abs());

                if correction != 0.0 {
                    for icase in 0..self.ncases {
                        self.resid[icase] -= correction * self.x[icase * self.nvars + ivar];
                    }
                    if (self.beta[ivar] == 0.0) != (new_beta == 0.0) {
                        active_set_changed = true;
                    }
                    self.beta[ivar] = new_beta;
                }
            }

            let sweep_converged = max_change < eps;

            if do_active_only {
                if sweep_converged {
                    do_active_only = false;
                }
            } else {
                if sweep_converged && !active_set_changed {
                    converged = true;
                    break;
                }
                do_active_only = true;
            }
        }

        let ss_res: f64 = self.resid.iter().map(|r| r * r).sum();
        let ss_tot: f64 = self.y.iter().map(|v| v * v).sum();
        let explained = if ss_tot > 0.0 { (ss_tot - ss_res) / ss_tot } else { 0.0 };

        let intercept = self.ymean - dot(&self.beta, &self.xmeans);

        let fit = LassoFit {
            beta: self.beta.clone(),
            intercept,
            explained,
            iterations,
            converged,
        };
        debug!(
            lambda,
            iterations,
            converged,
            n_active = fit.n_active(),
            "coordinate descent finished"
        );
        fit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = 5 + 2 x0, x1 unrelated
    fn data() -> (Vec<f64>, Vec<f64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let x0 = i as f64 / 4.0;
            let x1 = ((i * 7) % 5) as f64 - 2.0;
            x.push(x0);
            x.push(x1);
            y.push(5.0 + 2.0 * x0);
        }
        (x, y)
    }

    #[test]
    fn test_small_lambda_recovers_slope() {
        let (x, y) = data();
        let mut cd = CoordinateDescent::new(&x, &y, 2);
        let fit = cd.core_train(1.0, 0.01, 1000, 1e-9);

        assert!(fit.converged);
        assert!((fit.beta[0] - 2.0).abs() < 0.05);
        assert!(fit.beta[1].abs() < 0.05);
        assert!((fit.predict_row(&[4.0, 0.0]) - 13.0).abs() < 0.2);
        assert!(fit.explained > 0.99);
    }

    #[test]
    fn test_large_lambda_predicts_mean() {
        let (x, y) = data();
        let mut cd = CoordinateDescent::new(&x, &y, 2);
        let lambda = cd.lambda_thresh(1.0) * 1.01;
        let fit = cd.core_train(1.0, lambda, 1000, 1e-9);

        assert_eq!(fit.n_active(), 0);
        let ymean = y.iter().sum::<f64>() / y.len() as f64;
        assert!((fit.predict_row(&[100.0, -3.0]) - ymean).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficient() {
        let (x, y) = data();
        let mut cd = CoordinateDescent::new(&x, &y, 2);
        let light = cd.core_train(1.0, 0.01, 1000, 1e-9);
        let heavy = cd.core_train(1.0, 1.0, 1000, 1e-9);

        assert!(heavy.beta[0].abs() < light.beta[0].abs());
    }

    #[test]
    fn test_constant_column_is_ignored() {
        let x = vec![1.0, 3.0, 2.0, 3.0, 3.0, 3.0];
        let y = vec![1.0, 2.0, 3.0];
        let mut cd = CoordinateDescent::new(&x, &y, 2);
        let fit = cd.core_train(1.0, 0.0, 100, 1e-12);

        assert_eq!(fit.beta[1], 0.0);
        assert!((fit.beta[0] - 1.0).abs() < 1e-9);
    }
}
