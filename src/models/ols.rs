use serde::{Deserialize, Serialize};

use matlib::{SVD_LIMIT, column_means, dot, least_squares};

/// Linear model `y = intercept + coefficients . x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// In-sample (weighted) coefficient of determination
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept + dot(&self.coefficients, row)
    }
}

/// Ordinary or weighted least squares with an intercept.
///
/// Features and target are centered on their (weighted) means, each centered
/// row is scaled by `sqrt(weight)`, and the coefficients come from a
/// minimum-norm SVD solve. The intercept restores the means. `x` is
/// `rows x cols` row-major. Returns `None` for an underdetermined or
/// mis-shaped system, for negative weights and when the SVD fails.
pub fn fit_least_squares(
    x: &[f64],
    rows: usize,
    cols: usize,
    y: &[f64],
    weights: Option<&[f64]>,
) -> Option<LinearFit> {
    if rows == 0 || y.len() != rows || weights.is_some_and(|w| w.len() != rows) {
        return None;
    }
    if weights.is_some_and(|w| w.iter().any(|v| !(*v >= 0.0)) || w.iter().sum::<f64>() <= 0.0) {
        return None;
    }

    let xmeans = column_means(x, rows, cols, weights);
    let ymean = column_means(y, rows, 1, weights)[0];

    let mut xc = vec![0.0; rows * cols];
    let mut yc = vec![0.0; rows];
    for icase in 0..rows {
        let scale = weights.map_or(1.0, |w| w[icase].sqrt());
        for ivar in 0..cols {
            xc[icase * cols + ivar] = scale * (x[icase * cols + ivar] - xmeans[ivar]);
        }
        yc[icase] = scale * (y[icase] - ymean);
    }

    let coefficients = least_squares(&xc, rows, cols, &yc, SVD_LIMIT)?;
    let intercept = ymean - dot(&coefficients, &xmeans);

    // Centered, weight-scaled residuals give the weighted R^2 directly
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for icase in 0..rows {
        let pred = dot(&coefficients, &xc[icase * cols..(icase + 1) * cols]);
        ss_res += (yc[icase] - pred).powi(2);
        ss_tot += yc[icase].powi(2);
    }
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(LinearFit {
        coefficients,
        intercept,
        r_squared,
    })
}
