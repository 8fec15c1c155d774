use crate::SingularValueDecomp;

/// Default relative singular-value cutoff for `least_squares`
pub const SVD_LIMIT: f64 = 1.0e-12;

/// Dot product of two equally long slices
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Minimum-norm least-squares solution of `x * beta = y`.
///
/// `x` is `rows x cols`, row-major. Singular values below `limit` times the
/// largest are treated as zero, so rank-deficient designs still yield a
/// solution. Returns `None` if the system is underdetermined
/// (`cols > rows`), the slices do not match the stated shape, the
/// decomposition does not converge or the solution is not finite.
pub fn least_squares(x: &[f64], rows: usize, cols: usize, y: &[f64], limit: f64) -> Option<Vec<f64>> {
    if x.len() != rows * cols || y.len() != rows {
        return None;
    }

    let mut svd = SingularValueDecomp::new(rows, cols)?;
    svd.a.copy_from_slice(x);
    svd.b.copy_from_slice(y);
    svd.svdcmp();
    if !svd.ok {
        return None;
    }

    let mut beta = vec![0.0; cols];
    svd.backsub(limit, &mut beta);
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Column means of a row-major `rows x cols` matrix, optionally weighted
pub fn column_means(x: &[f64], rows: usize, cols: usize, weights: Option<&[f64]>) -> Vec<f64> {
    let mut means = vec![0.0; cols];
    let mut wsum = 0.0;
    for icase in 0..rows {
        let w = weights.map_or(1.0, |w| w[icase]);
        wsum += w;
        for ivar in 0..cols {
            means[ivar] += w * x[icase * cols + ivar];
        }
    }
    if wsum > 0.0 {
        means.iter_mut().for_each(|m| *m /= wsum);
    }
    means
}
