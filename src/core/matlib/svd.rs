const EPSILON: f64 = 1e-60;
const MAX_SWEEPS: usize = 100;

/// Singular Value Decomposition for rectangular matrices
/// Matrix A (m x n) where m >= n, stored row-major.
///
/// Uses one-sided Jacobi rotations: columns of `a` are rotated pairwise
/// until mutually orthogonal. On return `a` holds U (unit columns), `w` the
/// singular values and `v` the right singular vectors.
pub struct SingularValueDecomp {
    pub rows: usize,
    pub cols: usize,
    pub ok: bool,

    pub a: Vec<f64>, // Design matrix (rows x cols), replaced by U
    pub w: Vec<f64>, // Singular values (cols)
    pub v: Vec<f64>, // Right singular vectors (cols x cols)
    pub b: Vec<f64>, // Right-hand side (rows)
}

impl SingularValueDecomp {
    /// Create a new SVD decomposition object
    ///
    /// # Arguments
    /// * `rows` - Number of rows (m)
    /// * `cols` - Number of columns (n), must be <= rows
    pub fn new(rows: usize, cols: usize) -> Option<Self> {
        if cols > rows || cols == 0 {
            return None;
        }

        Some(SingularValueDecomp {
            rows,
            cols,
            ok: true,
            a: vec![0.0; rows * cols],
            w: vec![0.0; cols],
            v: vec![0.0; cols * cols],
            b: vec![0.0; rows],
        })
    }

    /// Helper function: compute sqrt(x^2 + y^2) avoiding overflow/underflow
    fn root_ss(x: f64, y: f64) -> f64 {
        let x = x.abs();
        let y = y.abs();

        if x > y {
            let ratio = y / x;
            x * (ratio * ratio + 1.0).sqrt()
        } else if y == 0.0 {
            0.0
        } else {
            let ratio = x / y;
            y * (ratio * ratio + 1.0).sqrt()
        }
    }

    /// Perform singular value decomposition in place.
    ///
    /// `ok` is cleared if the rotations fail to converge.
    pub fn svdcmp(&mut self) {
        let (m, n) = (self.rows, self.cols);

        self.v.iter_mut().for_each(|x| *x = 0.0);
        for i in 0..n {
            self.v[i * n + i] = 1.0;
        }

        let mut converged = false;
        for _ in 0..MAX_SWEEPS {
            let mut rotated = false;

            for p in 0..n {
                for q in (p + 1)..n {
                    let mut alpha = 0.0;
                    let mut beta = 0.0;
                    let mut gamma = 0.0;
                    for i in 0..m {
                        let ap = self.a[i * n + p];
                        let aq = self.a[i * n + q];
                        alpha += ap * ap;
                        beta += aq * aq;
                        gamma += ap * aq;
                    }

                    if gamma == 0.0 || gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() {
                        continue;
                    }
                    rotated = true;

                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
                    let t = sign / (zeta.abs() + Self::root_ss(zeta, 1.0));
                    let cosine = 1.0 / Self::root_ss(t, 1.0);
                    let sine = cosine * t;

                    for i in 0..m {
                        let x = self.a[i * n + p];
                        let y = self.a[i * n + q];
                        self.a[i * n + p] = cosine * x - sine * y;
                        self.a[i * n + q] = sine * x + cosine * y;
                    }
                    for i in 0..n {
                        let x = self.v[i * n + p];
                        let y = self.v[i * n + q];
                        self.v[i * n + p] = cosine * x - sine * y;
                        self.v[i * n + q] = sine * x + cosine * y;
                    }
                }
            }

            if !rotated {
                converged = true;
                break;
            }
        }
        self.ok = converged;

        // Column norms are the singular values; normalize U
        for j in 0..n {
            let norm = (0..m)
                .map(|i| self.a[i * n + j] * self.a[i * n + j])
                .sum::<f64>()
                .sqrt();
            self.w[j] = norm;
            if norm > 0.0 {
                for i in 0..m {
                    self.a[i * n + j] /= norm;
                }
            }
        }
    }

    /// Back-substitution to solve Ax = b in the least-squares sense
    ///
    /// # Arguments
    /// * `limit` - Singular value threshold (relative to max singular value)
    /// * `soln` - Output: solution vector
    pub fn backsub(&self, limit: f64, soln: &mut [f64]) {
        let (m, n) = (self.rows, self.cols);

        let wmax = self.w.iter().cloned().fold(0.0, f64::max);
        let limit = limit * wmax + EPSILON;

        // Find U'b
        let mut utb = vec![0.0; n];
        for j in 0..n {
            if self.w[j] > limit {
                let mut sum = 0.0;
                for i in 0..m {
                    sum += self.a[i * n + j] * self.b[i];
                }
                utb[j] = sum / self.w[j];
            }
        }

        // Multiply by V to complete the solution
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += self.v[i * n + j] * utb[j];
            }
            soln[i] = sum;
        }
    }
}
