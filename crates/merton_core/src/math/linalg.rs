//! Dense linear algebra for small systems.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. The systems solved here are tiny
//! (the Merton inversion is 2×2, the logistic calibration 2×2), so plain
//! elimination is preferred over pulling in a matrix library.

/// Euclidean norm of a vector.
#[inline]
pub fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Compute `A x`.
pub fn mat_vec(a: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(x).map(|(aij, xj)| aij * xj).sum())
        .collect()
}

/// Compute `Aᵀ x`.
pub fn mat_t_vec(a: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    let n_cols = a.first().map_or(0, Vec::len);
    let mut out = vec![0.0; n_cols];
    for (row, &xi) in a.iter().zip(x) {
        for (o, &aij) in out.iter_mut().zip(row) {
            *o += aij * xi;
        }
    }
    out
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` if `A` is not square, dimensions disagree, or a pivot
/// falls below `n·ε` times the largest entry of `A`.
///
/// # Examples
///
/// ```
/// use merton_core::math::linalg::solve_linear;
///
/// let a = vec![vec![0.0, 2.0], vec![3.0, 1.0]];
/// let x = solve_linear(&a, &[4.0, 5.0]).unwrap();
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// ```
pub fn solve_linear(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augmented copy
    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &bi)| {
            let mut r = row.clone();
            r.push(bi);
            r
        })
        .collect();

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let tiny = scale * f64::EPSILON * n as f64;

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            m[i][col]
                .abs()
                .partial_cmp(&m[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        let pivot = m[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() <= tiny {
            return None;
        }
        m.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = m[i][n];
        for j in (i + 1)..n {
            sum -= m[i][j] * x[j];
        }
        x[i] = sum / m[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Solve `A x = b` using Cholesky decomposition.
///
/// `A` must be symmetric positive definite; returns `None` otherwise.
pub fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L Lᵀ
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Lᵀ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_norm2() {
        assert_relative_eq!(norm2(&[3.0, 4.0]), 5.0);
        assert_eq!(norm2(&[]), 0.0);
    }

    #[test]
    fn test_mat_vec_and_transpose() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(mat_vec(&a, &[1.0, 1.0]), vec![3.0, 7.0]);
        assert_eq!(mat_t_vec(&a, &[1.0, 1.0]), vec![4.0, 6.0]);
    }

    #[test]
    fn test_solve_linear_requires_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = solve_linear(&a, &[2.0, 3.0]).unwrap();
        assert_relative_eq!(x[0], 3.0);
        assert_relative_eq!(x[1], 2.0);
    }

    #[test]
    fn test_solve_linear_badly_scaled() {
        // Rows differ by 11 orders of magnitude, as in an unscaled Merton Jacobian
        let a = vec![vec![1e11, 2e10], vec![3.0, 1.0]];
        let x_true = [0.25, -1.5];
        let b = mat_vec(&a, &x_true);
        let x = solve_linear(&a, &b).unwrap();
        assert_relative_eq!(x[0], x_true[0], max_relative = 1e-10);
        assert_relative_eq!(x[1], x_true[1], max_relative = 1e-10);
    }

    #[test]
    fn test_solve_linear_singular() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear(&a, &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_solve_linear_dimension_mismatch() {
        let a = vec![vec![1.0, 2.0]];
        assert!(solve_linear(&a, &[1.0, 2.0]).is_none());
        assert!(solve_linear(&[], &[]).is_none());
    }

    #[test]
    fn test_cholesky_simple() {
        // 4x + 2y = 8, 2x + 2y = 5
        let a = vec![vec![4.0, 2.0], vec![2.0, 2.0]];
        let x = solve_cholesky(&a, &[8.0, 5.0]).unwrap();
        assert_relative_eq!(x[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cholesky_non_positive_definite() {
        let a = vec![vec![-1.0, 0.0], vec![0.0, 1.0]];
        assert!(solve_cholesky(&a, &[1.0, 1.0]).is_none());
    }
}
