//! Hand-rolled dense Cholesky factorization and triangular solves.
//!
//! The backward pass needs the factor of `Quu_reg` kept in a buffer distinct
//! from `Quu_reg` itself, and needs to reuse that buffer across knots
//! without allocating. `nalgebra`'s
//! own `Cholesky` type takes ownership of its input, so this module
//! implements the factorization directly over pre-allocated `DMatrix`
//! buffers instead, in the same spirit as the other dense solvers in this
//! pack (e.g. the Levenberg-Marquardt normal-equation solver in
//! `neutryx-lab`, which hand-rolls Cholesky over raw buffers rather than
//! going through a decomposition type that owns its storage).

use nalgebra::{DMatrix, DVector};

/// Writes the lower Cholesky factor of symmetric `a` into `l_out` (same
/// shape, pre-allocated by the caller). Returns `false`, leaving `l_out`
/// partially written, if `a` is not positive definite.
pub fn cholesky_factor(a: &DMatrix<f64>, l_out: &mut DMatrix<f64>) -> bool {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(l_out.shape(), (n, n));
    l_out.fill(0.0);
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for p in 0..j {
                sum -= l_out[(i, p)] * l_out[(j, p)];
            }
            if i == j {
                if sum <= 0.0 {
                    return false;
                }
                l_out[(i, j)] = sum.sqrt();
            } else {
                l_out[(i, j)] = sum / l_out[(j, j)];
            }
        }
    }
    true
}

/// Solves `L L' x = b` in place: `x` holds `b` on entry and the solution on
/// exit. `l` is the lower factor from [`cholesky_factor`].
pub fn cholesky_solve_vec_in_place(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();
    for i in 0..n {
        let mut sum = x[i];
        for p in 0..i {
            sum -= l[(i, p)] * x[p];
        }
        x[i] = sum / l[(i, i)];
    }
    for i in (0..n).rev() {
        let mut sum = x[i];
        for p in (i + 1)..n {
            sum -= l[(p, i)] * x[p];
        }
        x[i] = sum / l[(i, i)];
    }
}

/// Solves `L L' X = B` in place, one column of `x` at a time. `x` holds `B`
/// on entry and the solution on exit.
pub fn cholesky_solve_mat_in_place(l: &DMatrix<f64>, x: &mut DMatrix<f64>) {
    let n = l.nrows();
    for c in 0..x.ncols() {
        for i in 0..n {
            let mut sum = x[(i, c)];
            for p in 0..i {
                sum -= l[(i, p)] * x[(p, c)];
            }
            x[(i, c)] = sum / l[(i, i)];
        }
        for i in (0..n).rev() {
            let mut sum = x[(i, c)];
            for p in (i + 1)..n {
                sum -= l[(p, i)] * x[(p, c)];
            }
            x[(i, c)] = sum / l[(i, i)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_and_solves_a_known_spd_system() {
        // [[4, 2], [2, 2]] x = [8, 5] has solution x = [1.5, 1.0].
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 2.0]);
        let mut l = DMatrix::zeros(2, 2);
        assert!(cholesky_factor(&a, &mut l));

        let mut x = DVector::from_vec(vec![8.0, 5.0]);
        cholesky_solve_vec_in_place(&l, &mut x);
        assert!((x[0] - 1.5).abs() < 1e-9);
        assert!((x[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_indefinite_matrix() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let mut l = DMatrix::zeros(2, 2);
        assert!(!cholesky_factor(&a, &mut l));
    }

    #[test]
    fn solves_matrix_rhs_column_by_column() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 2.0]);
        let mut l = DMatrix::zeros(2, 2);
        assert!(cholesky_factor(&a, &mut l));

        let mut x = DMatrix::from_row_slice(2, 2, &[8.0, 4.0, 5.0, 2.0]);
        cholesky_solve_mat_in_place(&l, &mut x);
        assert!((x[(0, 0)] - 1.5).abs() < 1e-9);
        assert!((x[(1, 0)] - 1.0).abs() < 1e-9);
    }
}
