//! The cost oracle and the per-knot quadratic expansion record it fills in.

use nalgebra::{DMatrix, DVector};

/// Quadratic model of the running (or terminal) cost at a single knot.
///
/// At the terminal knot only `Q` and `q` are meaningful; `R`, `H`, and `r`
/// stay at whatever they were last set to (callers must not read them for
/// `k == N - 1`).
#[derive(Debug, Clone)]
pub struct Expansion {
    pub Q: DMatrix<f64>,
    pub R: DMatrix<f64>,
    /// Cross term, `n x m`; zero for a separable cost.
    pub H: DMatrix<f64>,
    pub q: DVector<f64>,
    pub r: DVector<f64>,
}

impl Expansion {
    pub fn zeros(n: usize, m: usize) -> Self {
        Self {
            Q: DMatrix::zeros(n, n),
            R: DMatrix::zeros(m, m),
            H: DMatrix::zeros(n, m),
            q: DVector::zeros(n),
            r: DVector::zeros(m),
        }
    }

    pub(crate) fn fill_zero(&mut self) {
        self.Q.fill(0.0);
        self.R.fill(0.0);
        self.H.fill(0.0);
        self.q.fill(0.0);
        self.r.fill(0.0);
    }
}

/// A stage/terminal cost and its first and second derivatives.
///
/// `cost` and `cost_derivatives` both take a `u: Option<&DVector<f64>>` so a
/// single trait covers stage knots (`Some`) and the terminal knot (`None`)
/// without a second set of methods.
pub trait Cost {
    fn cost(&self, x: &DVector<f64>, u: Option<&DVector<f64>>, k: usize) -> f64;

    fn cost_derivatives(&self, e: &mut Expansion, x: &DVector<f64>, u: Option<&DVector<f64>>, k: usize);
}
