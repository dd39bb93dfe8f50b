//! State/control trajectory storage.
//!
//! This crate indexes 0-based in Rust's native style: `x[0..N]` are the `N`
//! knots, `u[0..N-1]` are the `N - 1` controls between them, and
//! `ts[k]`/`ts[k+1]` give `Δt_k = ts[k+1] - ts[k]`.

use nalgebra::DVector;

/// An `N`-knot state/control trajectory. `x.len() == N`, `u.len() == N - 1`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub ts: Vec<f64>,
    pub x: Vec<DVector<f64>>,
    pub u: Vec<DVector<f64>>,
}

impl Trajectory {
    pub fn new(ts: Vec<f64>, n: usize, m: usize) -> Self {
        let num_knots = ts.len();
        Self {
            ts,
            x: vec![DVector::zeros(n); num_knots],
            u: vec![DVector::zeros(m); num_knots.saturating_sub(1)],
        }
    }

    pub fn num_knots(&self) -> usize {
        self.x.len()
    }

    pub fn dt(&self, k: usize) -> f64 {
        self.ts[k + 1] - self.ts[k]
    }

    pub fn copy_from(&mut self, other: &Trajectory) {
        for (dst, src) in self.x.iter_mut().zip(&other.x) {
            dst.copy_from(src);
        }
        for (dst, src) in self.u.iter_mut().zip(&other.u) {
            dst.copy_from(src);
        }
    }
}
