//! The model oracle: discrete dynamics, their Jacobians, and the
//! state-difference operator. Everything here is supplied by the caller;
//! this crate only ever calls into it.

use nalgebra::{DMatrix, DVector};

/// Opaque integrator tag forwarded to the model unchanged. The core does
/// not interpret these; a model is free to ignore the tag entirely or to
/// dispatch on it for a multi-scheme implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integrator {
    Euler,
    Rk2,
    Rk4,
}

/// A discrete-time dynamical system and its derivatives.
///
/// Implementors own the model parameters; this crate treats every method
/// here as a pure function of its explicit arguments (no hidden state is
/// assumed). `state_dim`/`control_dim` must be constant for the lifetime of
/// any [`crate::solver::SolverState`] built against this model.
pub trait Model {
    fn state_dim(&self) -> usize;
    fn control_dim(&self) -> usize;

    /// Writes `x_{k+1} = f(x, u, t, dt)` into `x_out`.
    fn discrete_dynamics(
        &self,
        x_out: &mut DVector<f64>,
        integrator: Integrator,
        x: &DVector<f64>,
        u: &DVector<f64>,
        t: f64,
        dt: f64,
    );

    /// Writes `A = df/dx` and `B = df/du` at `(x, u, t, dt)`.
    fn discrete_jacobian(
        &self,
        a_out: &mut DMatrix<f64>,
        b_out: &mut DMatrix<f64>,
        integrator: Integrator,
        x: &DVector<f64>,
        u: &DVector<f64>,
        t: f64,
        dt: f64,
    );

    /// Generalization of `x_new - x_old` to non-Euclidean state spaces.
    /// The default is ordinary Euclidean subtraction; models defined on a
    /// manifold (e.g. with a unit quaternion block) override this.
    fn state_diff(&self, delta_out: &mut DVector<f64>, x_new: &DVector<f64>, x_old: &DVector<f64>) {
        for i in 0..delta_out.len() {
            delta_out[i] = x_new[i] - x_old[i];
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// `x_{k+1} = A x_k + B u_k` double integrator, A/B baked in at
    /// construction from `dt`.
    pub struct DoubleIntegrator {
        pub a: DMatrix<f64>,
        pub b: DMatrix<f64>,
    }

    impl DoubleIntegrator {
        pub fn new(dt: f64) -> Self {
            let a = DMatrix::from_row_slice(2, 2, &[1.0, dt, 0.0, 1.0]);
            let b = DMatrix::from_row_slice(2, 1, &[0.5 * dt * dt, dt]);
            Self { a, b }
        }
    }

    impl Model for DoubleIntegrator {
        fn state_dim(&self) -> usize {
            2
        }

        fn control_dim(&self) -> usize {
            1
        }

        fn discrete_dynamics(
            &self,
            x_out: &mut DVector<f64>,
            _integrator: Integrator,
            x: &DVector<f64>,
            u: &DVector<f64>,
            _t: f64,
            _dt: f64,
        ) {
            x_out.copy_from(&(&self.a * x + &self.b * u));
        }

        fn discrete_jacobian(
            &self,
            a_out: &mut DMatrix<f64>,
            b_out: &mut DMatrix<f64>,
            _integrator: Integrator,
            _x: &DVector<f64>,
            _u: &DVector<f64>,
            _t: f64,
            _dt: f64,
        ) {
            a_out.copy_from(&self.a);
            b_out.copy_from(&self.b);
        }
    }
}
