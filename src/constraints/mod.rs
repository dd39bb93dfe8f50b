//! The constraint library: a closed set of stage and coupled constraint
//! variants behind one capability trait, plus a hand-written dispatcher
//! (`ConstraintKind`) so the solver never needs a trait object to hold a
//! heterogeneous collection of them.

mod bound;
mod dynamics;
mod goal;
mod norm;

pub use bound::Bound;
pub use dynamics::DynamicsConstraint;
pub use goal::Goal;
pub use norm::Norm;

use crate::error::ConstraintResult;
use crate::model::Model;
use crate::trajectory::Trajectory;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    Equality,
    /// `c <= 0` convention.
    Inequality,
}

/// Augmented-Lagrangian parameters attached to one constraint; consumed by
/// the outer loop (out of scope here), not by this crate's own methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintParams {
    /// Penalty growth factor.
    pub phi: f64,
    /// Initial penalty.
    pub mu0: f64,
    /// Penalty cap.
    pub mu_max: f64,
    /// Multiplier cap.
    pub lambda_max: f64,
    /// Active-set tolerance.
    pub a_tol: f64,
}

impl Default for ConstraintParams {
    fn default() -> Self {
        Self {
            phi: 10.0,
            mu0: 1.0,
            mu_max: 1e8,
            lambda_max: 1e8,
            a_tol: 1e-3,
        }
    }
}

/// The capability set every constraint variant exposes uniformly.
///
/// Every method reads knot `k` out of a whole [`Trajectory`] rather than
/// separate `X`/`U` slices so that a coupled constraint (`Dynamics`) has
/// access to `ts` and can recover `dt = ts[k] - ts[k-1]` without a parallel
/// parameter list threaded through every variant.
pub trait Constraint {
    /// Number of scalar residual components, `p`.
    fn length(&self) -> usize;
    fn sense(&self) -> ConstraintSense;
    /// Human-readable identifier used in `max_violation_info`.
    fn label(&self) -> &'static str;

    /// Writes `p` scalar residuals for knot `k` into `c_out`.
    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize);

    /// Stage Jacobian `(Cx, Cu)` at knot `k`. Only defined for constraints
    /// with `coupled_expansion() == false`; coupled constraints return
    /// [`crate::error::ConstraintError::NotMarkovian`].
    fn jacobian(&self, cx_out: &mut DMatrix<f64>, cu_out: &mut DMatrix<f64>, traj: &Trajectory, k: usize) -> ConstraintResult<()>;

    /// Scatters this constraint's Jacobian into a global matrix `d_out` for
    /// the direct solver. `c_rows` is this constraint's row block; each
    /// entry of `x_cols`/`u_cols` is the column block for one knot this
    /// constraint reads from (length 1 for a stage constraint, length 2 for
    /// a coupled one: `[knot k-1, knot k]`).
    ///
    /// The default implementation handles the stage case by delegating to
    /// [`Constraint::jacobian`]; coupled variants override it.
    fn jacobian_copy(
        &self,
        d_out: &mut DMatrix<f64>,
        traj: &Trajectory,
        k: usize,
        c_rows: &[usize],
        x_cols: &[&[usize]],
        u_cols: &[&[usize]],
    ) -> ConstraintResult<()> {
        let n = traj.x[k].len();
        let m = if k < traj.u.len() { traj.u[k].len() } else { 0 };
        let mut cx = DMatrix::zeros(self.length(), n);
        let mut cu = DMatrix::zeros(self.length(), m);
        self.jacobian(&mut cx, &mut cu, traj, k)?;

        let xc = x_cols[0];
        let uc = u_cols[0];
        for (row_idx, &row) in c_rows.iter().enumerate() {
            for (col_idx, &col) in xc.iter().enumerate() {
                d_out[(row, col)] = cx[(row_idx, col_idx)];
            }
            for (col_idx, &col) in uc.iter().enumerate() {
                d_out[(row, col)] = cu[(row_idx, col_idx)];
            }
        }
        Ok(())
    }

    /// Worst violated component and its label, `(scalar, name)`.
    fn max_violation_info(&self, c: &DVector<f64>, k: usize) -> (f64, String);

    fn const_jac(&self) -> bool;
    fn state_expansion(&self) -> bool;
    fn control_expansion(&self) -> bool;
    fn coupled_expansion(&self) -> bool;
    fn direct(&self) -> bool;

    /// Called once after construction to pre-populate any cached constant
    /// Jacobian blocks. A no-op for variants without one.
    fn init_jacobian(&mut self) {}
}

/// Tagged sum type over the closed variant list. Each capability method
/// dispatches with a single `match` rather than a trait object, since the
/// variant list (`Goal`, `Dynamics`, `Bound`, `Norm`) is closed and
/// performance matters.
pub enum ConstraintKind<'m, M: Model> {
    Goal(Goal),
    Dynamics(DynamicsConstraint<'m, M>),
    Bound(Bound),
    Norm(Norm),
}

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            ConstraintKind::Goal(c) => c.$method($($arg),*),
            ConstraintKind::Dynamics(c) => c.$method($($arg),*),
            ConstraintKind::Bound(c) => c.$method($($arg),*),
            ConstraintKind::Norm(c) => c.$method($($arg),*),
        }
    };
}

impl<'m, M: Model> Constraint for ConstraintKind<'m, M> {
    fn length(&self) -> usize {
        dispatch!(self, length())
    }

    fn sense(&self) -> ConstraintSense {
        dispatch!(self, sense())
    }

    fn label(&self) -> &'static str {
        dispatch!(self, label())
    }

    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize) {
        dispatch!(self, evaluate(c_out, traj, k))
    }

    fn jacobian(&self, cx_out: &mut DMatrix<f64>, cu_out: &mut DMatrix<f64>, traj: &Trajectory, k: usize) -> ConstraintResult<()> {
        dispatch!(self, jacobian(cx_out, cu_out, traj, k))
    }

    fn jacobian_copy(
        &self,
        d_out: &mut DMatrix<f64>,
        traj: &Trajectory,
        k: usize,
        c_rows: &[usize],
        x_cols: &[&[usize]],
        u_cols: &[&[usize]],
    ) -> ConstraintResult<()> {
        dispatch!(self, jacobian_copy(d_out, traj, k, c_rows, x_cols, u_cols))
    }

    fn max_violation_info(&self, c: &DVector<f64>, k: usize) -> (f64, String) {
        dispatch!(self, max_violation_info(c, k))
    }

    fn const_jac(&self) -> bool {
        dispatch!(self, const_jac())
    }

    fn state_expansion(&self) -> bool {
        dispatch!(self, state_expansion())
    }

    fn control_expansion(&self) -> bool {
        dispatch!(self, control_expansion())
    }

    fn coupled_expansion(&self) -> bool {
        dispatch!(self, coupled_expansion())
    }

    fn direct(&self) -> bool {
        dispatch!(self, direct())
    }

    fn init_jacobian(&mut self) {
        dispatch!(self, init_jacobian())
    }
}
