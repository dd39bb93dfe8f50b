use super::{Constraint, ConstraintSense};
use crate::error::ConstraintResult;
use crate::trajectory::Trajectory;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormTarget {
    State,
    Control,
}

/// `sum_{i in inds} v_i^2 - n_max = 0`, where `v` is `x_k` or `u_k`
/// depending on `target`.
#[derive(Debug, Clone)]
pub struct Norm {
    inds: Vec<usize>,
    n_max: f64,
    target: NormTarget,
}

impl Norm {
    pub fn new(inds: Vec<usize>, n_max: f64, target: NormTarget) -> Self {
        Self { inds, n_max, target }
    }

    fn selected<'a>(&self, traj: &'a Trajectory, k: usize) -> &'a DVector<f64> {
        match self.target {
            NormTarget::State => &traj.x[k],
            NormTarget::Control => &traj.u[k],
        }
    }
}

impl Constraint for Norm {
    fn length(&self) -> usize {
        1
    }

    fn sense(&self) -> ConstraintSense {
        ConstraintSense::Equality
    }

    fn label(&self) -> &'static str {
        "norm"
    }

    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize) {
        let v = self.selected(traj, k);
        let sum_sq: f64 = self.inds.iter().map(|&i| v[i] * v[i]).sum();
        c_out[0] = sum_sq - self.n_max;
    }

    fn jacobian(&self, cx_out: &mut DMatrix<f64>, cu_out: &mut DMatrix<f64>, traj: &Trajectory, k: usize) -> ConstraintResult<()> {
        cx_out.fill(0.0);
        cu_out.fill(0.0);
        let v = self.selected(traj, k);
        let out = match self.target {
            NormTarget::State => &mut *cx_out,
            NormTarget::Control => &mut *cu_out,
        };
        for &i in &self.inds {
            out[(0, i)] = 2.0 * v[i];
        }
        Ok(())
    }

    fn max_violation_info(&self, c: &DVector<f64>, _k: usize) -> (f64, String) {
        (c[0], "norm".to_string())
    }

    fn const_jac(&self) -> bool {
        false
    }

    fn state_expansion(&self) -> bool {
        self.target == NormTarget::State
    }

    fn control_expansion(&self) -> bool {
        self.target == NormTarget::Control
    }

    fn coupled_expansion(&self) -> bool {
        false
    }

    fn direct(&self) -> bool {
        true
    }
}
