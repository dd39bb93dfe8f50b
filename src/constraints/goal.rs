use super::{Constraint, ConstraintSense};
use crate::error::ConstraintResult;
use crate::trajectory::Trajectory;
use nalgebra::{DMatrix, DVector};

/// Pins a subset of state indices at a knot to target values:
/// `c_i = x_k[inds[i]] - target[i]`.
#[derive(Debug, Clone)]
pub struct Goal {
    inds: Vec<usize>,
    target: Vec<f64>,
}

impl Goal {
    /// `inds` are 0-based state indices; `target` must have the same
    /// length and gives the pinned value for each.
    pub fn new(inds: Vec<usize>, target: Vec<f64>) -> Self {
        assert_eq!(inds.len(), target.len(), "Goal: inds/target length mismatch");
        Self { inds, target }
    }
}

impl Constraint for Goal {
    fn length(&self) -> usize {
        self.inds.len()
    }

    fn sense(&self) -> ConstraintSense {
        ConstraintSense::Equality
    }

    fn label(&self) -> &'static str {
        "goal"
    }

    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize) {
        for (row, (&idx, &target)) in self.inds.iter().zip(&self.target).enumerate() {
            c_out[row] = traj.x[k][idx] - target;
        }
    }

    fn jacobian(&self, cx_out: &mut DMatrix<f64>, cu_out: &mut DMatrix<f64>, _traj: &Trajectory, _k: usize) -> ConstraintResult<()> {
        cx_out.fill(0.0);
        cu_out.fill(0.0);
        for (row, &idx) in self.inds.iter().enumerate() {
            cx_out[(row, idx)] = 1.0;
        }
        Ok(())
    }

    fn max_violation_info(&self, c: &DVector<f64>, _k: usize) -> (f64, String) {
        if c.is_empty() {
            return (0.0, self.label().to_string());
        }
        let (row, &worst) = c
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .expect("checked non-empty above");
        (worst, format!("goal[x{}]", self.inds[row]))
    }

    fn const_jac(&self) -> bool {
        true
    }

    fn state_expansion(&self) -> bool {
        true
    }

    fn control_expansion(&self) -> bool {
        false
    }

    fn coupled_expansion(&self) -> bool {
        false
    }

    fn direct(&self) -> bool {
        true
    }

    fn init_jacobian(&mut self) {
        // Keep the first occurrence of a repeated index; a duplicate would
        // otherwise double-count that row in both the residual and Cx.
        let mut seen = std::collections::HashSet::new();
        let mut deduped_inds = Vec::with_capacity(self.inds.len());
        let mut deduped_target = Vec::with_capacity(self.target.len());
        for (&idx, &t) in self.inds.iter().zip(&self.target) {
            if seen.insert(idx) {
                deduped_inds.push(idx);
                deduped_target.push(t);
            }
        }
        self.inds = deduped_inds;
        self.target = deduped_target;
    }
}
