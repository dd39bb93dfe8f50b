use super::{Constraint, ConstraintSense};
use crate::error::{ConstraintError, ConstraintResult};
use crate::model::{Integrator, Model};
use crate::trajectory::Trajectory;
use nalgebra::{DMatrix, DVector};

/// Couples adjacent knots: `c = f(x_{k-1}, u_{k-1}, t_{k-1}, dt) - x_k = 0`.
/// Defined only for `k >= 1`, since knot 0 has no predecessor.
pub struct DynamicsConstraint<'m, M: Model> {
    model: &'m M,
    integrator: Integrator,
}

impl<'m, M: Model> DynamicsConstraint<'m, M> {
    pub fn new(model: &'m M, integrator: Integrator) -> Self {
        Self { model, integrator }
    }
}

impl<'m, M: Model> Constraint for DynamicsConstraint<'m, M> {
    fn length(&self) -> usize {
        self.model.state_dim()
    }

    fn sense(&self) -> ConstraintSense {
        ConstraintSense::Equality
    }

    fn label(&self) -> &'static str {
        "dynamics"
    }

    fn evaluate(&self, c_out: &mut DVector<f64>, traj: &Trajectory, k: usize) {
        assert!(k >= 1, "dynamics constraint is undefined at knot 0");
        let dt = traj.dt(k - 1);
        self.model.discrete_dynamics(c_out, self.integrator, &traj.x[k - 1], &traj.u[k - 1], traj.ts[k - 1], dt);
        *c_out -= &traj.x[k];
    }

    fn jacobian(&self, _cx_out: &mut DMatrix<f64>, _cu_out: &mut DMatrix<f64>, _traj: &Trajectory, _k: usize) -> ConstraintResult<()> {
        Err(ConstraintError::NotMarkovian { label: self.label() })
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
        if k < 1 {
            return Err(ConstraintError::NoPredecessor { label: self.label(), knot: k });
        }
        let dt = traj.dt(k - 1);
        let n = self.model.state_dim();
        let m = self.model.control_dim();
        let mut a = DMatrix::zeros(n, n);
        let mut b = DMatrix::zeros(n, m);
        self.model.discrete_jacobian(&mut a, &mut b, self.integrator, &traj.x[k - 1], &traj.u[k - 1], traj.ts[k - 1], dt);

        // x_cols[0] = columns for knot k-1, x_cols[1] = columns for knot k.
        let xc_prev = x_cols[0];
        let xc_cur = x_cols[1];
        let uc_prev = u_cols[0];
        for (row_idx, &row) in c_rows.iter().enumerate() {
            for (col_idx, &col) in xc_prev.iter().enumerate() {
                d_out[(row, col)] = a[(row_idx, col_idx)];
            }
            for (col_idx, &col) in uc_prev.iter().enumerate() {
                d_out[(row, col)] = b[(row_idx, col_idx)];
            }
            for (col_idx, &col) in xc_cur.iter().enumerate() {
                d_out[(row, col)] = if row_idx == col_idx { -1.0 } else { 0.0 };
            }
        }
        Ok(())
    }

    fn max_violation_info(&self, c: &DVector<f64>, k: usize) -> (f64, String) {
        if c.is_empty() {
            return (0.0, self.label().to_string());
        }
        let (row, &worst) = c
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .expect("checked non-empty above");
        (worst, format!("dynamics[k={}, x{}]", k, row))
    }

    fn const_jac(&self) -> bool {
        false
    }

    fn state_expansion(&self) -> bool {
        false
    }

    fn control_expansion(&self) -> bool {
        false
    }

    fn coupled_expansion(&self) -> bool {
        true
    }

    fn direct(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::DoubleIntegrator;

    #[test]
    fn residual_is_zero_on_a_trajectory_that_satisfies_the_dynamics() {
        let model = DoubleIntegrator::new(0.1);
        let constraint = DynamicsConstraint::new(&model, Integrator::Euler);

        let mut traj = Trajectory::new(vec![0.0, 0.1], 2, 1);
        traj.x[0] = DVector::from_vec(vec![1.0, 0.0]);
        traj.u[0] = DVector::from_vec(vec![0.0]);
        let mut next = DVector::zeros(2);
        model.discrete_dynamics(&mut next, Integrator::Euler, &traj.x[0], &traj.u[0], 0.0, 0.1);
        traj.x[1] = next;

        let mut c = DVector::zeros(2);
        constraint.evaluate(&mut c, &traj, 1);
        assert!(c.norm() < 1e-12);
    }

    #[test]
    fn empty_residual_is_a_no_op() {
        let model = DoubleIntegrator::new(0.1);
        let constraint = DynamicsConstraint::new(&model, Integrator::Euler);
        let c = DVector::zeros(0);
        assert_eq!(constraint.max_violation_info(&c, 1), (0.0, "dynamics".to_string()));
    }

    #[test]
    fn jacobian_is_rejected_but_jacobian_copy_works() {
        let model = DoubleIntegrator::new(0.1);
        let constraint = DynamicsConstraint::new(&model, Integrator::Euler);
        let mut cx = DMatrix::zeros(2, 2);
        let mut cu = DMatrix::zeros(2, 1);
        let traj = Trajectory::new(vec![0.0, 0.1], 2, 1);
        assert!(constraint.jacobian(&mut cx, &mut cu, &traj, 1).is_err());

        let mut d = DMatrix::zeros(2, 5);
        let res = constraint.jacobian_copy(&mut d, &traj, 1, &[0, 1], &[&[0, 1], &[3, 4]], &[&[2]]);
        assert!(res.is_ok());
    }
}
