//! The forward rollout: applies the feedback gains from a backward pass
//! along a line-search step `alpha`, writing into the scratch trajectory
//! and reporting the rolled-out cost.

use crate::cost::Cost;
use crate::model::Model;
use crate::solver::SolverState;
use crate::status::SolverStatus;

impl<M: Model, C: Cost> SolverState<M, C> {
    /// Rolls the feedback policy `u_k = u_k^ref + alpha*d_k + K_k*(x_k - x_k^ref)`
    /// forward from `traj.x[0]` into `traj_tmp`, returning `(cost, aborted)`.
    ///
    /// `aborted` is `true` if a state or control value exceeds the
    /// configured limit, or a non-finite value appears; in that case the
    /// returned cost is `0.0` and `self.status` records which limit was hit.
    /// Callers must treat an aborted rollout as an infinitely bad step in
    /// the line search.
    pub fn rollout(&mut self, alpha: f64) -> (f64, bool) {
        let terminal = self.num_knots() - 1;
        let max_state_value = self.options.max_state_value;
        let max_control_value = self.options.max_control_value;

        let SolverState {
            model,
            cost,
            integrator,
            traj,
            traj_tmp,
            gains_k,
            gains_d,
            status,
            delta_x,
            delta_u,
            ..
        } = self;

        traj_tmp.x[0].copy_from(&traj.x[0]);

        let mut total_cost = 0.0;
        for k in 0..terminal {
            model.state_diff(delta_x, &traj_tmp.x[k], &traj.x[k]);
            delta_u.copy_from(&(&gains_k[k] * &*delta_x));
            let d = &gains_d[k];
            for i in 0..delta_u.len() {
                delta_u[i] += alpha * d[i];
            }

            let mut u_next = traj.u[k].clone();
            u_next += &*delta_u;
            if !u_next.iter().all(|v| v.is_finite()) || u_next.amax() > max_control_value {
                *status = SolverStatus::ControlLimit;
                return (0.0, true);
            }
            traj_tmp.u[k].copy_from(&u_next);

            let dt = traj_tmp.dt(k);
            let t = traj_tmp.ts[k];
            let (x_k, x_rest) = traj_tmp.x.split_at_mut(k + 1);
            let x_k = &x_k[k];
            let x_next = &mut x_rest[0];
            model.discrete_dynamics(x_next, *integrator, x_k, &traj_tmp.u[k], t, dt);

            if !x_next.iter().all(|v| v.is_finite()) || x_next.amax() > max_state_value {
                *status = SolverStatus::StateLimit;
                return (0.0, true);
            }

            total_cost += cost.cost(x_k, Some(&traj_tmp.u[k]), k);
        }

        total_cost += cost.cost(&traj_tmp.x[terminal], None, terminal);
        *status = SolverStatus::Unsolved;
        (total_cost, false)
    }
}
