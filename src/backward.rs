//! The backward pass: a Riccati recursion with Hessian regularization,
//! producing feedback gains `(K, d)` and the predicted cost reduction `dv`.

use crate::cost::Cost;
use crate::linalg;
use crate::model::Model;
use crate::regularization::RegularizationType;
use crate::solver::SolverState;
use crate::status::SolverStatus;
use anyhow::{anyhow, Result};

impl<M: Model, C: Cost> SolverState<M, C> {
    /// Runs one backward pass, mutating `gains_k`, `gains_d`, `dv`, and the
    /// regularization controller in place. On success, `self.reg.rho` has
    /// been decreased and `Ok(dv)` is returned. On `Err`, `self.status` is
    /// set to [`SolverStatus::RegularizationMax`] and the partial state of
    /// `gains_k`/`gains_d` is not meaningful.
    pub fn backward_pass(&mut self) -> Result<[f64; 2]> {
        let terminal = self.num_knots() - 1;
        let bp_reg_type = self.options.bp_reg_type;
        let bp_reg = self.options.bp_reg;
        let max_restarts = self.options.max_restarts;
        let m = self.m;

        self.cost
            .cost_derivatives(&mut self.expansions[terminal], &self.traj.x[terminal], None, terminal);

        let SolverState {
            model,
            cost,
            integrator,
            traj,
            jac_a,
            jac_b,
            expansions,
            action_values,
            gains_k,
            gains_d,
            chol_workspace,
            cost_to_go,
            saved_cost_to_go,
            status,
            reg,
            dv,
            ..
        } = self;

        let mut restarts = 0usize;
        'restart: loop {
            cost_to_go.reset_from_terminal(&expansions[terminal].Q, &expansions[terminal].q);
            *dv = [0.0, 0.0];

            for k in (0..terminal).rev() {
                let dt = traj.dt(k);
                model.discrete_jacobian(&mut jac_a[k], &mut jac_b[k], *integrator, &traj.x[k], &traj.u[k], traj.ts[k], dt);
                cost.cost_derivatives(&mut expansions[k], &traj.x[k], Some(&traj.u[k]), k);

                let a = &jac_a[k];
                let b = &jac_b[k];
                let e = &expansions[k];
                let av = &mut action_values[k];

                av.Qxx.copy_from(&(a.transpose() * &cost_to_go.P * a + &e.Q));
                av.Quu.copy_from(&(b.transpose() * &cost_to_go.P * b + &e.R));
                av.Qux.copy_from(&(b.transpose() * &cost_to_go.P * a));
                if e.H.iter().any(|&v| v != 0.0) {
                    av.Qux += e.H.transpose();
                }
                av.Qx.copy_from(&(a.transpose() * &cost_to_go.p + &e.q));
                av.Qu.copy_from(&(b.transpose() * &cost_to_go.p + &e.r));

                let needs_restart = match bp_reg_type {
                    RegularizationType::Control => {
                        av.Quu_reg.copy_from(&av.Quu);
                        for i in 0..m {
                            av.Quu_reg[(i, i)] += reg.rho;
                        }
                        av.Qux_reg.copy_from(&av.Qux);
                        let factored = linalg::cholesky_factor(&av.Quu_reg, &mut chol_workspace[k]);
                        bp_reg && !factored
                    }
                    RegularizationType::State => {
                        av.Quu_reg.copy_from(&(&av.Quu + reg.rho * b.transpose() * b));
                        av.Qux_reg.copy_from(&(&av.Qux + reg.rho * b.transpose() * a));
                        false
                    }
                };

                if needs_restart {
                    let exceeded = reg.increase();
                    tracing::debug!(rho = reg.rho, restarts, knot = k, "backward pass restarting: Quu_reg not positive definite");
                    if exceeded {
                        *status = SolverStatus::RegularizationMax;
                        return Err(anyhow!("regularization exceeded rho_max ({})", reg.rho_max));
                    }
                    restarts += 1;
                    if restarts > max_restarts {
                        *status = SolverStatus::RegularizationMax;
                        return Err(anyhow!("exceeded max backward-pass restarts ({})", max_restarts));
                    }
                    continue 'restart;
                }

                match bp_reg_type {
                    RegularizationType::Control => {
                        gains_k[k].copy_from(&av.Qux_reg);
                        gains_k[k] *= -1.0;
                        linalg::cholesky_solve_mat_in_place(&chol_workspace[k], &mut gains_k[k]);

                        gains_d[k].copy_from(&av.Qu);
                        gains_d[k] *= -1.0;
                        linalg::cholesky_solve_vec_in_place(&chol_workspace[k], &mut gains_d[k]);
                    }
                    RegularizationType::State => {
                        let quu_inv = av
                            .Quu_reg
                            .clone()
                            .try_inverse()
                            .ok_or_else(|| anyhow!("Quu_reg singular under state regularization at knot {}", k))?;
                        gains_k[k].copy_from(&(-&quu_inv * &av.Qux_reg));
                        gains_d[k].copy_from(&(-&quu_inv * &av.Qu));
                    }
                }

                let kk = &gains_k[k];
                let dd = &gains_d[k];

                // Cost-to-go update uses the unregularized Quu/Qux, not the
                // regularized copies used to solve for the gains.
                cost_to_go
                    .p
                    .copy_from(&(&av.Qx + kk.transpose() * &av.Quu * dd + kk.transpose() * &av.Qu + av.Qux.transpose() * dd));
                cost_to_go
                    .P
                    .copy_from(&(&av.Qxx + kk.transpose() * &av.Quu * kk + kk.transpose() * &av.Qux + av.Qux.transpose() * kk));
                cost_to_go.symmetrize();

                dv[0] += dd.dot(&av.Qu);
                dv[1] += 0.5 * (dd.transpose() * &av.Quu * dd)[(0, 0)];

                if let Some(saved) = saved_cost_to_go.as_mut() {
                    saved[k].P.copy_from(&cost_to_go.P);
                    saved[k].p.copy_from(&cost_to_go.p);
                    saved[k].dv = *dv;
                }
            }

            reg.decrease();
            tracing::debug!(rho = reg.rho, restarts, "backward pass converged");
            return Ok(*dv);
        }
    }
}
