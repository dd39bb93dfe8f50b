//! Solver state: the single owner of every buffer the backward pass and
//! forward rollout touch. Allocated once at problem construction; nothing
//! inside `backward_pass` or `rollout` allocates.

use crate::cost::{Cost, Expansion};
use crate::expansion::{ActionValueExpansion, CostToGo};
use crate::model::{Integrator, Model};
use crate::options::SolverOptions;
use crate::regularization::RegularizationController;
use crate::status::SolverStatus;
use crate::trajectory::Trajectory;
use anyhow::{ensure, Result};
use nalgebra::{DMatrix, DVector};

/// Owns the model, the cost, every trajectory and per-knot buffer, and the
/// solver's mutable status/regularization state. Parameterized by `N`
/// (implicit, via `traj.num_knots()`), state dimension `n`, and control
/// dimension `m`.
pub struct SolverState<M: Model, C: Cost> {
    pub model: M,
    pub cost: C,
    pub integrator: Integrator,

    pub n: usize,
    pub m: usize,

    /// The live trajectory, `(X, U)`.
    pub traj: Trajectory,
    /// The scratch trajectory used by `rollout`, `(X_tmp, U_tmp)`. Never
    /// aliased with `traj`.
    pub traj_tmp: Trajectory,

    /// Per-knot cost expansion `E_k`, length `N`.
    pub expansions: Vec<Expansion>,
    /// Per-knot dynamics Jacobians, length `N - 1`.
    pub jac_a: Vec<DMatrix<f64>>,
    pub jac_b: Vec<DMatrix<f64>>,
    /// Per-knot action-value expansion, length `N - 1`.
    pub action_values: Vec<ActionValueExpansion>,
    /// Feedback gains and feedforward terms, length `N - 1`.
    pub gains_k: Vec<DMatrix<f64>>,
    pub gains_d: Vec<DVector<f64>>,
    /// Dense workspace that receives the Cholesky factor of `Quu_reg`; kept
    /// distinct from `Quu_reg` itself so factorizing never clobbers the
    /// unfactored matrix a later step still needs.
    pub chol_workspace: Vec<DMatrix<f64>>,

    /// Cost-to-go accumulator, reused across knots within one backward pass.
    pub cost_to_go: CostToGo,
    /// Per-knot snapshot of the cost-to-go, populated only when
    /// `options.save_S` is set.
    pub saved_cost_to_go: Option<Vec<CostToGo>>,

    pub status: SolverStatus,
    pub reg: RegularizationController,
    pub options: SolverOptions,
    pub dv: [f64; 2],

    pub(crate) delta_x: DVector<f64>,
    pub(crate) delta_u: DVector<f64>,
}

impl<M: Model, C: Cost> SolverState<M, C> {
    /// Allocates every buffer for an `N`-knot problem. `ts` must be strictly
    /// increasing and have at least 2 entries; a single-knot trajectory has
    /// no controls and is rejected here rather than deeper in the solver.
    pub fn new(model: M, cost: C, integrator: Integrator, ts: Vec<f64>, options: SolverOptions) -> Result<Self> {
        ensure!(ts.len() >= 2, "a trajectory needs at least 2 knots, got {}", ts.len());
        for w in ts.windows(2) {
            ensure!(w[1] > w[0], "knot times must be strictly increasing, got {} then {}", w[0], w[1]);
        }

        let n = model.state_dim();
        let m = model.control_dim();
        ensure!(n > 0, "state dimension must be positive");
        ensure!(m > 0, "control dimension must be positive");

        let num_knots = ts.len();
        let traj = Trajectory::new(ts.clone(), n, m);
        let traj_tmp = Trajectory::new(ts, n, m);

        let expansions = (0..num_knots).map(|_| Expansion::zeros(n, m)).collect();
        let jac_a = vec![DMatrix::zeros(n, n); num_knots - 1];
        let jac_b = vec![DMatrix::zeros(n, m); num_knots - 1];
        let action_values = (0..num_knots - 1).map(|_| ActionValueExpansion::zeros(n, m)).collect();
        let gains_k = vec![DMatrix::zeros(m, n); num_knots - 1];
        let gains_d = vec![DVector::zeros(m); num_knots - 1];
        let chol_workspace = vec![DMatrix::zeros(m, m); num_knots - 1];

        let save_S = options.save_S;
        let reg = RegularizationController::new(options.rho_min, options.rho_max, options.rho_factor, options.rho_factor_min);

        Ok(Self {
            model,
            cost,
            integrator,
            n,
            m,
            traj,
            traj_tmp,
            expansions,
            jac_a,
            jac_b,
            action_values,
            gains_k,
            gains_d,
            chol_workspace,
            cost_to_go: CostToGo::zeros(n),
            saved_cost_to_go: save_S.then(|| (0..num_knots - 1).map(|_| CostToGo::zeros(n)).collect()),
            status: SolverStatus::Unsolved,
            reg,
            options,
            dv: [0.0, 0.0],
            delta_x: DVector::zeros(n),
            delta_u: DVector::zeros(m),
        })
    }

    pub fn num_knots(&self) -> usize {
        self.traj.num_knots()
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::fixtures::QuadraticCost;
    use crate::model::fixtures::DoubleIntegrator;
    use crate::options::SolverOptions;
    use crate::regularization::RegularizationType;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn double_integrator_problem(n_knots: usize, dt: f64) -> SolverState<DoubleIntegrator, QuadraticCost> {
        let model = DoubleIntegrator::new(dt);
        let cost = QuadraticCost {
            q: DMatrix::identity(2, 2),
            r: DMatrix::identity(1, 1),
            qf: DMatrix::identity(2, 2) * 10.0,
        };
        let ts: Vec<f64> = (0..n_knots).map(|k| k as f64 * dt).collect();
        let mut solver = SolverState::new(model, cost, Integrator::Euler, ts, SolverOptions::default()).unwrap();
        solver.traj.x[0] = DVector::from_vec(vec![1.0, 0.0]);
        solver
    }

    #[test]
    fn rejects_degenerate_horizon() {
        let model = DoubleIntegrator::new(0.1);
        let cost = QuadraticCost {
            q: DMatrix::identity(2, 2),
            r: DMatrix::identity(1, 1),
            qf: DMatrix::identity(2, 2),
        };
        let res = SolverState::new(model, cost, Integrator::Euler, vec![0.0], SolverOptions::default());
        assert!(res.is_err());
    }

    #[test]
    fn rejects_non_increasing_times() {
        let model = DoubleIntegrator::new(0.1);
        let cost = QuadraticCost {
            q: DMatrix::identity(2, 2),
            r: DMatrix::identity(1, 1),
            qf: DMatrix::identity(2, 2),
        };
        let res = SolverState::new(model, cost, Integrator::Euler, vec![0.0, 0.0, 0.2], SolverOptions::default());
        assert!(res.is_err());
    }

    /// End-to-end check on a double integrator, `N = 51`, `dt = 0.1`. One
    /// backward pass + one rollout at `alpha = 1` should drive `x_N` close
    /// to the origin and the actual cost should match the predicted
    /// reduction to numerical tolerance.
    #[test]
    fn double_integrator_one_step_converges_toward_origin() {
        let mut solver = double_integrator_problem(51, 0.1);

        // Forward-fill the initial trajectory under zero control so every
        // knot has a defined state before the first backward pass.
        for k in 0..solver.num_knots() - 1 {
            let x_prev = solver.traj.x[k].clone();
            let u_prev = solver.traj.u[k].clone();
            let mut x_next = DVector::zeros(solver.n);
            solver.model.discrete_dynamics(&mut x_next, solver.integrator, &x_prev, &u_prev, solver.traj.ts[k], solver.traj.dt(k));
            solver.traj.x[k + 1] = x_next;
        }

        let j_initial = {
            let mut total = 0.0;
            for k in 0..solver.num_knots() - 1 {
                total += solver.cost.cost(&solver.traj.x[k], Some(&solver.traj.u[k]), k);
            }
            total += solver.cost.cost(&solver.traj.x[solver.num_knots() - 1], None, solver.num_knots() - 1);
            total
        };

        solver.options.bp_reg_type = RegularizationType::Control;
        solver.backward_pass().expect("backward pass should succeed on a well-posed LQR problem");
        let (j_actual, aborted) = solver.rollout(1.0);
        assert!(!aborted);

        // phi(1) = dv[0] + dv[1] is the predicted reduction at full step;
        // the actual cost of the rolled-out trajectory should match
        // J_initial - phi(1) to high precision for a linear-quadratic
        // problem.
        let predicted = j_initial - (solver.dv[0] + solver.dv[1]);
        assert!(
            (j_actual - predicted).abs() <= 1e-6 * j_initial.max(1.0),
            "actual {} vs predicted {} (J_initial {})",
            j_actual,
            predicted,
            j_initial
        );

        let x_final = &solver.traj_tmp.x[solver.num_knots() - 1];
        assert!(x_final.norm() <= 1e-2, "final state norm {} too large", x_final.norm());
    }

    #[test]
    fn rollout_at_alpha_zero_is_exact() {
        let mut solver = double_integrator_problem(10, 0.1);
        for k in 0..solver.num_knots() - 1 {
            solver.gains_k[k].fill(0.0);
            solver.gains_d[k].fill(0.0);
        }
        let (j, aborted) = solver.rollout(0.0);
        assert!(!aborted);
        for k in 0..solver.num_knots() {
            assert!((&solver.traj_tmp.x[k] - &solver.traj.x[k]).norm() < 1e-12);
        }
        let mut expected_j = 0.0;
        for k in 0..solver.num_knots() - 1 {
            expected_j += solver.cost.cost(&solver.traj.x[k], Some(&solver.traj.u[k]), k);
        }
        expected_j += solver.cost.cost(&solver.traj.x[solver.num_knots() - 1], None, solver.num_knots() - 1);
        assert_relative_eq!(j, expected_j, epsilon = 1e-9);
    }

    #[test]
    fn rollout_aborts_on_state_limit() {
        let mut solver = double_integrator_problem(5, 0.1);
        solver.options.max_state_value = 1e-6;
        let (j, aborted) = solver.rollout(0.0);
        assert!(aborted);
        assert_eq!(j, 0.0);
        assert_eq!(solver.status, SolverStatus::StateLimit);
    }
}
