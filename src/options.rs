//! Solver option set.

use crate::regularization::RegularizationType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Rollout abort threshold on `||x||_inf`.
    pub max_state_value: f64,
    /// Rollout abort threshold on `||u||_inf`.
    pub max_control_value: f64,
    /// If true, the `Control` regularization branch checks `Quu_reg` for
    /// positive definiteness via Cholesky and restarts on failure.
    pub bp_reg: bool,
    /// Which Hessian blocks absorb regularization in the backward pass.
    pub bp_reg_type: RegularizationType,
    /// Persist `(P, p, dv)` per knot for diagnostics.
    pub save_S: bool,
    pub rho_min: f64,
    pub rho_max: f64,
    pub rho_factor_min: f64,
    pub rho_factor: f64,
    /// Maximum number of backward-pass restarts before giving up even if
    /// `rho_max` has not technically been exceeded (a belt-and-suspenders
    /// bound; see `backward::backward_pass`).
    pub max_restarts: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_state_value: 1.0e8,
            max_control_value: 1.0e8,
            bp_reg: true,
            bp_reg_type: RegularizationType::Control,
            save_S: false,
            rho_min: 1e-8,
            rho_max: 1e8,
            rho_factor_min: 1.0,
            rho_factor: 1.6,
            max_restarts: 25,
        }
    }
}

impl SolverOptions {
    /// A looser preset for problems where occasional large excursions are
    /// expected and shouldn't trip the rollout limits.
    pub fn permissive() -> Self {
        Self {
            max_state_value: 1.0e12,
            max_control_value: 1.0e12,
            ..Default::default()
        }
    }
}
