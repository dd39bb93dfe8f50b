//! Solver status enum.
//!
//! The core never logs its way out of a failure; it always leaves the
//! solver in one of these states and lets the outer loop decide what to do
//! about it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// No terminal condition has been reached yet.
    Unsolved,
    /// A rollout's state norm exceeded `max_state_value` (or was NaN).
    StateLimit,
    /// A rollout's control norm exceeded `max_control_value` (or was NaN).
    ControlLimit,
    /// The backward pass restarted enough times to push `rho` past `rho_max`.
    RegularizationMax,
    /// The outer loop has declared convergence (set externally; this crate
    /// never sets it itself, but owns the slot so every piece of solver
    /// state lives in one place).
    Converged,
}

impl Default for SolverStatus {
    fn default() -> Self {
        SolverStatus::Unsolved
    }
}
