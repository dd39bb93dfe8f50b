//! Error types for operations that are not expressed through [`crate::status::SolverStatus`].
//!
//! Construction-time precondition violations (dimension mismatches, bad
//! time steps, degenerate horizons) are reported as `anyhow::Result`, same
//! as the rest of this pack's dense numerical cores. The one place this
//! crate needs a typed error is the constraint capability dispatch: a
//! caller must be able to match on *why* an operation was unsupported
//! rather than just see an opaque failure.

use thiserror::Error;

/// Signals that a constraint variant does not support the requested
/// capability, per the descriptor booleans in the constraint trait.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// Raised by `jacobian` when a constraint couples more than one knot
    /// (`coupled_expansion() == true`) and therefore has no single-knot
    /// Jacobian; callers must use `jacobian_copy` instead.
    #[error("{label} does not expose a stage Jacobian; it couples adjacent knots")]
    NotMarkovian { label: &'static str },

    /// Raised when a coupled constraint is evaluated at knot 0, which has
    /// no predecessor.
    #[error("{label} is undefined at knot {knot}: coupled constraints need a predecessor")]
    NoPredecessor { label: &'static str, knot: usize },
}

pub type ConstraintResult<T> = Result<T, ConstraintError>;
