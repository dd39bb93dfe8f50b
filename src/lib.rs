//! Iterative LQR (iLQR) trajectory optimization core.
//!
//! This crate implements the inner loop of a constrained trajectory
//! optimizer: a Riccati-style backward pass with Hessian regularization, a
//! line-search forward rollout, and a small closed-set constraint library
//! (goal, dynamics-coupling, bound, and norm constraints) that an outer
//! augmented-Lagrangian loop (not part of this crate) consumes.
//!
//! Nothing here allocates inside the hot loops: [`solver::SolverState`]
//! owns every buffer the backward pass and forward rollout touch, and both
//! passes operate strictly on borrowed mutable references into it.
//!
//! The crate never decides whether to accept a step or when to stop
//! iterating — that is the outer loop's job. It only ever reports outcomes
//! through [`status::SolverStatus`] or a returned `Result`.

#![allow(non_snake_case)]

pub mod backward;
pub mod constraints;
pub mod cost;
pub mod error;
pub mod expansion;
pub mod forward;
pub mod linalg;
pub mod model;
pub mod options;
pub mod regularization;
pub mod solver;
pub mod status;
pub mod trajectory;

pub use cost::{Cost, Expansion};
pub use model::{Integrator, Model};
pub use options::SolverOptions;
pub use regularization::{RegularizationController, RegularizationType};
pub use solver::SolverState;
pub use status::SolverStatus;
pub use trajectory::Trajectory;
