//! Exact branch-and-bound solver for shift-assignment models.
//!
//! # Algorithm
//!
//! 1. Lower every constraint to `Σ c_i x_i <= rhs` rows and the objective
//!    to minimization form.
//! 2. Split the variables into connected components of the constraint
//!    graph; each component is searched on its own.
//! 3. Depth-first search with an explicit frame stack: pick the first free
//!    variable in [`VariableOrder`], try both values in [`ValueOrder`],
//!    propagate row bounds to a fixpoint after every decision and undo the
//!    trail on backtrack.
//! 4. Every improving leaf tightens an objective cut row, so nodes whose
//!    lower bound cannot beat the incumbent fail immediately.
//!
//! # Example
//!
//! ```
//! use u_roster::model::{Comparison, ModelBuilder, Sense};
//! use u_roster::solver::{solve, SolveStatus};
//!
//! let mut builder = ModelBuilder::new("one-slot");
//! let x = builder.declare_variable(0, 0, 0).unwrap();
//! builder.add_constraint([(1, x)], Comparison::Eq, 1).unwrap();
//! builder.set_objective([(200, x)], Sense::Minimize).unwrap();
//! let model = builder.finalize().unwrap();
//!
//! let outcome = solve(&model, None);
//! assert_eq!(outcome.status, SolveStatus::Optimal);
//! assert_eq!(outcome.objective_value, Some(200));
//! ```

mod compile;
mod component;
mod config;
mod outcome;
#[cfg(feature = "parallel")]
mod portfolio;
mod propagator;
mod runner;
mod search;
mod stats;
mod trail;

pub use config::{SolverConfig, ValueOrder, VariableOrder};
pub use outcome::{SolveError, SolveOutcome, SolveStatus, StopReason};
pub use runner::{solve, BranchAndBound, Solver};
pub use stats::SearchStats;
