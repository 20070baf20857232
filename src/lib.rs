//! Shift-rostering as a boolean constraint satisfaction problem.
//!
//! - **Model**: boolean variables keyed by `(nurse, day, shift)`, linear
//!   `==` / `<=` / `>=` constraints and an optional linear objective,
//!   assembled through a validating builder into an immutable model.
//! - **Solver**: exact depth-first branch-and-bound with bound propagation,
//!   component decomposition, deadlines and cancellation.
//! - **Report**: the "who works what" view of an outcome plus search
//!   statistics.
//! - **Nurse**: rostering instance tables that emit a ready-to-solve model,
//!   including the two-week demo instance.
//!
//! # Example
//!
//! ```
//! use u_roster::nurse::NurseProblem;
//! use u_roster::solver::{SolveStatus, SolverConfig};
//!
//! let roster = NurseProblem::two_week_demo().truncate_days(1).build().unwrap();
//! let outcome = roster.solve(&SolverConfig::default());
//! assert_eq!(outcome.status, SolveStatus::Optimal);
//! assert_eq!(roster.decode(&outcome).unwrap().total_wages, 1000);
//! ```
//!
//! # Features
//!
//! - `serde`: serialization of models, instances and outcomes.
//! - `parallel`: rayon portfolio when `SolverConfig::num_workers > 1`.

pub mod model;
pub mod nurse;
pub mod report;
pub mod solver;

pub use solver::solve;
