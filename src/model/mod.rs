//! Shift-assignment CSP modeling layer.
//!
//! Expresses a rostering problem as boolean decision variables, one per
//! `(nurse, day, shift)` triple, tied together by linear constraints and an
//! optional linear objective.
//!
//! # Key Components
//!
//! - **Variables**: [`VariableStore`], [`ShiftKey`], [`VarId`]
//! - **Constraints**: [`LinearConstraint`], [`ConstraintSet`], [`Comparison`]
//! - **Objective**: [`Objective`], [`Sense`]
//! - **Model**: [`ModelBuilder`] → [`Model`] (immutable once finalized)
//! - **Assignments**: [`Assignment`], complete 0/1 solutions
//!
//! # Design
//!
//! This module defines the modeling layer only. Solving lives in
//! [`crate::solver`], which consumes a finalized [`Model`] read-only.

mod assignment;
mod builder;
mod constraint;
mod error;
mod objective;
mod variables;

pub use assignment::Assignment;
pub use builder::{Model, ModelBuilder};
pub use constraint::{Comparison, ConstraintSet, LinearConstraint, Term};
pub use error::ModelError;
pub use objective::{Objective, Sense};
pub use variables::{ShiftKey, VarId, VariableStore};
