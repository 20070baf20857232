//! Linear objective expressions.

use super::assignment::Assignment;
use super::constraint::{linear_value, Term};

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// `minimize|maximize Σ weight_i * var_i`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    pub terms: Vec<Term>,
    pub sense: Sense,
}

impl Objective {
    /// Objective value of `assignment`, in the objective's own sense.
    pub fn evaluate(&self, assignment: &Assignment) -> i64 {
        linear_value(&self.terms, assignment)
    }

    /// Whether `candidate` is strictly better than `incumbent`.
    pub fn improves(&self, candidate: i64, incumbent: i64) -> bool {
        match self.sense {
            Sense::Minimize => candidate < incumbent,
            Sense::Maximize => candidate > incumbent,
        }
    }
}
