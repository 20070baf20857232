//! Solve outcomes.

use super::stats::SearchStats;
use crate::model::Assignment;
use std::fmt;
use thiserror::Error;

/// Terminal status of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// A solution was found and no better objective value exists.
    /// Models without objective report their first solution as optimal.
    Optimal,
    /// A solution was found but optimality was not proven.
    Feasible,
    /// The whole search space was exhausted without a solution.
    Infeasible,
    /// The search was stopped by a deadline, cancellation flag or node limit.
    Cancelled,
    /// The solver could not run (invalid configuration, arithmetic overflow).
    Error,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Cancelled => "CANCELLED",
            SolveStatus::Error => "ERROR",
        })
    }
}

/// Why a search stopped before exhausting its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    Deadline,
    Cancelled,
    NodeLimit,
    FirstSolution,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Deadline => "deadline reached",
            StopReason::Cancelled => "cancelled",
            StopReason::NodeLimit => "node limit reached",
            StopReason::FirstSolution => "stopped after first solution",
        })
    }
}

/// Internal solver faults, surfaced as [`SolveStatus::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("arithmetic overflow while bounding {0}")]
    Overflow(String),
}

/// Result of a solve call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Best complete assignment found, if any.
    pub assignment: Option<Assignment>,
    /// Objective value of `assignment`, in the model's own sense.
    pub objective_value: Option<i64>,
    pub stats: SearchStats,
    pub stop_reason: Option<StopReason>,
    /// Error description for [`SolveStatus::Error`].
    pub message: Option<String>,
}

impl SolveOutcome {
    pub(crate) fn error(err: SolveError, stats: SearchStats) -> Self {
        Self {
            status: SolveStatus::Error,
            assignment: None,
            objective_value: None,
            stats,
            stop_reason: None,
            message: Some(err.to_string()),
        }
    }

    pub(crate) fn infeasible(stats: SearchStats) -> Self {
        Self {
            status: SolveStatus::Infeasible,
            assignment: None,
            objective_value: None,
            stats,
            stop_reason: None,
            message: None,
        }
    }

    /// Whether a complete solution is available.
    pub fn is_solution_found(&self) -> bool {
        self.assignment.is_some()
    }

    /// Whether the search finished with a proof (optimality or infeasibility).
    pub fn is_proven(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Infeasible)
    }
}
