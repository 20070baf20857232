//! Human-readable view of a solve outcome.

use crate::model::{Model, ShiftKey};
use crate::solver::{SearchStats, SolveOutcome, SolveStatus};
use std::fmt;

/// Pairs a [`SolveOutcome`] with the model it was produced for.
///
/// # Examples
///
/// ```
/// use u_roster::model::{Comparison, ModelBuilder, Sense};
/// use u_roster::report::Report;
/// use u_roster::solver::solve;
///
/// let mut builder = ModelBuilder::new("one-slot");
/// let x = builder.declare_variable(0, 0, 0).unwrap();
/// builder.add_constraint([(1, x)], Comparison::Eq, 1).unwrap();
/// builder.set_objective([(200, x)], Sense::Minimize).unwrap();
/// let model = builder.finalize().unwrap();
///
/// let outcome = solve(&model, None);
/// let report = Report::new(&model, &outcome);
/// assert_eq!(report.working().len(), 1);
/// assert_eq!(report.objective_value(), Some(200));
/// assert!(report.to_string().contains("Statistics"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    model: &'a Model,
    outcome: &'a SolveOutcome,
}

impl<'a> Report<'a> {
    pub fn new(model: &'a Model, outcome: &'a SolveOutcome) -> Self {
        Self { model, outcome }
    }

    pub fn status(&self) -> SolveStatus {
        self.outcome.status
    }

    /// Variables valued 1, ordered by `(day, nurse, shift)`.
    ///
    /// Empty when the outcome carries no assignment.
    pub fn working(&self) -> Vec<ShiftKey> {
        let Some(assignment) = &self.outcome.assignment else {
            return Vec::new();
        };
        let mut keys: Vec<ShiftKey> = assignment
            .ones()
            .filter_map(|v| self.model.variables().key(v))
            .collect();
        keys.sort_by_key(|k| (k.day, k.nurse, k.shift));
        keys
    }

    pub fn objective_value(&self) -> Option<i64> {
        self.outcome.objective_value
    }

    pub fn stats(&self) -> &SearchStats {
        &self.outcome.stats
    }

    fn write_solution(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut day = None;
        for key in self.working() {
            if day != Some(key.day) {
                writeln!(f, "Day {}", key.day)?;
                day = Some(key.day);
            }
            writeln!(f, "  Nurse {} works shift {}", key.nurse, key.shift)?;
        }
        if let Some(value) = self.objective_value() {
            writeln!(f, "Objective = {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        match outcome.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                writeln!(f, "Solution ({}):", outcome.status)?;
                self.write_solution(f)?;
            }
            SolveStatus::Infeasible => writeln!(f, "No solution: the model is infeasible")?,
            SolveStatus::Cancelled => {
                match outcome.stop_reason {
                    Some(reason) => writeln!(f, "Search cancelled: {reason}")?,
                    None => writeln!(f, "Search cancelled")?,
                }
                if outcome.assignment.is_some() {
                    writeln!(f, "Best solution found:")?;
                    self.write_solution(f)?;
                } else {
                    writeln!(f, "No solution found before stopping")?;
                }
            }
            SolveStatus::Error => writeln!(
                f,
                "Solver error: {}",
                outcome.message.as_deref().unwrap_or("unknown")
            )?,
        }
        writeln!(f)?;
        write!(f, "{}", outcome.stats)
    }
}
