//! Nurse rostering instances.
//!
//! [`NurseProblem`] holds the tables of a rostering instance (coverage per
//! day and shift, wages, seniority) and emits the corresponding
//! [`Model`]: every shift is covered by exactly the required number of
//! nurses, nobody works twice on the same day, each shift gets its senior
//! nurse, and total wages are minimized.

use crate::model::{Comparison, Model, ModelBuilder, ModelError, Sense, VarId};
use crate::solver::{BranchAndBound, SolveOutcome, Solver, SolverConfig};
use log::debug;
use std::fmt;

/// How many senior nurses a shift needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SeniorityRule {
    /// Exactly one senior nurse per shift.
    #[default]
    ExactlyOne,
    /// At least one senior nurse per shift.
    AtLeastOne,
}

impl SeniorityRule {
    fn comparison(self) -> Comparison {
        match self {
            SeniorityRule::ExactlyOne => Comparison::Eq,
            SeniorityRule::AtLeastOne => Comparison::Ge,
        }
    }
}

/// Tables of a rostering instance.
///
/// # Examples
///
/// ```
/// use u_roster::nurse::NurseProblem;
///
/// let problem = NurseProblem::new(2, 1, 1)
///     .with_required_nurses(vec![vec![1]])
///     .with_hourly_wage(vec![25, 30])
///     .with_senior(vec![false, true]);
/// let roster = problem.build().unwrap();
/// let outcome = roster.solve(&Default::default());
/// assert_eq!(outcome.objective_value, Some(240));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NurseProblem {
    pub num_nurses: usize,
    pub num_days: usize,
    pub num_shifts: usize,
    /// `required_nurses[d][s]`: nurses needed on day `d`, shift `s`.
    pub required_nurses: Vec<Vec<u32>>,
    /// Wage per hour, per nurse.
    pub hourly_wage: Vec<i64>,
    /// Length of one shift in hours.
    pub shift_hours: i64,
    /// Seniority flag per nurse.
    pub senior: Vec<bool>,
    pub seniority_rule: SeniorityRule,
}

impl NurseProblem {
    /// An instance with zero coverage, zero wages and no senior nurses.
    pub fn new(num_nurses: usize, num_days: usize, num_shifts: usize) -> Self {
        Self {
            num_nurses,
            num_days,
            num_shifts,
            required_nurses: vec![vec![0; num_shifts]; num_days],
            hourly_wage: vec![0; num_nurses],
            shift_hours: 8,
            senior: vec![false; num_nurses],
            seniority_rule: SeniorityRule::default(),
        }
    }

    /// Six nurses, two weeks, three shifts a day.
    ///
    /// Weekdays need `[3, 1, 1]` nurses per shift and weekends `[2, 2, 1]`.
    /// Nurse 3 is the expensive one; nurses 1, 4 and 5 are senior.
    pub fn two_week_demo() -> Self {
        let required_nurses = (0..14)
            .map(|d| match d % 7 {
                5 | 6 => vec![2, 2, 1],
                _ => vec![3, 1, 1],
            })
            .collect();
        Self::new(6, 14, 3)
            .with_required_nurses(required_nurses)
            .with_hourly_wage(vec![25, 30, 15, 2000, 35, 20])
            .with_senior(vec![false, true, false, false, true, true])
    }

    pub fn with_required_nurses(mut self, required: Vec<Vec<u32>>) -> Self {
        self.required_nurses = required;
        self
    }

    pub fn with_hourly_wage(mut self, wages: Vec<i64>) -> Self {
        self.hourly_wage = wages;
        self
    }

    pub fn with_shift_hours(mut self, hours: i64) -> Self {
        self.shift_hours = hours;
        self
    }

    pub fn with_senior(mut self, senior: Vec<bool>) -> Self {
        self.senior = senior;
        self
    }

    pub fn with_seniority_rule(mut self, rule: SeniorityRule) -> Self {
        self.seniority_rule = rule;
        self
    }

    /// Keeps only the first `days` days of the horizon.
    pub fn truncate_days(mut self, days: usize) -> Self {
        self.num_days = self.num_days.min(days);
        self.required_nurses.truncate(self.num_days);
        self
    }

    /// Wage of one shift worked by `nurse`.
    ///
    /// # Panics
    /// Panics if `nurse >= hourly_wage.len()`.
    pub fn shift_wage(&self, nurse: usize) -> i64 {
        self.hourly_wage[nurse].saturating_mul(self.shift_hours)
    }

    /// Validates the table dimensions and values.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_nurses == 0 || self.num_days == 0 || self.num_shifts == 0 {
            return Err("num_nurses, num_days and num_shifts must be positive".into());
        }
        if self.required_nurses.len() != self.num_days {
            return Err(format!(
                "required_nurses has {} days, expected {}",
                self.required_nurses.len(),
                self.num_days
            ));
        }
        if let Some(d) = self
            .required_nurses
            .iter()
            .position(|row| row.len() != self.num_shifts)
        {
            return Err(format!(
                "required_nurses[{d}] has {} shifts, expected {}",
                self.required_nurses[d].len(),
                self.num_shifts
            ));
        }
        if self.hourly_wage.len() != self.num_nurses {
            return Err(format!(
                "hourly_wage has {} entries, expected {}",
                self.hourly_wage.len(),
                self.num_nurses
            ));
        }
        if self.senior.len() != self.num_nurses {
            return Err(format!(
                "senior has {} entries, expected {}",
                self.senior.len(),
                self.num_nurses
            ));
        }
        if self.shift_hours <= 0 {
            return Err("shift_hours must be positive".into());
        }
        if let Some(n) = self.hourly_wage.iter().position(|&w| w < 0) {
            return Err(format!("hourly_wage[{n}] is negative"));
        }
        if self
            .hourly_wage
            .iter()
            .any(|&w| w.checked_mul(self.shift_hours).is_none())
        {
            return Err("shift wage overflows i64".into());
        }
        Ok(())
    }

    /// Emits the rostering model.
    pub fn build(&self) -> Result<NurseModel, ModelError> {
        self.validate().map_err(ModelError::InvalidInstance)?;
        let (nurses, days, shifts) = (self.num_nurses, self.num_days, self.num_shifts);

        let mut builder = ModelBuilder::new(format!("roster-{nurses}x{days}x{shifts}"));
        let mut vars = Vec::with_capacity(nurses * days * shifts);
        for n in 0..nurses {
            for d in 0..days {
                for s in 0..shifts {
                    vars.push(builder.declare_variable(n, d, s)?);
                }
            }
        }
        let var = |n: usize, d: usize, s: usize| vars[(n * days + d) * shifts + s];

        for d in 0..days {
            for s in 0..shifts {
                let required = i64::from(self.required_nurses[d][s]);
                builder.add_constraint((0..nurses).map(|n| (1, var(n, d, s))), Comparison::Eq, required)?;
            }
        }

        for n in 0..nurses {
            for d in 0..days {
                builder.add_constraint((0..shifts).map(|s| (1, var(n, d, s))), Comparison::Le, 1)?;
            }
        }

        let op = self.seniority_rule.comparison();
        for d in 0..days {
            for s in 0..shifts {
                let terms = (0..nurses).map(|n| (i64::from(self.senior[n]), var(n, d, s)));
                builder.add_constraint(terms, op, 1)?;
            }
        }

        let objective = (0..nurses).flat_map(|n| {
            let wage = self.shift_wage(n);
            (0..days).flat_map(move |d| (0..shifts).map(move |s| (wage, var(n, d, s))))
        });
        builder.set_objective(objective, Sense::Minimize)?;

        let model = builder.finalize()?;
        debug!(
            "built {}: {} variables, {} constraints",
            model.name(),
            model.variable_count(),
            model.constraint_count()
        );
        Ok(NurseModel {
            problem: self.clone(),
            model,
            vars,
        })
    }
}

/// A built rostering model together with its instance tables.
#[derive(Debug, Clone)]
pub struct NurseModel {
    problem: NurseProblem,
    model: Model,
    /// Handles in `(nurse, day, shift)` order.
    vars: Vec<VarId>,
}

impl NurseModel {
    pub fn problem(&self) -> &NurseProblem {
        &self.problem
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Handle of "nurse `n` works shift `s` on day `d`".
    pub fn var(&self, n: usize, d: usize, s: usize) -> Option<VarId> {
        let p = &self.problem;
        if n >= p.num_nurses || d >= p.num_days || s >= p.num_shifts {
            return None;
        }
        self.vars.get((n * p.num_days + d) * p.num_shifts + s).copied()
    }

    pub fn solve(&self, config: &SolverConfig) -> SolveOutcome {
        BranchAndBound::new().solve(&self.model, config)
    }

    /// The roster encoded by `outcome`, if it carries a complete assignment.
    pub fn decode(&self, outcome: &SolveOutcome) -> Option<Roster> {
        let assignment = outcome.assignment.as_ref()?;
        if assignment.len() != self.model.variable_count() {
            return None;
        }
        let p = &self.problem;

        let mut days = Vec::with_capacity(p.num_days);
        for d in 0..p.num_days {
            let mut entries = Vec::new();
            for n in 0..p.num_nurses {
                for s in 0..p.num_shifts {
                    if assignment.is_set(self.var(n, d, s)?) {
                        entries.push(RosterEntry {
                            nurse: n,
                            shift: s,
                            senior: p.senior[n],
                            wage: p.shift_wage(n),
                        });
                    }
                }
            }
            days.push(DayRoster { day: d, entries });
        }

        let total_wages = days
            .iter()
            .flat_map(|day| &day.entries)
            .map(|e| e.wage)
            .sum();
        Some(Roster { days, total_wages })
    }
}

/// One worked shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterEntry {
    pub nurse: usize,
    pub shift: usize,
    pub senior: bool,
    /// Wage paid for the shift.
    pub wage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayRoster {
    pub day: usize,
    /// Worked shifts ordered by nurse, then shift.
    pub entries: Vec<RosterEntry>,
}

/// A decoded roster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    pub days: Vec<DayRoster>,
    pub total_wages: i64,
}

impl Roster {
    /// Number of shifts worked by `nurse` over the horizon.
    pub fn shifts_worked(&self, nurse: usize) -> usize {
        self.days
            .iter()
            .flat_map(|day| &day.entries)
            .filter(|e| e.nurse == nurse)
            .count()
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        for day in &self.days {
            writeln!(f, "Day {}", day.day)?;
            for e in &day.entries {
                writeln!(
                    f,
                    "  Nurse {} (seniority: {}) works shift {} ({}$)",
                    e.nurse,
                    u8::from(e.senior),
                    e.shift,
                    e.wage
                )?;
            }
        }
        write!(f, "Total wages = {}", self.total_wages)
    }
}
