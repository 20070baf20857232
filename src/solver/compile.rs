//! Lowering of a [`Model`] into `<=` rows and a minimization objective.

use super::outcome::SolveError;
use crate::model::{Comparison, Model, Sense, Term};

/// Largest absolute coefficient sum a row or the objective may have.
///
/// Keeps every intermediate activity, slack and bound in `i64`.
pub(crate) const MAX_ACTIVITY: i64 = i64::MAX / 2;

/// `Σ coeff * x_var <= rhs` over variable indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    pub terms: Vec<(i64, usize)>,
    pub rhs: i64,
}

/// A model lowered for search.
#[derive(Debug, Clone)]
pub(crate) struct Compiled {
    pub num_vars: usize,
    pub rows: Vec<Row>,
    /// Objective in minimization form (weights negated for `Maximize`).
    pub objective: Option<Vec<(i64, usize)>>,
    /// A constraint without terms is violated by every assignment.
    pub trivially_infeasible: bool,
}

pub(crate) fn compile(model: &Model) -> Result<Compiled, SolveError> {
    let mut rows = Vec::with_capacity(model.constraint_count() * 2);
    let mut trivially_infeasible = false;

    for (i, c) in model.constraints().iter().enumerate() {
        if c.terms.is_empty() {
            trivially_infeasible |= !c.op.holds(0, c.rhs);
            continue;
        }
        check_activity(&c.terms, || format!("constraint {i} ({c})"))?;

        let le = || Row {
            terms: lower(&c.terms, false),
            rhs: c.rhs,
        };
        let ge = || -> Result<Row, SolveError> {
            let rhs = c
                .rhs
                .checked_neg()
                .ok_or_else(|| SolveError::Overflow(format!("constraint {i} ({c})")))?;
            Ok(Row {
                terms: lower(&c.terms, true),
                rhs,
            })
        };

        match c.op {
            Comparison::Le => rows.push(le()),
            Comparison::Ge => rows.push(ge()?),
            Comparison::Eq => {
                rows.push(le());
                rows.push(ge()?);
            }
        }
    }

    let objective = match model.objective() {
        Some(obj) => {
            check_activity(&obj.terms, || "the objective".to_string())?;
            Some(lower(&obj.terms, obj.sense == Sense::Maximize))
        }
        None => None,
    };

    Ok(Compiled {
        num_vars: model.variable_count(),
        rows,
        objective,
        trivially_infeasible,
    })
}

/// Coefficients are bounded by [`check_activity`], so negation cannot overflow.
fn lower(terms: &[Term], negate: bool) -> Vec<(i64, usize)> {
    terms
        .iter()
        .map(|t| {
            let coeff = if negate { -t.coeff } else { t.coeff };
            (coeff, t.var.index())
        })
        .collect()
}

fn check_activity(terms: &[Term], what: impl Fn() -> String) -> Result<(), SolveError> {
    let mut sum: i64 = 0;
    for t in terms {
        sum = t
            .coeff
            .checked_abs()
            .and_then(|a| sum.checked_add(a))
            .filter(|&s| s <= MAX_ACTIVITY)
            .ok_or_else(|| SolveError::Overflow(what()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    #[test]
    fn test_eq_splits_into_two_rows() {
        let mut b = ModelBuilder::new("t");
        let x = b.declare_variable(0, 0, 0).unwrap();
        let y = b.declare_variable(1, 0, 0).unwrap();
        b.add_constraint([(1, x), (2, y)], Comparison::Eq, 2).unwrap();
        let compiled = compile(&b.finalize().unwrap()).unwrap();

        assert_eq!(
            compiled.rows,
            vec![
                Row { terms: vec![(1, 0), (2, 1)], rhs: 2 },
                Row { terms: vec![(-1, 0), (-2, 1)], rhs: -2 },
            ]
        );
        assert!(compiled.objective.is_none());
    }

    #[test]
    fn test_maximize_negates_weights() {
        let mut b = ModelBuilder::new("t");
        let x = b.declare_variable(0, 0, 0).unwrap();
        b.set_objective([(5, x)], Sense::Maximize).unwrap();
        let compiled = compile(&b.finalize().unwrap()).unwrap();

        assert_eq!(compiled.objective, Some(vec![(-5, 0)]));
    }

    #[test]
    fn test_constant_row() {
        let mut b = ModelBuilder::new("t");
        let x = b.declare_variable(0, 0, 0).unwrap();
        b.add_constraint([(1, x), (-1, x)], Comparison::Ge, 1).unwrap();
        let compiled = compile(&b.finalize().unwrap()).unwrap();

        assert!(compiled.trivially_infeasible);
        assert!(compiled.rows.is_empty());
    }

    #[test]
    fn test_overflow_detected() {
        let mut b = ModelBuilder::new("t");
        let x = b.declare_variable(0, 0, 0).unwrap();
        let y = b.declare_variable(1, 0, 0).unwrap();
        b.add_constraint([(i64::MAX, x), (i64::MAX, y)], Comparison::Le, 0)
            .unwrap();

        assert!(matches!(
            compile(&b.finalize().unwrap()),
            Err(SolveError::Overflow(_))
        ));
    }

    #[test]
    fn test_ge_rhs_negation_overflow() {
        let mut b = ModelBuilder::new("t");
        let x = b.declare_variable(0, 0, 0).unwrap();
        b.add_constraint([(1, x)], Comparison::Ge, i64::MIN).unwrap();

        assert!(matches!(
            compile(&b.finalize().unwrap()),
            Err(SolveError::Overflow(_))
        ));
    }
}
