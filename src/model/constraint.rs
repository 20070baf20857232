//! Linear constraints over boolean variables.

use super::assignment::Assignment;
use super::error::ModelError;
use super::variables::{VarId, VariableStore};
use std::collections::HashMap;
use std::fmt;

/// One `coefficient * variable` product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Term {
    pub coeff: i64,
    pub var: VarId,
}

impl Term {
    pub fn new(coeff: i64, var: VarId) -> Self {
        Self { coeff, var }
    }
}

impl From<(i64, VarId)> for Term {
    fn from((coeff, var): (i64, VarId)) -> Self {
        Self { coeff, var }
    }
}

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    /// `lhs == rhs`
    Eq,
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
}

impl Comparison {
    /// Whether `lhs <op> rhs` holds.
    #[inline]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Eq => "==",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        })
    }
}

/// `Σ coeff_i * var_i <op> rhs`.
///
/// Terms are normalized on construction: repeated variables are merged and
/// zero coefficients are dropped, so a constraint may end up with no terms
/// (a constant comparison `0 <op> rhs`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearConstraint {
    pub terms: Vec<Term>,
    pub op: Comparison,
    pub rhs: i64,
}

impl LinearConstraint {
    /// Weighted sum of the assigned values. Saturates instead of wrapping.
    pub fn activity(&self, assignment: &Assignment) -> i64 {
        linear_value(&self.terms, assignment)
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.op.holds(self.activity(assignment), self.rhs)
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            f.write_str("0")?;
        }
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}*{}", t.coeff, t.var)?;
        }
        write!(f, " {} {}", self.op, self.rhs)
    }
}

/// Flat, insertion-ordered list of linear constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: Vec<LinearConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `Σ terms <op> rhs`.
    ///
    /// Fails if `terms` is empty or names a variable unknown to `store`;
    /// the set is unchanged on failure.
    pub fn add_linear<I>(
        &mut self,
        terms: I,
        op: Comparison,
        rhs: i64,
        store: &VariableStore,
    ) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (i64, VarId)>,
    {
        let terms = normalize_terms(terms, store)?.ok_or(ModelError::EmptyConstraint)?;
        self.constraints.push(LinearConstraint { terms, op, rhs });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinearConstraint> {
        self.constraints.iter()
    }

    #[cfg(feature = "serde")]
    pub(crate) fn push(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn into_vec(self) -> Vec<LinearConstraint> {
        self.constraints
    }
}

/// Validates and normalizes caller terms.
///
/// Returns `Ok(None)` when the caller passed no terms at all. Terms are
/// merged per variable (first-occurrence order); a merged coefficient that
/// does not fit in `i64` is rejected rather than clamped.
pub(crate) fn normalize_terms<I>(
    terms: I,
    store: &VariableStore,
) -> Result<Option<Vec<Term>>, ModelError>
where
    I: IntoIterator<Item = (i64, VarId)>,
{
    let mut merged: Vec<(VarId, i128)> = Vec::new();
    let mut slot: HashMap<VarId, usize> = HashMap::new();
    let mut seen_any = false;

    for (coeff, var) in terms {
        seen_any = true;
        if !store.contains(var) {
            return Err(ModelError::UnknownHandle(var));
        }
        match slot.get(&var) {
            Some(&i) => merged[i].1 += i128::from(coeff),
            None => {
                slot.insert(var, merged.len());
                merged.push((var, i128::from(coeff)));
            }
        }
    }

    if !seen_any {
        return Ok(None);
    }
    let mut out = Vec::with_capacity(merged.len());
    for (var, sum) in merged {
        let coeff = i64::try_from(sum).map_err(|_| ModelError::CoefficientOverflow(var))?;
        if coeff != 0 {
            out.push(Term::new(coeff, var));
        }
    }
    Ok(Some(out))
}

pub(crate) fn linear_value(terms: &[Term], assignment: &Assignment) -> i64 {
    terms
        .iter()
        .filter(|t| assignment.is_set(t.var))
        .fold(0i64, |acc, t| acc.saturating_add(t.coeff))
}
