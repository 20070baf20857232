//! Model builder and the finalized, immutable model.

use super::assignment::Assignment;
use super::constraint::{normalize_terms, Comparison, ConstraintSet, LinearConstraint};
use super::error::ModelError;
use super::objective::{Objective, Sense};
use super::variables::{ShiftKey, VarId, VariableStore};

/// Incrementally builds a [`Model`].
///
/// Every call validates its input and leaves the builder untouched on
/// error, so a caller may recover from a bad constraint and keep going.
/// After [`finalize`](Self::finalize) the builder is frozen and every
/// mutating call fails with [`ModelError::Frozen`].
///
/// # Examples
///
/// ```
/// use u_roster::model::{Comparison, ModelBuilder, Sense};
///
/// let mut builder = ModelBuilder::new("example");
/// let a = builder.declare_variable(0, 0, 0).unwrap();
/// let b = builder.declare_variable(1, 0, 0).unwrap();
/// builder.add_constraint([(1, a), (1, b)], Comparison::Eq, 1).unwrap();
/// builder.set_objective([(200, a), (240, b)], Sense::Minimize).unwrap();
///
/// let model = builder.finalize().unwrap();
/// assert_eq!(model.variable_count(), 2);
/// assert_eq!(model.constraint_count(), 1);
/// assert!(builder.declare_variable(2, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    name: String,
    vars: VariableStore,
    constraints: ConstraintSet,
    objective: Option<Objective>,
    frozen: bool,
}

impl ModelBuilder {
    /// Creates an empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declares the boolean variable "nurse `n` works shift `s` on day `d`".
    pub fn declare_variable(&mut self, n: usize, d: usize, s: usize) -> Result<VarId, ModelError> {
        self.ensure_open()?;
        self.vars.declare(ShiftKey::new(n, d, s))
    }

    /// Returns the handle of a previously declared variable.
    pub fn lookup(&self, n: usize, d: usize, s: usize) -> Result<VarId, ModelError> {
        self.vars.lookup(ShiftKey::new(n, d, s))
    }

    /// Adds `Σ coeff * var <op> rhs`.
    pub fn add_constraint<I>(&mut self, terms: I, op: Comparison, rhs: i64) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (i64, VarId)>,
    {
        self.ensure_open()?;
        self.constraints.add_linear(terms, op, rhs, &self.vars)
    }

    /// Sets the objective. Only one objective may be set per model.
    pub fn set_objective<I>(&mut self, terms: I, sense: Sense) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (i64, VarId)>,
    {
        self.ensure_open()?;
        if self.objective.is_some() {
            return Err(ModelError::ObjectiveAlreadySet);
        }
        let terms = normalize_terms(terms, &self.vars)?.ok_or(ModelError::EmptyObjective)?;
        self.objective = Some(Objective { terms, sense });
        Ok(())
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Validates referential integrity and returns the immutable model.
    ///
    /// The builder is frozen afterwards, whether or not it is reused.
    pub fn finalize(&mut self) -> Result<Model, ModelError> {
        self.ensure_open()?;
        check_references(&self.vars, self.constraints.iter(), self.objective.as_ref())?;

        self.frozen = true;
        Ok(Model {
            name: std::mem::take(&mut self.name),
            vars: std::mem::take(&mut self.vars),
            constraints: std::mem::take(&mut self.constraints).into_vec(),
            objective: self.objective.take(),
        })
    }

    fn ensure_open(&self) -> Result<(), ModelError> {
        if self.frozen {
            Err(ModelError::Frozen)
        } else {
            Ok(())
        }
    }
}

/// A finalized shift-assignment model.
///
/// Immutable and `Send + Sync`: any number of solvers or observers may
/// share a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "ModelData", try_from = "ModelData")
)]
pub struct Model {
    name: String,
    vars: VariableStore,
    constraints: Vec<LinearConstraint>,
    objective: Option<Objective>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn variable_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Checks that every referenced handle belongs to this model.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_references(&self.vars, self.constraints.iter(), self.objective.as_ref())
    }

    /// Constraints violated by `assignment`, in insertion order.
    pub fn violated_constraints<'a>(
        &'a self,
        assignment: &'a Assignment,
    ) -> impl Iterator<Item = &'a LinearConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| !c.is_satisfied_by(assignment))
    }

    /// Whether `assignment` covers every variable and satisfies every constraint.
    pub fn is_feasible(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.vars.len() && self.violated_constraints(assignment).next().is_none()
    }

    /// Objective value of `assignment`, if the model has an objective.
    pub fn objective_value(&self, assignment: &Assignment) -> Option<i64> {
        self.objective.as_ref().map(|o| o.evaluate(assignment))
    }
}

fn check_references<'a>(
    vars: &VariableStore,
    constraints: impl Iterator<Item = &'a LinearConstraint>,
    objective: Option<&'a Objective>,
) -> Result<(), ModelError> {
    let objective_terms = objective.into_iter().flat_map(|o| o.terms.iter());
    for term in constraints.flat_map(|c| c.terms.iter()).chain(objective_terms) {
        if !vars.contains(term.var) {
            return Err(ModelError::UnknownHandle(term.var));
        }
    }
    Ok(())
}

/// Plain serialized form of a [`Model`]; deserialization replays it
/// through [`ModelBuilder`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelData {
    name: String,
    variables: Vec<ShiftKey>,
    constraints: Vec<LinearConstraint>,
    objective: Option<Objective>,
}

#[cfg(feature = "serde")]
impl From<Model> for ModelData {
    fn from(model: Model) -> Self {
        Self {
            name: model.name,
            variables: model.vars.into(),
            constraints: model.constraints,
            objective: model.objective,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<ModelData> for Model {
    type Error = ModelError;

    fn try_from(data: ModelData) -> Result<Self, Self::Error> {
        let mut builder = ModelBuilder::new(data.name);
        for key in data.variables {
            builder.declare_variable(key.nurse, key.day, key.shift)?;
        }
        for c in data.constraints {
            if c.terms.is_empty() {
                // constant rows survive normalization and must round-trip
                builder.constraints.push(c);
                continue;
            }
            let terms = c.terms.into_iter().map(|t| (t.coeff, t.var));
            builder.add_constraint(terms, c.op, c.rhs)?;
        }
        if let Some(obj) = data.objective {
            builder.set_objective(obj.terms.into_iter().map(|t| (t.coeff, t.var)), obj.sense)?;
        }
        builder.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var_builder() -> (ModelBuilder, VarId, VarId) {
        let mut b = ModelBuilder::new("test");
        let x = b.declare_variable(0, 0, 0).unwrap();
        let y = b.declare_variable(1, 0, 0).unwrap();
        (b, x, y)
    }

    #[test]
    fn test_build_model() {
        let (mut b, x, y) = two_var_builder();
        b.add_constraint([(1, x), (1, y)], Comparison::Le, 1).unwrap();
        b.set_objective([(3, x), (4, y)], Sense::Maximize).unwrap();

        let model = b.finalize().unwrap();
        assert_eq!(model.name(), "test");
        assert_eq!(model.variable_count(), 2);
        assert_eq!(model.constraint_count(), 1);
        assert_eq!(model.objective().unwrap().sense, Sense::Maximize);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_frozen_after_finalize() {
        let (mut b, x, _) = two_var_builder();
        b.finalize().unwrap();

        assert!(b.is_frozen());
        assert_eq!(b.declare_variable(5, 0, 0), Err(ModelError::Frozen));
        assert_eq!(
            b.add_constraint([(1, x)], Comparison::Le, 1),
            Err(ModelError::Frozen)
        );
        assert_eq!(
            b.set_objective([(1, x)], Sense::Minimize),
            Err(ModelError::Frozen)
        );
        assert_eq!(b.finalize().unwrap_err(), ModelError::Frozen);
    }

    #[test]
    fn test_second_objective_rejected() {
        let (mut b, x, y) = two_var_builder();
        b.set_objective([(1, x)], Sense::Minimize).unwrap();

        assert_eq!(
            b.set_objective([(1, y)], Sense::Minimize),
            Err(ModelError::ObjectiveAlreadySet)
        );
        let model = b.finalize().unwrap();
        assert_eq!(model.objective().unwrap().terms.len(), 1);
        assert_eq!(model.objective().unwrap().terms[0].var, x);
    }

    #[test]
    fn test_builder_usable_after_error() {
        let (mut b, x, y) = two_var_builder();
        let foreign = VarId(99);

        assert_eq!(
            b.add_constraint([(1, x), (1, foreign)], Comparison::Eq, 1),
            Err(ModelError::UnknownHandle(foreign))
        );
        assert_eq!(
            b.declare_variable(0, 0, 0),
            Err(ModelError::DuplicateVariable(ShiftKey::new(0, 0, 0)))
        );
        assert_eq!(
            b.add_constraint(Vec::new(), Comparison::Eq, 1),
            Err(ModelError::EmptyConstraint)
        );
        assert_eq!(
            b.set_objective(Vec::new(), Sense::Minimize),
            Err(ModelError::EmptyObjective)
        );

        b.add_constraint([(1, x), (1, y)], Comparison::Eq, 1).unwrap();
        let model = b.finalize().unwrap();
        assert_eq!(model.constraint_count(), 1);
        assert!(model.objective().is_none());
    }

    #[test]
    fn test_lookup() {
        let (b, _, y) = two_var_builder();
        assert_eq!(b.lookup(1, 0, 0).unwrap(), y);
        assert_eq!(
            b.lookup(2, 0, 0),
            Err(ModelError::UnknownVariable(ShiftKey::new(2, 0, 0)))
        );
    }

    #[test]
    fn test_feasibility_check() {
        let (mut b, x, y) = two_var_builder();
        b.add_constraint([(1, x), (1, y)], Comparison::Eq, 1).unwrap();
        b.set_objective([(10, x), (20, y)], Sense::Minimize).unwrap();
        let model = b.finalize().unwrap();

        let good = Assignment::new(vec![true, false]);
        let bad = Assignment::new(vec![true, true]);
        assert!(model.is_feasible(&good));
        assert!(!model.is_feasible(&bad));
        assert_eq!(model.violated_constraints(&bad).count(), 1);
        assert_eq!(model.objective_value(&good), Some(10));
        assert!(!model.is_feasible(&Assignment::new(vec![true])));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let (mut b, x, y) = two_var_builder();
        b.add_constraint([(1, x), (1, y)], Comparison::Ge, 1).unwrap();
        b.set_objective([(7, x), (9, y)], Sense::Minimize).unwrap();
        let model = b.finalize().unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rejects_dangling_handle() {
        let json = r#"{
            "name": "bad",
            "variables": [{"nurse": 0, "day": 0, "shift": 0}],
            "constraints": [{"terms": [{"coeff": 1, "var": 3}], "op": "Le", "rhs": 1}],
            "objective": null
        }"#;
        assert!(serde_json::from_str::<Model>(json).is_err());
    }
}
