//! Complete 0/1 assignments.

use super::variables::VarId;

/// A value for every variable of a model.
///
/// Assignments are produced by the solver only for complete solutions;
/// partial search states never escape as an `Assignment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    /// Wraps one value per variable, indexed by [`VarId::index`].
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Value of `var` as 0 or 1.
    ///
    /// # Panics
    /// Panics if `var` is not a variable of the model this assignment was
    /// produced for.
    #[inline]
    pub fn value(&self, var: VarId) -> u8 {
        u8::from(self.values[var.index()])
    }

    #[inline]
    pub fn is_set(&self, var: VarId) -> bool {
        self.values[var.index()]
    }

    pub fn get(&self, var: VarId) -> Option<bool> {
        self.values.get(var.index()).copied()
    }

    /// Variables assigned 1, in handle order.
    pub fn ones(&self) -> impl Iterator<Item = VarId> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(|(i, _)| VarId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.values
    }
}
