//! Boolean decision variables and the store that owns them.

use super::error::ModelError;
use std::collections::HashMap;
use std::fmt;

/// Identity of a shift decision: "nurse `nurse` works shift `shift` on day `day`".
///
/// Ordering is lexical on `(nurse, day, shift)`, which is also the default
/// branching order of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftKey {
    pub nurse: usize,
    pub day: usize,
    pub shift: usize,
}

impl ShiftKey {
    pub fn new(nurse: usize, day: usize, shift: usize) -> Self {
        Self { nurse, day, shift }
    }
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shift_n{}d{}s{}", self.nurse, self.day, self.shift)
    }
}

/// Handle to a boolean variable of a model.
///
/// Handles are dense indices in declaration order and are only meaningful
/// for the builder (and model) that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub(crate) u32);

impl VarId {
    /// Position of the variable in declaration order.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Registry of boolean decision variables keyed by [`ShiftKey`].
///
/// # Examples
///
/// ```
/// use u_roster::model::{ShiftKey, VariableStore};
///
/// let mut store = VariableStore::new();
/// let x = store.declare(ShiftKey::new(0, 0, 0)).unwrap();
/// assert_eq!(store.lookup(ShiftKey::new(0, 0, 0)).unwrap(), x);
/// assert!(store.declare(ShiftKey::new(0, 0, 0)).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<ShiftKey>", try_from = "Vec<ShiftKey>")
)]
pub struct VariableStore {
    keys: Vec<ShiftKey>,
    index: HashMap<ShiftKey, VarId>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh variable for `key`.
    pub fn declare(&mut self, key: ShiftKey) -> Result<VarId, ModelError> {
        if self.index.contains_key(&key) {
            return Err(ModelError::DuplicateVariable(key));
        }
        let id = u32::try_from(self.keys.len())
            .map(VarId)
            .map_err(|_| ModelError::InvalidInstance("too many variables".into()))?;
        self.keys.push(key);
        self.index.insert(key, id);
        Ok(id)
    }

    /// Returns the handle declared for `key`.
    pub fn lookup(&self, key: ShiftKey) -> Result<VarId, ModelError> {
        self.index
            .get(&key)
            .copied()
            .ok_or(ModelError::UnknownVariable(key))
    }

    /// Returns the key a handle was declared with.
    pub fn key(&self, id: VarId) -> Option<ShiftKey> {
        self.keys.get(id.index()).copied()
    }

    pub fn contains(&self, id: VarId) -> bool {
        id.index() < self.keys.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates `(handle, key)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, ShiftKey)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, &key)| (VarId(i as u32), key))
    }
}

impl From<VariableStore> for Vec<ShiftKey> {
    fn from(store: VariableStore) -> Self {
        store.keys
    }
}

impl TryFrom<Vec<ShiftKey>> for VariableStore {
    type Error = ModelError;

    fn try_from(keys: Vec<ShiftKey>) -> Result<Self, Self::Error> {
        let mut store = VariableStore::new();
        for key in keys {
            store.declare(key)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut store = VariableStore::new();
        let a = store.declare(ShiftKey::new(0, 0, 0)).unwrap();
        let b = store.declare(ShiftKey::new(0, 0, 1)).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(ShiftKey::new(0, 0, 1)).unwrap(), b);
        assert_eq!(store.key(a), Some(ShiftKey::new(0, 0, 0)));
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut store = VariableStore::new();
        store.declare(ShiftKey::new(1, 2, 0)).unwrap();

        let err = store.declare(ShiftKey::new(1, 2, 0)).unwrap_err();
        assert_eq!(err, ModelError::DuplicateVariable(ShiftKey::new(1, 2, 0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_lookup() {
        let store = VariableStore::new();
        assert_eq!(
            store.lookup(ShiftKey::new(3, 0, 0)),
            Err(ModelError::UnknownVariable(ShiftKey::new(3, 0, 0)))
        );
    }

    #[test]
    fn test_key_ordering_is_lexical() {
        let mut keys = vec![
            ShiftKey::new(1, 0, 0),
            ShiftKey::new(0, 1, 0),
            ShiftKey::new(0, 0, 2),
        ];
        keys.sort();
        assert_eq!(keys[0], ShiftKey::new(0, 0, 2));
        assert_eq!(keys[2], ShiftKey::new(1, 0, 0));
    }

    #[test]
    fn test_try_from_rejects_duplicates() {
        let keys = vec![ShiftKey::new(0, 0, 0), ShiftKey::new(0, 0, 0)];
        assert!(VariableStore::try_from(keys).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ShiftKey::new(2, 13, 1).to_string(), "shift_n2d13s1");
    }
}
