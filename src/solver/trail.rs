//! Variable values with an undo log for backtracking.

/// Current partial assignment of a sub-problem plus the order in which
/// variables were fixed.
///
/// Backtracking restores an earlier state in O(k) for k undone fixes:
/// take a [`mark`](Self::mark) before a decision and
/// [`undo_to`](Self::undo_to) it when the decision is abandoned.
#[derive(Debug, Clone)]
pub(crate) struct Trail {
    values: Vec<Option<bool>>,
    fixed: Vec<usize>,
}

impl Trail {
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![None; num_vars],
            fixed: Vec::with_capacity(num_vars),
        }
    }

    #[inline]
    pub fn value(&self, var: usize) -> Option<bool> {
        self.values[var]
    }

    #[inline]
    pub fn is_free(&self, var: usize) -> bool {
        self.values[var].is_none()
    }

    /// Fixes a free variable.
    #[inline]
    pub fn assign(&mut self, var: usize, value: bool) {
        debug_assert!(self.values[var].is_none(), "variable {var} assigned twice");
        self.values[var] = Some(value);
        self.fixed.push(var);
    }

    #[inline]
    pub fn mark(&self) -> usize {
        self.fixed.len()
    }

    /// Frees every variable fixed after `mark`.
    pub fn undo_to(&mut self, mark: usize) {
        while self.fixed.len() > mark {
            if let Some(var) = self.fixed.pop() {
                self.values[var] = None;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fixed.len() == self.values.len()
    }

    /// Snapshot of a complete assignment.
    pub fn snapshot(&self) -> Vec<bool> {
        self.values.iter().map(|v| v.unwrap_or(false)).collect()
    }
}
