//! Search statistics.

use std::fmt;
use std::time::Duration;

/// Counters accumulated during one solve call.
///
/// Every counter only grows while a solve runs; each call starts from
/// [`SearchStats::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Search nodes expanded.
    pub nodes: u64,
    /// Branching decisions taken (both children count).
    pub branches: u64,
    /// Propagation failures, including objective-bound failures.
    pub conflicts: u64,
    /// Nodes cut off because their objective bound cannot beat the incumbent.
    pub bound_prunings: u64,
    /// Complete solutions found, improving or not.
    pub solutions: u64,
    /// Deepest decision level reached.
    pub max_depth: u64,
    /// Independent components the model was split into.
    pub components: u64,
    pub wall_time: Duration,
}

impl SearchStats {
    #[inline]
    pub(crate) fn on_node(&mut self) {
        self.nodes = self.nodes.saturating_add(1);
    }

    #[inline]
    pub(crate) fn on_branch(&mut self, depth: usize) {
        self.branches = self.branches.saturating_add(1);
        self.max_depth = self.max_depth.max(depth as u64);
    }

    #[inline]
    pub(crate) fn on_conflict(&mut self, bound: bool) {
        self.conflicts = self.conflicts.saturating_add(1);
        if bound {
            self.bound_prunings = self.bound_prunings.saturating_add(1);
        }
    }

    #[inline]
    pub(crate) fn on_solution(&mut self) {
        self.solutions = self.solutions.saturating_add(1);
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics")?;
        writeln!(f, "  - conflicts: {}", self.conflicts)?;
        writeln!(f, "  - branches : {}", self.branches)?;
        writeln!(f, "  - nodes    : {}", self.nodes)?;
        writeln!(f, "  - pruned   : {}", self.bound_prunings)?;
        writeln!(f, "  - solutions: {}", self.solutions)?;
        write!(f, "  - wall time: {:.6} s", self.wall_time.as_secs_f64())
    }
}
