//! Depth-first branch-and-bound over one sub-problem.
//!
//! The search keeps an explicit stack of decision frames instead of
//! recursing. Every frame remembers the trail position before its
//! decision and the value still to be tried, so backtracking is a pop,
//! an undo and at most one new decision.

use super::component::SubProblem;
use super::config::ValueOrder;
use super::outcome::StopReason;
use super::propagator::Propagator;
use super::stats::SearchStats;
use super::trail::Trail;
use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Stop conditions shared by every sub-problem of one solve call.
pub(crate) struct SearchLimits<'a> {
    pub deadline: Option<Instant>,
    pub cancel: Vec<&'a AtomicBool>,
    pub node_limit: Option<u64>,
    pub stop_after_first: bool,
    pub log_interval: u64,
}

impl SearchLimits<'_> {
    /// Checked once per node expansion.
    fn check(&self, stats: &SearchStats) -> Option<StopReason> {
        if self.cancel.iter().any(|flag| flag.load(Ordering::Relaxed)) {
            return Some(StopReason::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(StopReason::Deadline);
        }
        if self.node_limit.is_some_and(|limit| stats.nodes >= limit) {
            return Some(StopReason::NodeLimit);
        }
        None
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// The tree was exhausted, or a satisfaction sub-problem found its
    /// solution: the incumbent (if any) is proven.
    Complete,
    Stopped(StopReason),
}

#[derive(Debug, Clone)]
pub(crate) struct SessionResult {
    /// Best local assignment and its minimization-form objective value.
    pub incumbent: Option<(Vec<bool>, i64)>,
    pub end: SessionEnd,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Position of `var` in the branching order.
    pos: usize,
    var: usize,
    mark: usize,
    alternative: Option<bool>,
}

pub(crate) struct Session<'a> {
    sub: &'a SubProblem,
    order: Vec<usize>,
    first_value: Vec<bool>,
    weights: Vec<i64>,
    trail: Trail,
    prop: Propagator,
    frames: Vec<Frame>,
    incumbent: Option<(Vec<bool>, i64)>,
    limits: &'a SearchLimits<'a>,
    stats: &'a mut SearchStats,
}

impl<'a> Session<'a> {
    /// Prepares a search over `sub`, branching on variables in `order`
    /// (a permutation of the local indices).
    pub fn new(
        sub: &'a SubProblem,
        order: Vec<usize>,
        value_order: ValueOrder,
        limits: &'a SearchLimits<'a>,
        stats: &'a mut SearchStats,
    ) -> Self {
        let n = sub.num_vars();
        debug_assert_eq!(order.len(), n);

        let mut weights = vec![0i64; n];
        for &(w, v) in &sub.objective {
            weights[v] += w;
        }
        let first_value = weights
            .iter()
            .map(|&w| match value_order {
                ValueOrder::OneFirst => true,
                ValueOrder::ZeroFirst => false,
                ValueOrder::ObjectiveGuided => w <= 0,
            })
            .collect();

        let objective = sub.has_objective.then_some(sub.objective.as_slice());
        Self {
            sub,
            order,
            first_value,
            weights,
            trail: Trail::new(n),
            prop: Propagator::new(n, sub.rows.clone(), objective),
            frames: Vec::new(),
            incumbent: None,
            limits,
            stats,
        }
    }

    pub fn run(mut self) -> SessionResult {
        self.prop.enqueue_all();
        if let Err(conflict) = self.prop.propagate(&mut self.trail) {
            self.stats.on_conflict(conflict.bound);
            return SessionResult {
                incumbent: None,
                end: SessionEnd::Complete,
            };
        }

        let end = loop {
            if let Some(reason) = self.limits.check(self.stats) {
                break SessionEnd::Stopped(reason);
            }
            self.stats.on_node();
            if self.stats.nodes % self.limits.log_interval == 0 {
                trace!(
                    "nodes={} depth={} conflicts={} bound={:?} best={:?}",
                    self.stats.nodes,
                    self.frames.len(),
                    self.stats.conflicts,
                    self.prop.objective_bound(&self.trail),
                    self.incumbent.as_ref().map(|(_, v)| *v),
                );
            }

            match self.select() {
                None => {
                    self.on_leaf();
                    if !self.sub.has_objective {
                        break SessionEnd::Complete;
                    }
                    if self.limits.stop_after_first {
                        break SessionEnd::Stopped(StopReason::FirstSolution);
                    }
                    if !self.backtrack() {
                        break SessionEnd::Complete;
                    }
                }
                Some((pos, var)) => {
                    let first = self.first_value[var];
                    self.frames.push(Frame {
                        pos,
                        var,
                        mark: self.trail.mark(),
                        alternative: Some(!first),
                    });
                    self.stats.on_branch(self.frames.len());
                    if !self.decide(var, first) && !self.backtrack() {
                        break SessionEnd::Complete;
                    }
                }
            }
        };

        SessionResult {
            incumbent: self.incumbent,
            end,
        }
    }

    /// First free variable in branching order.
    ///
    /// Every variable before the deepest frame's position is fixed, so the
    /// scan resumes there.
    fn select(&self) -> Option<(usize, usize)> {
        let start = self.frames.last().map_or(0, |f| f.pos);
        self.order[start..]
            .iter()
            .position(|&v| self.trail.is_free(v))
            .map(|i| (start + i, self.order[start + i]))
    }

    /// Fixes `var = value` and propagates. Returns `false` on conflict.
    fn decide(&mut self, var: usize, value: bool) -> bool {
        self.prop.assign(&mut self.trail, var, value);
        if self.incumbent.is_some() {
            self.prop.enqueue_cut();
        }
        match self.prop.propagate(&mut self.trail) {
            Ok(()) => true,
            Err(conflict) => {
                self.stats.on_conflict(conflict.bound);
                false
            }
        }
    }

    /// Undoes frames until an untried alternative propagates cleanly.
    /// Returns `false` once the tree is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.frames.pop() {
            self.trail.undo_to(frame.mark);
            if let Some(value) = frame.alternative {
                self.frames.push(Frame {
                    alternative: None,
                    ..frame
                });
                self.stats.on_branch(self.frames.len());
                if self.decide(frame.var, value) {
                    return true;
                }
            }
        }
        false
    }

    fn on_leaf(&mut self) {
        debug_assert!(self.trail.is_complete());
        self.stats.on_solution();

        let value: i64 = (0..self.sub.num_vars())
            .filter(|&v| self.trail.value(v) == Some(true))
            .map(|v| self.weights[v])
            .sum();

        let improves = self.incumbent.as_ref().map_or(true, |&(_, best)| value < best);
        if improves {
            debug!(
                "new incumbent {value} at node {} (depth {})",
                self.stats.nodes,
                self.frames.len()
            );
            self.incumbent = Some((self.trail.snapshot(), value));
            self.prop.tighten_cut(value);
        }
    }
}
