//! Bound propagation over `<=` rows.
//!
//! For a row `Σ c_i x_i <= rhs` the smallest reachable activity is the sum
//! of the fixed contributions plus every negative coefficient of a free
//! variable. If it already exceeds `rhs` the node is infeasible; otherwise
//! any free variable whose coefficient magnitude exceeds the remaining slack
//! can only take the value that keeps the activity low.

use super::compile::Row;
use super::trail::Trail;
use std::collections::VecDeque;

/// A propagation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict {
    /// The failing row is the objective cut, i.e. the node cannot beat the incumbent.
    pub bound: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Propagator {
    rows: Vec<Row>,
    /// Rows mentioning each variable.
    watches: Vec<Vec<usize>>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    /// Index of the objective cut row `Σ w_i x_i <= best - 1`.
    cut: Option<usize>,
    forced: Vec<(usize, bool)>,
}

impl Propagator {
    /// Builds the propagator; with an objective, a cut row is appended with
    /// an inactive bound until [`tighten_cut`](Self::tighten_cut) is called.
    pub fn new(num_vars: usize, mut rows: Vec<Row>, objective: Option<&[(i64, usize)]>) -> Self {
        let cut = objective.map(|terms| {
            rows.push(Row {
                terms: terms.to_vec(),
                rhs: i64::MAX,
            });
            rows.len() - 1
        });

        let mut watches = vec![Vec::new(); num_vars];
        for (r, row) in rows.iter().enumerate() {
            for &(_, v) in &row.terms {
                watches[v].push(r);
            }
        }

        let queued = vec![false; rows.len()];
        Self {
            rows,
            watches,
            queue: VecDeque::new(),
            queued,
            cut,
            forced: Vec::new(),
        }
    }

    pub fn enqueue_all(&mut self) {
        for r in 0..self.rows.len() {
            self.enqueue(r);
        }
    }

    /// Re-checks the objective cut on the next propagation.
    pub fn enqueue_cut(&mut self) {
        if let Some(cut) = self.cut {
            self.enqueue(cut);
        }
    }

    /// Requires every further solution to have objective value `< best`.
    pub fn tighten_cut(&mut self, best: i64) {
        if let Some(cut) = self.cut {
            self.rows[cut].rhs = best - 1;
        }
    }

    /// Fixes `var` and schedules the rows that watch it.
    pub fn assign(&mut self, trail: &mut Trail, var: usize, value: bool) {
        trail.assign(var, value);
        for i in 0..self.watches[var].len() {
            let r = self.watches[var][i];
            self.enqueue(r);
        }
    }

    /// Runs queued rows to a fixpoint.
    ///
    /// On conflict the queue is cleared; the caller undoes the trail.
    pub fn propagate(&mut self, trail: &mut Trail) -> Result<(), Conflict> {
        while let Some(r) = self.queue.pop_front() {
            self.queued[r] = false;
            if let Err(conflict) = self.propagate_row(r, trail) {
                self.clear_queue();
                return Err(conflict);
            }
        }
        Ok(())
    }

    fn propagate_row(&mut self, r: usize, trail: &mut Trail) -> Result<(), Conflict> {
        let row = &self.rows[r];
        let min_activity = min_activity(row, trail);
        if min_activity > row.rhs {
            return Err(Conflict {
                bound: Some(r) == self.cut,
            });
        }

        let slack = row.rhs.saturating_sub(min_activity);
        let mut forced = std::mem::take(&mut self.forced);
        forced.extend(
            row.terms
                .iter()
                .filter(|&&(c, v)| trail.is_free(v) && c.abs() > slack)
                .map(|&(c, v)| (v, c < 0)),
        );
        for &(v, value) in &forced {
            self.assign(trail, v, value);
        }
        forced.clear();
        self.forced = forced;
        Ok(())
    }

    fn enqueue(&mut self, r: usize) {
        if !self.queued[r] {
            self.queued[r] = true;
            self.queue.push_back(r);
        }
    }

    fn clear_queue(&mut self) {
        for r in self.queue.drain(..) {
            self.queued[r] = false;
        }
    }

    /// Lower bound of the minimization objective under the current trail.
    pub fn objective_bound(&self, trail: &Trail) -> Option<i64> {
        self.cut.map(|cut| min_activity(&self.rows[cut], trail))
    }
}

fn min_activity(row: &Row, trail: &Trail) -> i64 {
    row.terms
        .iter()
        .map(|&(c, v)| match trail.value(v) {
            Some(true) => c,
            Some(false) => 0,
            None => c.min(0),
        })
        .sum()
}
