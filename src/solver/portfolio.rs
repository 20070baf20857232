//! Parallel portfolio over branching orders.
//!
//! Worker 0 runs the configured order; every other worker branches in a
//! shuffled order seeded by its index. The first worker to prove its result
//! raises a shared stop flag so the others give up at their next node.

use super::config::{SolverConfig, VariableOrder};
use super::outcome::SolveOutcome;
use super::runner::run;
use crate::model::Model;
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub(crate) fn solve(model: &Model, config: &SolverConfig, cancel: Option<&AtomicBool>) -> SolveOutcome {
    let start = Instant::now();
    let stop = AtomicBool::new(false);

    let outcomes: Vec<SolveOutcome> = (0..config.num_workers)
        .into_par_iter()
        .map(|worker| {
            let mut worker_config = config.clone();
            worker_config.num_workers = 1;
            if worker > 0 {
                worker_config.variable_order = VariableOrder::Shuffled {
                    seed: worker as u64,
                };
            }

            let mut flags = vec![&stop];
            flags.extend(cancel);
            let outcome = run(model, &worker_config, flags);
            if outcome.is_proven() {
                stop.store(true, Ordering::Relaxed);
            }
            debug!("worker {worker}: {}", outcome.status);
            outcome
        })
        .collect();

    let mut winner = pick(model, outcomes);
    winner.stats.wall_time = start.elapsed();
    winner
}

/// A proven outcome if any worker has one, else the best objective found,
/// else worker 0's outcome.
fn pick(model: &Model, outcomes: Vec<SolveOutcome>) -> SolveOutcome {
    let mut best: Option<SolveOutcome> = None;
    for outcome in outcomes {
        best = match best {
            None => Some(outcome),
            Some(current) => Some(if better(model, &outcome, &current) {
                outcome
            } else {
                current
            }),
        };
    }
    best.unwrap_or_else(|| SolveOutcome::infeasible(Default::default()))
}

fn better(model: &Model, candidate: &SolveOutcome, current: &SolveOutcome) -> bool {
    if current.is_proven() {
        return false;
    }
    if candidate.is_proven() {
        return true;
    }
    match (candidate.objective_value, current.objective_value, model.objective()) {
        (Some(c), Some(b), Some(objective)) => objective.improves(c, b),
        _ => candidate.is_solution_found() && !current.is_solution_found(),
    }
}
