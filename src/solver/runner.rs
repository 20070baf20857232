//! Solve entry points.
//!
//! [`BranchAndBound`] lowers a [`Model`], splits it into independent
//! components and runs one depth-first [`Session`] per component, then
//! stitches the component results back into a single [`SolveOutcome`].

use super::compile::compile;
use super::component::{split, SubProblem};
use super::config::{SolverConfig, VariableOrder};
use super::outcome::{SolveError, SolveOutcome, SolveStatus, StopReason};
use super::search::{SearchLimits, Session, SessionEnd};
use super::stats::SearchStats;
use crate::model::{Assignment, Model, ShiftKey};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A solver for finalized shift-assignment models.
pub trait Solver {
    /// Solves `model` under `config`. Never panics on solver faults; they
    /// are reported as [`SolveStatus::Error`].
    fn solve(&self, model: &Model, config: &SolverConfig) -> SolveOutcome;
}

/// Exact branch-and-bound with bound propagation.
///
/// # Examples
///
/// ```
/// use u_roster::model::{Comparison, ModelBuilder, Sense};
/// use u_roster::solver::{BranchAndBound, SolveStatus, Solver, SolverConfig};
///
/// let mut builder = ModelBuilder::new("pair");
/// let a = builder.declare_variable(0, 0, 0).unwrap();
/// let b = builder.declare_variable(1, 0, 0).unwrap();
/// builder.add_constraint([(1, a), (1, b)], Comparison::Eq, 1).unwrap();
/// builder.set_objective([(200, a), (240, b)], Sense::Minimize).unwrap();
/// let model = builder.finalize().unwrap();
///
/// let outcome = BranchAndBound::new().solve(&model, &SolverConfig::default());
/// assert_eq!(outcome.status, SolveStatus::Optimal);
/// assert_eq!(outcome.objective_value, Some(200));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

impl BranchAndBound {
    pub fn new() -> Self {
        Self
    }

    /// Solves with an optional cancellation token.
    ///
    /// Once the flag is raised the search stops at the next node expansion
    /// and returns [`SolveStatus::Cancelled`] with the best complete
    /// assignment found so far, if any.
    pub fn solve_with_cancel(
        &self,
        model: &Model,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SolveOutcome {
        if config.num_workers > 1 {
            #[cfg(feature = "parallel")]
            {
                return super::portfolio::solve(model, config, cancel.as_deref());
            }
            #[cfg(not(feature = "parallel"))]
            log::warn!(
                "num_workers = {} ignored: built without the `parallel` feature",
                config.num_workers
            );
        }
        run(model, config, cancel.as_deref().into_iter().collect())
    }
}

impl Solver for BranchAndBound {
    fn solve(&self, model: &Model, config: &SolverConfig) -> SolveOutcome {
        self.solve_with_cancel(model, config, None)
    }
}

/// Solves `model` with default settings and an optional wall-clock budget.
pub fn solve(model: &Model, deadline: Option<Duration>) -> SolveOutcome {
    let config = SolverConfig {
        time_limit: deadline,
        ..SolverConfig::default()
    };
    BranchAndBound::new().solve(model, &config)
}

/// Single-threaded solve; every flag in `cancel` stops the search.
pub(crate) fn run(model: &Model, config: &SolverConfig, cancel: Vec<&AtomicBool>) -> SolveOutcome {
    let start = Instant::now();
    let mut outcome = run_inner(model, config, cancel, start);
    outcome.stats.wall_time = start.elapsed();
    info!(
        "'{}' finished {} after {} nodes, {} conflicts ({:.3}s)",
        model.name(),
        outcome.status,
        outcome.stats.nodes,
        outcome.stats.conflicts,
        outcome.stats.wall_time.as_secs_f64()
    );
    outcome
}

fn run_inner(
    model: &Model,
    config: &SolverConfig,
    cancel: Vec<&AtomicBool>,
    start: Instant,
) -> SolveOutcome {
    let mut stats = SearchStats::default();
    if let Err(msg) = config.validate() {
        return SolveOutcome::error(SolveError::InvalidConfig(msg), stats);
    }

    info!(
        "solving '{}': {} variables, {} constraints",
        model.name(),
        model.variable_count(),
        model.constraint_count()
    );

    let compiled = match compile(model) {
        Ok(compiled) => compiled,
        Err(err) => return SolveOutcome::error(err, stats),
    };
    if compiled.trivially_infeasible {
        debug!("a constraint without variables can never hold");
        return SolveOutcome::infeasible(stats);
    }

    let subs = split(&compiled, config.decompose);
    stats.components = subs.len() as u64;
    debug!("{} independent component(s)", subs.len());

    let limits = SearchLimits {
        deadline: config.time_limit.and_then(|t| start.checked_add(t)),
        cancel,
        node_limit: config.node_limit,
        stop_after_first: config.stop_after_first,
        log_interval: config.log_interval,
    };
    let keys: Vec<ShiftKey> = model.variables().iter().map(|(_, key)| key).collect();

    let mut values = vec![false; compiled.num_vars];
    let mut solved = 0usize;
    let mut first_only = false;
    let mut stopped = None;

    for (ci, sub) in subs.iter().enumerate() {
        let order = branching_order(sub, &keys, config.variable_order, ci);
        let result = Session::new(sub, order, config.value_order, &limits, &mut stats).run();

        if let Some((local, value)) = &result.incumbent {
            debug!(
                "component {ci} ({} variables): objective {value}",
                sub.num_vars()
            );
            for (&global, &v) in sub.vars.iter().zip(local) {
                values[global] = v;
            }
            solved += 1;
        }

        match result.end {
            SessionEnd::Complete if result.incumbent.is_none() => {
                debug!("component {ci} is infeasible");
                return SolveOutcome::infeasible(stats);
            }
            SessionEnd::Complete => {}
            SessionEnd::Stopped(StopReason::FirstSolution) => first_only = true,
            SessionEnd::Stopped(reason) => {
                stopped = Some(reason);
                break;
            }
        }
    }

    let assignment = (solved == subs.len()).then(|| Assignment::new(values));
    if let Some(a) = &assignment {
        debug_assert!(model.is_feasible(a));
    }
    let objective_value = assignment.as_ref().and_then(|a| model.objective_value(a));

    let (status, stop_reason) = match stopped {
        Some(reason) => (SolveStatus::Cancelled, Some(reason)),
        None if first_only => (SolveStatus::Feasible, Some(StopReason::FirstSolution)),
        None => (SolveStatus::Optimal, None),
    };

    SolveOutcome {
        status,
        assignment,
        objective_value,
        stats,
        stop_reason,
        message: None,
    }
}

/// Branching order of a component's local variables.
fn branching_order(
    sub: &SubProblem,
    keys: &[ShiftKey],
    order: VariableOrder,
    component: usize,
) -> Vec<usize> {
    // local indices already follow declaration order
    let mut locals: Vec<usize> = (0..sub.num_vars()).collect();
    match order {
        VariableOrder::Declaration => {}
        VariableOrder::Lexical => locals.sort_by_key(|&l| keys[sub.vars[l]]),
        VariableOrder::Shuffled { seed } => {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(component as u64));
            locals.shuffle(&mut rng);
        }
    }
    locals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comparison, ModelBuilder, Sense, VarId};
    use crate::solver::config::ValueOrder;
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;

    /// `n` nurses on one day and one shift.
    fn single_slot(n: usize) -> (ModelBuilder, Vec<VarId>) {
        let mut b = ModelBuilder::new("slot");
        let vars = (0..n).map(|i| b.declare_variable(i, 0, 0).unwrap()).collect();
        (b, vars)
    }

    /// `k` independent "exactly one of three" groups with distinct costs.
    fn groups(k: usize) -> Model {
        let mut b = ModelBuilder::new("groups");
        let mut objective = Vec::new();
        for d in 0..k {
            let vars: Vec<VarId> = (0..3).map(|n| b.declare_variable(n, d, 0).unwrap()).collect();
            b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Eq, 1)
                .unwrap();
            objective.extend(vars.iter().zip([30, 10, 20]).map(|(&v, w)| (w, v)));
        }
        b.set_objective(objective, Sense::Minimize).unwrap();
        b.finalize().unwrap()
    }

    #[test_log::test]
    fn test_single_nurse_single_shift() {
        let (mut b, vars) = single_slot(1);
        b.add_constraint([(1, vars[0])], Comparison::Eq, 1).unwrap();
        b.set_objective([(200, vars[0])], Sense::Minimize).unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective_value, Some(200));
        assert_eq!(outcome.assignment.unwrap().value(vars[0]), 1);
    }

    #[test]
    fn test_coverage_exceeds_available_nurses() {
        let (mut b, vars) = single_slot(1);
        b.add_constraint([(1, vars[0])], Comparison::Eq, 2).unwrap();
        b.set_objective([(200, vars[0])], Sense::Minimize).unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.assignment.is_none());
        assert!(outcome.objective_value.is_none());
    }

    #[test]
    fn test_no_constraints_minimizes_by_domain() {
        let (mut b, vars) = single_slot(4);
        b.set_objective(vars.iter().zip([5, -3, 0, -7]).map(|(&v, w)| (w, v)), Sense::Minimize)
            .unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective_value, Some(-10));
        let a = outcome.assignment.unwrap();
        assert_eq!(a.value(vars[0]), 0);
        assert_eq!(a.value(vars[1]), 1);
        assert_eq!(a.value(vars[3]), 1);
        // four singleton components, one node each
        assert_eq!(outcome.stats.components, 4);
        assert!(outcome.stats.nodes <= 8);
    }

    #[test]
    fn test_maximize() {
        let (mut b, vars) = single_slot(3);
        b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Le, 2)
            .unwrap();
        b.set_objective([(4, vars[0]), (9, vars[1]), (6, vars[2])], Sense::Maximize)
            .unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective_value, Some(15));
    }

    #[test]
    fn test_satisfaction_model_reports_optimal() {
        let (mut b, vars) = single_slot(3);
        b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Eq, 2)
            .unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective_value, None);
        assert!(model.is_feasible(&outcome.assignment.unwrap()));
    }

    #[test]
    fn test_empty_model() {
        let model = ModelBuilder::new("empty").finalize().unwrap();
        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.assignment.map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_components_are_summed() {
        let model = groups(5);
        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective_value, Some(50));
        assert_eq!(outcome.stats.components, 5);

        let whole = BranchAndBound::new().solve(&model, &SolverConfig::default().with_decompose(false));
        assert_eq!(whole.status, SolveStatus::Optimal);
        assert_eq!(whole.objective_value, Some(50));
        assert_eq!(whole.stats.components, 1);
    }

    #[test]
    fn test_idempotent() {
        let model = groups(3);
        let first = solve(&model, None);
        let second = solve(&model, None);
        assert_eq!(first.status, second.status);
        assert_eq!(first.objective_value, second.objective_value);
        assert_eq!(first.assignment, second.assignment);
    }

    #[test]
    fn test_tighter_constraint_never_improves() {
        let build = |extra: bool| {
            let (mut b, vars) = single_slot(4);
            b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Ge, 2)
                .unwrap();
            if extra {
                // the two cheapest nurses may not work together
                b.add_constraint([(1, vars[0]), (1, vars[1])], Comparison::Le, 1)
                    .unwrap();
            }
            b.set_objective(vars.iter().zip([10, 11, 30, 45]).map(|(&v, w)| (w, v)), Sense::Minimize)
                .unwrap();
            b.finalize().unwrap()
        };

        let loose = solve(&build(false), None);
        let tight = solve(&build(true), None);
        assert_eq!(loose.objective_value, Some(21));
        assert_eq!(tight.objective_value, Some(40));
    }

    #[test]
    fn test_variable_and_value_orders_agree() {
        let model = groups(4);
        let orders = [
            VariableOrder::Lexical,
            VariableOrder::Declaration,
            VariableOrder::Shuffled { seed: 7 },
        ];
        let values = [ValueOrder::OneFirst, ValueOrder::ZeroFirst, ValueOrder::ObjectiveGuided];
        for &var_order in &orders {
            for &value_order in &values {
                let config = SolverConfig::default()
                    .with_variable_order(var_order)
                    .with_value_order(value_order);
                let outcome = BranchAndBound::new().solve(&model, &config);
                assert_eq!(outcome.status, SolveStatus::Optimal);
                assert_eq!(outcome.objective_value, Some(40));
            }
        }
    }

    #[test]
    fn test_overflow_reports_error() {
        let (mut b, vars) = single_slot(2);
        b.add_constraint([(i64::MAX, vars[0]), (i64::MAX, vars[1])], Comparison::Le, 1)
            .unwrap();
        let model = b.finalize().unwrap();

        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Error);
        assert!(outcome.assignment.is_none());
        assert!(outcome.message.unwrap().contains("overflow"));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let model = groups(1);
        let config = SolverConfig::default().with_log_interval(0);
        let outcome = BranchAndBound::new().solve(&model, &config);
        assert_eq!(outcome.status, SolveStatus::Error);
        assert!(outcome.message.unwrap().starts_with("invalid solver configuration"));
    }

    #[test]
    fn test_zero_deadline_cancels() {
        let model = groups(50);
        let outcome = solve(&model, Some(Duration::ZERO));
        assert_eq!(outcome.status, SolveStatus::Cancelled);
        assert_eq!(outcome.stop_reason, Some(StopReason::Deadline));
        assert!(outcome.assignment.is_none());
        assert_eq!(outcome.stats.nodes, 0);
    }

    #[test]
    fn test_cancel_flag() {
        let model = groups(3);
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Relaxed);

        let outcome =
            BranchAndBound::new().solve_with_cancel(&model, &SolverConfig::default(), Some(cancel));
        assert_eq!(outcome.status, SolveStatus::Cancelled);
        assert_eq!(outcome.stop_reason, Some(StopReason::Cancelled));
    }

    #[test]
    fn test_node_limit() {
        let (mut b, vars) = single_slot(12);
        b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Le, 6)
            .unwrap();
        b.set_objective(vars.iter().map(|&v| (-1, v)), Sense::Minimize)
            .unwrap();
        let model = b.finalize().unwrap();

        let config = SolverConfig::default()
            .with_node_limit(5)
            .with_value_order(ValueOrder::ZeroFirst);
        let outcome = BranchAndBound::new().solve(&model, &config);
        assert_eq!(outcome.status, SolveStatus::Cancelled);
        assert_eq!(outcome.stop_reason, Some(StopReason::NodeLimit));
        assert_eq!(outcome.stats.nodes, 5);
    }

    fn init_logging() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    /// 12 nurses, at most 6 on duty, staff as many as possible.
    fn capped_staffing() -> Model {
        let (mut b, vars) = single_slot(12);
        b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Le, 6)
            .unwrap();
        b.set_objective(vars.iter().map(|&v| (-1, v)), Sense::Minimize)
            .unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn test_node_limit_keeps_incumbent() {
        init_logging();
        let model = capped_staffing();
        // 12 zero decisions, then the all-zero leaf and one improving leaf
        let config = SolverConfig::default()
            .with_node_limit(14)
            .with_value_order(ValueOrder::ZeroFirst);
        let outcome = BranchAndBound::new().solve(&model, &config);

        assert_eq!(outcome.status, SolveStatus::Cancelled);
        assert_eq!(outcome.stop_reason, Some(StopReason::NodeLimit));
        assert_eq!(outcome.stats.components, 1);
        assert!(outcome.stats.solutions >= 1);
        let a = outcome.assignment.as_ref().unwrap();
        assert!(model.is_feasible(a));
        assert_eq!(outcome.objective_value, model.objective_value(a));
        assert!(outcome.objective_value.unwrap() > -6);
    }

    #[test]
    fn test_cancelling_coefficients_stay_exact() {
        init_logging();
        let (mut b, vars) = single_slot(1);
        let x = vars[0];
        b.add_constraint([(i64::MAX, x), (i64::MAX, x), (-i64::MAX, x)], Comparison::Le, 0)
            .unwrap();
        b.set_objective([(-1, x)], Sense::Minimize).unwrap();
        let model = b.finalize().unwrap();

        // MAX * x <= 0 is kept as written and is too large to bound
        let outcome = solve(&model, None);
        assert_eq!(outcome.status, SolveStatus::Error);
        assert!(outcome.assignment.is_none());
    }

    #[test]
    fn test_overflowing_objective_rejected_at_build() {
        let (mut b, vars) = single_slot(1);
        let err = b
            .set_objective([(i64::MIN, vars[0]), (-1, vars[0])], Sense::Minimize)
            .unwrap_err();
        assert_eq!(err, crate::model::ModelError::CoefficientOverflow(vars[0]));
        assert!(b.finalize().unwrap().objective().is_none());
    }

    #[test]
    fn test_stop_after_first() {
        let (mut b, vars) = single_slot(3);
        b.add_constraint(vars.iter().map(|&v| (1, v)), Comparison::Eq, 1)
            .unwrap();
        b.set_objective([(5, vars[0]), (1, vars[1]), (3, vars[2])], Sense::Minimize)
            .unwrap();
        let model = b.finalize().unwrap();

        let config = SolverConfig::default()
            .with_stop_after_first(true)
            .with_value_order(ValueOrder::OneFirst);
        let outcome = BranchAndBound::new().solve(&model, &config);
        assert_eq!(outcome.status, SolveStatus::Feasible);
        assert_eq!(outcome.stop_reason, Some(StopReason::FirstSolution));
        assert_eq!(outcome.objective_value, Some(5));
        assert_eq!(outcome.stats.solutions, 1);
    }

    #[test]
    fn test_statistics_reset_per_call() {
        let model = groups(2);
        let a = solve(&model, None);
        let b = solve(&model, None);
        assert_eq!(a.stats.nodes, b.stats.nodes);
        assert_eq!(a.stats.branches, b.stats.branches);
        assert_eq!(a.stats.conflicts, b.stats.conflicts);
    }

    #[derive(Debug, Clone)]
    struct RandomModel {
        num_vars: usize,
        constraints: Vec<(Vec<(i64, usize)>, Comparison, i64)>,
        objective: Vec<(i64, usize)>,
        sense: Sense,
    }

    fn comparison() -> impl Strategy<Value = Comparison> {
        prop_oneof![Just(Comparison::Eq), Just(Comparison::Le), Just(Comparison::Ge)]
    }

    fn random_model() -> impl Strategy<Value = RandomModel> {
        (1usize..=8).prop_flat_map(|n| {
            let term = (-3i64..=3, 0..n);
            let constraint = (prop::collection::vec(term.clone(), 1..=4), comparison(), -3i64..=4);
            (
                Just(n),
                prop::collection::vec(constraint, 0..=5),
                prop::collection::vec((-9i64..=9, 0..n), 0..=n),
                prop_oneof![Just(Sense::Minimize), Just(Sense::Maximize)],
            )
                .prop_map(|(num_vars, constraints, objective, sense)| RandomModel {
                    num_vars,
                    constraints,
                    objective,
                    sense,
                })
        })
    }

    fn build(shape: &RandomModel) -> Model {
        let mut b = ModelBuilder::new("random");
        let vars: Vec<VarId> = (0..shape.num_vars)
            .map(|i| b.declare_variable(i, 0, 0).unwrap())
            .collect();
        for (terms, op, rhs) in &shape.constraints {
            b.add_constraint(terms.iter().map(|&(c, v)| (c, vars[v])), *op, *rhs)
                .unwrap();
        }
        if !shape.objective.is_empty() {
            b.set_objective(shape.objective.iter().map(|&(w, v)| (w, vars[v])), shape.sense)
                .unwrap();
        }
        b.finalize().unwrap()
    }

    /// Best objective over all feasible assignments (`Some(None)` when the
    /// model is feasible and has no objective).
    fn brute_force(model: &Model) -> Option<Option<i64>> {
        let n = model.variable_count();
        let mut best: Option<Option<i64>> = None;
        for mask in 0u32..(1 << n) {
            let a = Assignment::new((0..n).map(|i| mask & (1 << i) != 0).collect());
            if !model.is_feasible(&a) {
                continue;
            }
            let value = model.objective_value(&a);
            best = match (best, value, model.objective()) {
                (Some(Some(b)), Some(v), Some(o)) if !o.improves(v, b) => Some(Some(b)),
                _ => Some(value),
            };
        }
        best
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_matches_exhaustive_search(shape in random_model(), decompose in any::<bool>()) {
            let model = build(&shape);
            let config = SolverConfig::default().with_decompose(decompose);
            let outcome = BranchAndBound::new().solve(&model, &config);

            match brute_force(&model) {
                None => {
                    prop_assert_eq!(outcome.status, SolveStatus::Infeasible);
                    prop_assert!(outcome.assignment.is_none());
                }
                Some(best) => {
                    prop_assert_eq!(outcome.status, SolveStatus::Optimal);
                    let a = outcome.assignment.unwrap();
                    prop_assert!(model.is_feasible(&a));
                    prop_assert_eq!(outcome.objective_value, best);
                }
            }
        }
    }
}
