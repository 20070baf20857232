//! Solver configuration and branching policies.

use std::time::Duration;

/// Order in which free variables are picked for branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableOrder {
    /// First free variable in `(nurse, day, shift)` order.
    #[default]
    Lexical,
    /// First free variable in declaration order.
    Declaration,
    /// A fixed pseudo-random permutation drawn from `seed`.
    Shuffled { seed: u64 },
}

/// Which value a branching variable tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueOrder {
    /// Try 1 before 0.
    OneFirst,
    /// Try 0 before 1.
    ZeroFirst,
    /// Try the value that adds less to the (minimized) objective first;
    /// falls back to 1 first for variables without an objective weight.
    #[default]
    ObjectiveGuided,
}

/// Solver configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_roster::solver::{SolverConfig, ValueOrder, VariableOrder};
///
/// let config = SolverConfig::default()
///     .with_time_limit(Duration::from_secs(5))
///     .with_variable_order(VariableOrder::Declaration)
///     .with_value_order(ValueOrder::OneFirst);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget for one solve call. `None` = unlimited.
    pub time_limit: Option<Duration>,
    /// Maximum number of search nodes. `None` = unlimited.
    pub node_limit: Option<u64>,
    /// Number of portfolio workers (requires the `parallel` feature).
    pub num_workers: usize,
    /// Stop after the first feasible solution instead of proving optimality.
    pub stop_after_first: bool,
    /// Split the model into independent components before searching.
    pub decompose: bool,
    pub variable_order: VariableOrder,
    pub value_order: ValueOrder,
    /// Emit a `trace` progress line every `log_interval` nodes.
    pub log_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            num_workers: 1,
            stop_after_first: false,
            decompose: true,
            variable_order: VariableOrder::default(),
            value_order: ValueOrder::default(),
            log_interval: 100_000,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }

    pub fn with_decompose(mut self, decompose: bool) -> Self {
        self.decompose = decompose;
        self
    }

    pub fn with_variable_order(mut self, order: VariableOrder) -> Self {
        self.variable_order = order;
        self
    }

    pub fn with_value_order(mut self, order: ValueOrder) -> Self {
        self.value_order = order;
        self
    }

    pub fn with_log_interval(mut self, nodes: u64) -> Self {
        self.log_interval = nodes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        if self.node_limit == Some(0) {
            return Err("node_limit must be positive when set".into());
        }
        if self.log_interval == 0 {
            return Err("log_interval must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, None);
        assert_eq!(config.num_workers, 1);
        assert!(!config.stop_after_first);
        assert!(config.decompose);
        assert_eq!(config.variable_order, VariableOrder::Lexical);
        assert_eq!(config.value_order, ValueOrder::ObjectiveGuided);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_workers() {
        assert!(SolverConfig::default().with_num_workers(0).validate().is_err());
    }

    #[test]
    fn test_validate_node_limit() {
        assert!(SolverConfig::default().with_node_limit(0).validate().is_err());
        assert!(SolverConfig::default().with_node_limit(10).validate().is_ok());
    }

    #[test]
    fn test_validate_log_interval() {
        assert!(SolverConfig::default().with_log_interval(0).validate().is_err());
    }
}
