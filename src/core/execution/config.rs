//! Configuration for propagation behaviour
//!
//! This module provides configuration types for controlling how a circuit is
//! settled after each stimulus: the order the work-set is drained in and the
//! iteration bounds that turn a non-settling feedback loop into an error flag.

/// Default number of times one module may be evaluated within a single step
pub const DEFAULT_EVALUATION_BOUND: usize = 64;

/// Order in which pending modules are taken from the work-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrder {
    /// Lowest topological rank first; each module runs at most once per step
    /// in an acyclic circuit
    Ranked,
    /// Uniformly random pops from a seeded generator. Final values of settling
    /// circuits must not depend on the seed.
    Shuffled(u64),
}

impl Default for WorkOrder {
    fn default() -> Self {
        WorkOrder::Ranked
    }
}

/// Configuration for circuit propagation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// The order the work-set is drained in
    pub work_order: WorkOrder,
    /// How many times one module may be evaluated in one step before it is
    /// flagged as oscillating
    pub max_evaluations_per_module: usize,
    /// Optional cap on all evaluations in one step
    pub max_total_evaluations: Option<usize>,
}

impl SimulationConfig {
    /// Create a new configuration with default values
    ///
    /// Default configuration uses ranked order, the default per-module bound,
    /// and no total cap
    pub fn new() -> Self {
        Self {
            work_order: WorkOrder::default(),
            max_evaluations_per_module: DEFAULT_EVALUATION_BOUND,
            max_total_evaluations: None,
        }
    }

    /// Set the work-set order
    pub fn with_work_order(mut self, order: WorkOrder) -> Self {
        self.work_order = order;
        self
    }

    /// Set the per-module evaluation bound
    ///
    /// # Note
    /// A bound of zero would flag every module, so it is raised to one
    pub fn with_evaluation_bound(mut self, bound: usize) -> Self {
        self.max_evaluations_per_module = bound.max(1);
        self
    }

    /// Cap the total number of evaluations in one step
    pub fn with_total_bound(mut self, bound: usize) -> Self {
        self.max_total_evaluations = Some(bound);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.work_order, WorkOrder::Ranked);
        assert_eq!(config.max_evaluations_per_module, DEFAULT_EVALUATION_BOUND);
        assert_eq!(config.max_total_evaluations, None);
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_work_order(WorkOrder::Shuffled(7))
            .with_evaluation_bound(8)
            .with_total_bound(100);

        assert_eq!(config.work_order, WorkOrder::Shuffled(7));
        assert_eq!(config.max_evaluations_per_module, 8);
        assert_eq!(config.max_total_evaluations, Some(100));
    }

    #[test]
    fn test_zero_bound_is_raised() {
        let config = SimulationConfig::new().with_evaluation_bound(0);
        assert_eq!(config.max_evaluations_per_module, 1);
    }
}
