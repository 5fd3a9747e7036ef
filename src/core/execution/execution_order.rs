use crate::core::types::ModuleId;
use log::trace;
use std::collections::HashMap;

/// Builds evaluation ranks for the work-set from the combinational
/// dependency graph.
pub struct ExecutionOrderBuilder;

impl ExecutionOrderBuilder {
    /// Topologically sort modules into stages with a modified Kahn's algorithm.
    ///
    /// `module_ids` must be in insertion order; it breaks ties inside a stage
    /// and decides which module is forced first when the remaining graph is
    /// cyclic. Feedback loops are legal, so a cycle never fails the sort.
    pub fn build_stages(
        module_ids: &[ModuleId],
        edges: &[(ModuleId, ModuleId)],
    ) -> Vec<Vec<ModuleId>> {
        let position: HashMap<ModuleId, usize> = module_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let mut adj_list: HashMap<ModuleId, Vec<ModuleId>> = HashMap::new();
        let mut in_degree: HashMap<ModuleId, usize> =
            module_ids.iter().map(|id| (*id, 0)).collect();

        for (source, target) in edges {
            // Only consider edges between modules we're tracking
            if !in_degree.contains_key(source) || !in_degree.contains_key(target) {
                continue;
            }
            adj_list.entry(*source).or_default().push(*target);
            if let Some(degree) = in_degree.get_mut(target) {
                *degree += 1;
            }
        }

        let mut stages = Vec::new();
        while !in_degree.is_empty() {
            let mut current_stage: Vec<ModuleId> = in_degree
                .iter()
                .filter(|(_, &degree)| degree == 0)
                .map(|(id, _)| *id)
                .collect();

            if current_stage.is_empty() {
                // Every remaining module sits on or behind a loop: release the oldest one.
                if let Some(forced) = in_degree.keys().min_by_key(|id| position[*id]).copied() {
                    trace!("Breaking feedback loop at {}", forced);
                    current_stage.push(forced);
                }
            }

            // Sort stage for deterministic results
            current_stage.sort_by_key(|id| position[id]);

            for id in &current_stage {
                in_degree.remove(id);
                if let Some(neighbors) = adj_list.get(id) {
                    for neighbor in neighbors {
                        if let Some(degree) = in_degree.get_mut(neighbor) {
                            *degree = degree.saturating_sub(1);
                        }
                    }
                }
            }

            stages.push(current_stage);
        }

        stages
    }

    /// Flatten the stages into a rank per module
    pub fn build_ranks(
        module_ids: &[ModuleId],
        edges: &[(ModuleId, ModuleId)],
    ) -> HashMap<ModuleId, usize> {
        Self::build_stages(module_ids, edges)
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(rank, id)| (id, rank))
            .collect()
    }
}

/// Cached ranks, dropped whenever the topology changes
#[derive(Debug, Default)]
pub struct ExecutionOrder {
    ranks: Option<HashMap<ModuleId, usize>>,
}

impl ExecutionOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.ranks = None;
    }

    pub fn is_valid(&self) -> bool {
        self.ranks.is_some()
    }

    pub fn store(&mut self, ranks: HashMap<ModuleId, usize>) {
        self.ranks = Some(ranks);
    }

    /// Rank of a module; unknown modules sort last
    pub fn rank(&self, id: &ModuleId) -> usize {
        self.ranks
            .as_ref()
            .and_then(|ranks| ranks.get(id).copied())
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ModuleId> {
        (0..n).map(|_| ModuleId::new()).collect()
    }

    #[test]
    fn test_build_stages_simple_chain() {
        // A -> B -> C, inserted in reverse
        let m = ids(3);
        let order = vec![m[2], m[1], m[0]];
        let edges = vec![(m[0], m[1]), (m[1], m[2])];

        let stages = ExecutionOrderBuilder::build_stages(&order, &edges);
        assert_eq!(stages, vec![vec![m[0]], vec![m[1]], vec![m[2]]]);
    }

    #[test]
    fn test_build_stages_parallel() {
        // A -> B, A -> C, B -> D, C -> D
        let m = ids(4);
        let edges = vec![(m[0], m[1]), (m[0], m[2]), (m[1], m[3]), (m[2], m[3])];

        let stages = ExecutionOrderBuilder::build_stages(&m, &edges);
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1], vec![m[1], m[2]]);
        assert_eq!(stages[2], vec![m[3]]);
    }

    #[test]
    fn test_cycle_is_broken_not_rejected() {
        // A -> B -> A, plus C downstream of B
        let m = ids(3);
        let edges = vec![(m[0], m[1]), (m[1], m[0]), (m[1], m[2])];

        let ranks = ExecutionOrderBuilder::build_ranks(&m, &edges);
        assert_eq!(ranks.len(), 3);
        assert!(ranks[&m[0]] < ranks[&m[1]]);
        assert!(ranks[&m[1]] < ranks[&m[2]]);
    }

    #[test]
    fn test_edges_to_unknown_modules_are_ignored() {
        let m = ids(2);
        let stray = ModuleId::new();
        let edges = vec![(stray, m[1]), (m[0], m[1])];

        let ranks = ExecutionOrderBuilder::build_ranks(&m, &edges);
        assert_eq!(ranks[&m[0]], 0);
        assert_eq!(ranks[&m[1]], 1);
    }

    #[test]
    fn test_cache_invalidation() {
        let m = ids(1);
        let mut cache = ExecutionOrder::new();
        assert_eq!(cache.rank(&m[0]), usize::MAX);
        cache.store(ExecutionOrderBuilder::build_ranks(&m, &[]));
        assert!(cache.is_valid());
        assert_eq!(cache.rank(&m[0]), 0);
        cache.invalidate();
        assert!(!cache.is_valid());
    }
}
