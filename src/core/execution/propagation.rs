use crate::core::circuit::Circuit;
use crate::core::components::traits::Module;
use crate::core::errors::{SimError, SimResult};
use crate::core::execution::config::WorkOrder;
use crate::core::types::{ModuleId, PortRef};
use crate::core::values::Value;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Which inputs of a pending module changed since it was queued
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Dirty {
    everything: bool,
    inputs: Vec<usize>,
}

impl Dirty {
    /// Treat every output as possibly affected
    pub(crate) fn all() -> Self {
        Self {
            everything: true,
            inputs: Vec::new(),
        }
    }

    pub(crate) fn input(index: usize) -> Self {
        Self {
            everything: false,
            inputs: vec![index],
        }
    }

    fn merge(&mut self, other: Dirty) {
        self.everything |= other.everything;
        for index in other.inputs {
            if !self.inputs.contains(&index) {
                self.inputs.push(index);
            }
        }
    }

    /// Output ports that need recomputing, in port order
    fn affected_outputs(&self, module: &dyn Module) -> Vec<usize> {
        let ports = module.ports();
        let mut outputs: Vec<usize> = if self.everything {
            (0..ports.len()).filter(|&i| ports[i].is_output()).collect()
        } else {
            self.inputs
                .iter()
                .flat_map(|&input| module.affected(input))
                .filter(|&p| ports.get(p).map_or(false, |port| port.is_output()))
                .collect()
        };
        outputs.sort_unstable();
        outputs.dedup();
        outputs
    }
}

/// Outcome of one propagation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Total number of module evaluations
    pub evaluations: usize,
    /// Each evaluated module once, in order of first evaluation
    pub evaluated: Vec<ModuleId>,
    /// Modules that hit the iteration bound and were flagged
    pub oscillating: Vec<ModuleId>,
}

impl StepReport {
    /// Whether the step reached a fixed point
    pub fn is_stable(&self) -> bool {
        self.oscillating.is_empty()
    }

    pub fn was_evaluated(&self, id: &ModuleId) -> bool {
        self.evaluated.contains(id)
    }

    /// Turn an unstable step into an error
    pub fn into_result(self) -> SimResult<StepReport> {
        if self.is_stable() {
            Ok(self)
        } else {
            Err(SimError::OscillationDetected(self.oscillating))
        }
    }
}

/// Pending modules, deduplicated by the caller's dirty map
enum WorkSet {
    Ranked(BTreeSet<(usize, ModuleId)>),
    Shuffled { items: Vec<ModuleId>, rng: StdRng },
}

impl WorkSet {
    fn new(order: WorkOrder) -> Self {
        match order {
            WorkOrder::Ranked => WorkSet::Ranked(BTreeSet::new()),
            WorkOrder::Shuffled(seed) => WorkSet::Shuffled {
                items: Vec::new(),
                rng: StdRng::seed_from_u64(seed),
            },
        }
    }

    fn push(&mut self, rank: usize, id: ModuleId) {
        match self {
            WorkSet::Ranked(set) => {
                set.insert((rank, id));
            }
            WorkSet::Shuffled { items, .. } => items.push(id),
        }
    }

    fn pop(&mut self) -> Option<ModuleId> {
        match self {
            WorkSet::Ranked(set) => set.pop_first().map(|(_, id)| id),
            WorkSet::Shuffled { items, rng } => {
                if items.is_empty() {
                    None
                } else {
                    let index = rng.gen_range(0..items.len());
                    Some(items.swap_remove(index))
                }
            }
        }
    }
}

/// Queue `id` unless it is already pending, in which case the dirty inputs
/// are merged into the existing entry
fn enqueue(
    work: &mut WorkSet,
    pending: &mut HashMap<ModuleId, Dirty>,
    rank: usize,
    id: ModuleId,
    dirty: Dirty,
) {
    match pending.get_mut(&id) {
        Some(existing) => existing.merge(dirty),
        None => {
            pending.insert(id, dirty);
            work.push(rank, id);
        }
    }
}

impl Circuit {
    /// Drain the work-set until no module is pending.
    ///
    /// Each module evaluates only outputs its changed inputs can affect, and
    /// only changed outputs travel further. A module that reaches the
    /// per-step evaluation bound stops being evaluated and is flagged; the
    /// rest of the circuit keeps settling.
    pub(crate) fn settle(&mut self, seeds: Vec<(ModuleId, Dirty)>) -> StepReport {
        self.ensure_execution_order();
        let bound = self.config.max_evaluations_per_module;
        let total_bound = self.config.max_total_evaluations;

        let mut work = WorkSet::new(self.config.work_order);
        let mut pending: HashMap<ModuleId, Dirty> = HashMap::new();
        let mut counts: HashMap<ModuleId, usize> = HashMap::new();
        let mut seen: HashSet<ModuleId> = HashSet::new();
        let mut report = StepReport::default();

        for (id, dirty) in seeds {
            if self.modules.contains_key(&id) {
                let rank = self.execution_order.rank(&id);
                enqueue(&mut work, &mut pending, rank, id, dirty);
            }
        }

        while let Some(id) = work.pop() {
            let Some(dirty) = pending.remove(&id) else {
                continue;
            };

            if let Some(limit) = total_bound {
                if report.evaluations >= limit {
                    let mut abandoned: Vec<ModuleId> = pending.keys().copied().collect();
                    abandoned.push(id);
                    abandoned.sort_by_key(|m| (self.execution_order.rank(m), *m));
                    warn!(
                        "Step reached {} evaluations; abandoning {} pending module(s)",
                        limit,
                        abandoned.len()
                    );
                    for m in abandoned {
                        if !report.oscillating.contains(&m) {
                            report.oscillating.push(m);
                        }
                    }
                    break;
                }
            }

            let Some(slot) = self.modules.get_mut(&id) else {
                continue;
            };
            let outputs = dirty.affected_outputs(slot.module.as_ref());
            if outputs.is_empty() {
                trace!("Skipped {}: no output depends on the changed inputs", id);
                continue;
            }

            let count = counts.get(&id).copied().unwrap_or(0);
            if count >= bound {
                // Drivers that spent their own budget re-queuing it are part of the same loop
                let drivers: Vec<ModuleId> = dirty
                    .inputs
                    .iter()
                    .filter_map(|&input| slot.module.ports().get(input))
                    .flat_map(|port| port.links.iter())
                    .filter_map(|link_id| self.connections.get(link_id))
                    .map(|link| link.source.module)
                    .filter(|driver| counts.get(driver).map_or(false, |&c| c >= bound))
                    .collect();
                for m in std::iter::once(id).chain(drivers) {
                    if !report.oscillating.contains(&m) {
                        report.oscillating.push(m);
                    }
                }
                continue;
            }
            counts.insert(id, count + 1);

            let before: Vec<Value> = outputs
                .iter()
                .map(|&o| slot.module.ports()[o].value)
                .collect();
            slot.module.propagate();
            report.evaluations += 1;
            if seen.insert(id) {
                report.evaluated.push(id);
            }
            trace!("Evaluated {} ({})", id, slot.module.kind());

            let mut deliveries: Vec<(PortRef, Value)> = Vec::new();
            for (&o, old) in outputs.iter().zip(&before) {
                let port = &slot.module.ports()[o];
                if port.value == *old {
                    continue;
                }
                for link_id in &port.links {
                    if let Some(link) = self.connections.get(link_id) {
                        deliveries.push((link.target, port.value));
                    }
                }
            }

            for (target, value) in deliveries {
                let Some(port) = self
                    .modules
                    .get_mut(&target.module)
                    .and_then(|s| s.module.ports_mut().get_mut(target.index))
                else {
                    continue;
                };
                let value = value.resized(port.width);
                if port.value == value {
                    continue;
                }
                port.value = value;
                let rank = self.execution_order.rank(&target.module);
                let dirty = Dirty::input(target.index);
                enqueue(&mut work, &mut pending, rank, target.module, dirty);
            }
        }

        if !report.oscillating.is_empty() {
            report
                .oscillating
                .sort_by_key(|m| (self.execution_order.rank(m), *m));
            for id in &report.oscillating {
                if let Some(slot) = self.modules.get_mut(id) {
                    slot.error = true;
                }
            }
            warn!(
                "Propagation did not settle; flagged {} module(s)",
                report.oscillating.len()
            );
        }

        trace!(
            "Step finished after {} evaluation(s) over {} module(s)",
            report.evaluations,
            report.evaluated.len()
        );
        report
    }

    /// Two-phase clock edge: every clocked module samples its inputs, then
    /// every one commits, so no module sees another's new state during the
    /// same edge. The combinational logic is settled afterwards.
    pub(crate) fn clock_edge(&mut self) -> StepReport {
        let clocked: Vec<ModuleId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.modules.get(id).map_or(false, |slot| slot.module.is_clocked()))
            .collect();

        for id in &clocked {
            if let Some(slot) = self.modules.get_mut(id) {
                slot.module.prepare_tick();
            }
        }
        for id in &clocked {
            if let Some(slot) = self.modules.get_mut(id) {
                slot.module.commit_tick();
            }
        }
        debug!("Committed clock edge on {} module(s)", clocked.len());

        self.settle(clocked.into_iter().map(|id| (id, Dirty::all())).collect())
    }
}
