use crate::core::components::port_specs::Port;
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::connections::{ConnectionManager, ConnectionStats, Link, PortValidator};
use crate::core::errors::{SimError, SimResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::execution_order::{ExecutionOrder, ExecutionOrderBuilder};
use crate::core::execution::propagation::{Dirty, StepReport};
use crate::core::types::{LinkId, ModuleId, PortRef, Position};
use crate::core::values::{DataElement, Value};
use log::debug;
use std::collections::HashMap;

/// A placed module plus the bookkeeping the graph keeps for it
pub(crate) struct ModuleSlot {
    pub(crate) module: Box<dyn Module>,
    pub(crate) position: Position,
    pub(crate) error: bool,
}

/// The circuit graph: every module, every link, and the cached evaluation
/// order.
///
/// All mutators leave the graph settled. Structural errors are reported
/// before anything is touched, so a failed call changes nothing.
pub struct Circuit {
    pub(crate) modules: HashMap<ModuleId, ModuleSlot>,
    /// Insertion order, used wherever iteration order must be deterministic
    pub(crate) order: Vec<ModuleId>,
    pub(crate) connections: ConnectionManager,
    pub(crate) execution_order: ExecutionOrder,
    pub(crate) config: SimulationConfig,
    cycle: u64,
    last_report: StepReport,
}

impl Circuit {
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            modules: HashMap::new(),
            order: Vec::new(),
            connections: ConnectionManager::new(),
            execution_order: ExecutionOrder::new(),
            config,
            cycle: 0,
            last_report: StepReport::default(),
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Instantiate a module of `kind` and place it in the circuit
    pub fn add_module(&mut self, kind: ModuleKind, position: Position) -> ModuleId {
        let id = ModuleId::new();
        let mut module = kind.instantiate();
        module.reset();
        self.modules.insert(
            id,
            ModuleSlot {
                module,
                position,
                error: false,
            },
        );
        self.order.push(id);
        self.execution_order.invalidate();
        debug!("Added {} module {}", kind, id);

        self.step(vec![(id, Dirty::all())]);
        id
    }

    /// Detach every link touching `id`, then remove the module.
    ///
    /// Returns the ids of the links that were removed with it.
    pub fn remove_module(&mut self, id: ModuleId) -> SimResult<Vec<LinkId>> {
        if !self.modules.contains_key(&id) {
            return Err(SimError::UnknownModule(id));
        }

        let links = self.connections.links_touching(&id);
        let mut seeds = Vec::new();
        for link_id in &links {
            let seed = self.detach(link_id)?;
            if seed.0 != id {
                seeds.push(seed);
            }
        }

        self.modules.remove(&id);
        self.order.retain(|m| *m != id);
        self.execution_order.invalidate();
        debug!("Removed module {} and {} link(s)", id, links.len());

        self.step(seeds);
        Ok(links)
    }

    /// Link an output port to an input port
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> SimResult<LinkId> {
        let source_slot = self
            .modules
            .get(&source.module)
            .ok_or(SimError::UnknownModule(source.module))?;
        let target_slot = self
            .modules
            .get(&target.module)
            .ok_or(SimError::UnknownModule(target.module))?;
        PortValidator::validate_link(
            source_slot.module.as_ref(),
            source,
            target_slot.module.as_ref(),
            target,
        )?;
        let value = source_slot.module.ports()[source.index].value;

        let id = self.connections.add_link(Link::new(source, target));
        if let Some(slot) = self.modules.get_mut(&source.module) {
            slot.module.ports_mut()[source.index].links.push(id);
            slot.module.on_connect();
        }
        if let Some(slot) = self.modules.get_mut(&target.module) {
            let port = &mut slot.module.ports_mut()[target.index];
            port.links.push(id);
            port.value = value.resized(port.width);
            slot.module.on_connect();
        }
        self.execution_order.invalidate();
        debug!("Linked {} -> {} as {}", source, target, id);

        self.step(vec![(target.module, Dirty::input(target.index))]);
        Ok(id)
    }

    /// Remove a link; its input falls back to the pull default
    pub fn disconnect(&mut self, link: LinkId) -> SimResult<()> {
        let seed = self.detach(&link)?;
        self.execution_order.invalidate();
        debug!("Unlinked {}", link);

        self.step(vec![seed]);
        Ok(())
    }

    fn detach(&mut self, link_id: &LinkId) -> SimResult<(ModuleId, Dirty)> {
        let link = self.connections.remove_link(link_id)?;

        if let Some(slot) = self.modules.get_mut(&link.source.module) {
            if let Some(port) = slot.module.ports_mut().get_mut(link.source.index) {
                port.links.retain(|l| l != link_id);
            }
        }
        if let Some(slot) = self.modules.get_mut(&link.target.module) {
            if let Some(port) = slot.module.ports_mut().get_mut(link.target.index) {
                port.links.retain(|l| l != link_id);
                port.value = port.idle_value();
            }
        }

        Ok((link.target.module, Dirty::input(link.target.index)))
    }

    // ------------------------------------------------------------------
    // Stimuli
    // ------------------------------------------------------------------

    /// Drive an unconnected input directly
    pub fn set_input(&mut self, port: PortRef, value: Value) -> SimResult<StepReport> {
        let slot = self
            .modules
            .get_mut(&port.module)
            .ok_or(SimError::UnknownModule(port.module))?;
        let spec = slot
            .module
            .ports_mut()
            .get_mut(port.index)
            .ok_or(SimError::UnknownPort(port))?;
        if !spec.is_input() {
            return Err(SimError::WrongDirection(port));
        }
        if spec.is_connected() {
            return Err(SimError::AlreadyConnected(port));
        }
        spec.value = value.resized(spec.width);

        Ok(self.step(vec![(port.module, Dirty::input(port.index))]))
    }

    /// Change the interactive state of a source module such as a switch
    pub fn set_state(&mut self, id: ModuleId, value: Value) -> SimResult<StepReport> {
        self.slot_mut(id)?.module.set_state(value)?;
        Ok(self.step(vec![(id, Dirty::all())]))
    }

    /// Advance every clocked module by one edge
    pub fn tick(&mut self) -> StepReport {
        self.cycle += 1;
        debug!("=== Clock edge {} ===", self.cycle);
        let report = self.clock_edge();
        self.last_report = report.clone();
        report
    }

    /// Reset every module, clear error flags, and settle from scratch
    pub fn reset(&mut self) -> StepReport {
        for slot in self.modules.values_mut() {
            slot.module.reset();
            slot.error = false;
        }

        let deliveries: Vec<(PortRef, Value)> = self
            .connections
            .links()
            .filter_map(|link| {
                let slot = self.modules.get(&link.source.module)?;
                let port = slot.module.ports().get(link.source.index)?;
                Some((link.target, port.value))
            })
            .collect();
        for (target, value) in deliveries {
            if let Some(port) = self
                .modules
                .get_mut(&target.module)
                .and_then(|slot| slot.module.ports_mut().get_mut(target.index))
            {
                port.value = value.resized(port.width);
            }
        }

        self.cycle = 0;
        debug!("Reset {} module(s)", self.modules.len());
        let seeds = self.order.iter().map(|id| (*id, Dirty::all())).collect();
        self.step(seeds)
    }

    /// Re-run one module as if all of its inputs had changed
    pub fn reevaluate(&mut self, id: ModuleId) -> SimResult<StepReport> {
        self.slot(id)?;
        Ok(self.step(vec![(id, Dirty::all())]))
    }

    fn step(&mut self, seeds: Vec<(ModuleId, Dirty)>) -> StepReport {
        let report = self.settle(seeds);
        self.last_report = report.clone();
        report
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current value of any port
    pub fn current_value(&self, port: PortRef) -> SimResult<Value> {
        self.slot(port.module)?
            .module
            .ports()
            .get(port.index)
            .map(|p| p.value)
            .ok_or(SimError::UnknownPort(port))
    }

    /// Whether the module was caught in a non-settling loop since the last reset
    pub fn is_error(&self, id: ModuleId) -> SimResult<bool> {
        Ok(self.slot(id)?.error)
    }

    /// Modules currently flagged, in insertion order
    pub fn error_modules(&self) -> Vec<ModuleId> {
        self.order
            .iter()
            .filter(|id| self.modules.get(id).map_or(false, |slot| slot.error))
            .copied()
            .collect()
    }

    /// Module ids in insertion order
    pub fn module_ids(&self) -> &[ModuleId] {
        &self.order
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    pub fn kind(&self, id: ModuleId) -> SimResult<ModuleKind> {
        Ok(self.slot(id)?.module.kind())
    }

    pub fn position(&self, id: ModuleId) -> SimResult<Position> {
        Ok(self.slot(id)?.position)
    }

    /// Move a module on the canvas. Geometry never affects simulation.
    pub fn set_position(&mut self, id: ModuleId, position: Position) -> SimResult<()> {
        self.slot_mut(id)?.position = position;
        Ok(())
    }

    pub fn ports(&self, id: ModuleId) -> SimResult<&[Port]> {
        Ok(self.slot(id)?.module.ports())
    }

    /// Look a port up by name
    pub fn port(&self, id: ModuleId, name: &str) -> SimResult<PortRef> {
        self.slot(id)?
            .module
            .port_index(name)
            .map(|index| id.port(index))
            .ok_or_else(|| SimError::NoSuchPort {
                module: id,
                name: name.to_string(),
            })
    }

    pub fn link(&self, id: LinkId) -> SimResult<&Link> {
        self.connections.get(&id).ok_or(SimError::UnknownLink(id))
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.connections.links()
    }

    pub fn link_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.connections.stats()
    }

    /// Number of clock edges since creation or the last reset
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Report of the most recent propagation step
    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Persistence hooks
    // ------------------------------------------------------------------

    /// Module-specific state to save, if the module has any
    pub fn module_data(&self, id: ModuleId) -> SimResult<Option<DataElement>> {
        let mut data = DataElement::new();
        let written = self.slot(id)?.module.data_out(&mut data);
        Ok(written.then_some(data))
    }

    /// Restore module-specific state and settle the result
    pub fn restore_module_data(
        &mut self,
        id: ModuleId,
        data: &DataElement,
    ) -> SimResult<StepReport> {
        self.slot_mut(id)?.module.data_in(data)?;
        Ok(self.step(vec![(id, Dirty::all())]))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn slot(&self, id: ModuleId) -> SimResult<&ModuleSlot> {
        self.modules.get(&id).ok_or(SimError::UnknownModule(id))
    }

    fn slot_mut(&mut self, id: ModuleId) -> SimResult<&mut ModuleSlot> {
        self.modules.get_mut(&id).ok_or(SimError::UnknownModule(id))
    }

    /// Rebuild the cached ranks if an edit dropped them.
    ///
    /// Only links into inputs that can combinationally move an output count
    /// as dependencies, so loops closed through a register are not loops.
    pub(crate) fn ensure_execution_order(&mut self) {
        if self.execution_order.is_valid() {
            return;
        }
        let edges: Vec<(ModuleId, ModuleId)> = self
            .connections
            .links()
            .filter(|link| {
                self.modules.get(&link.target.module).map_or(false, |slot| {
                    let ports = slot.module.ports();
                    slot.module
                        .affected(link.target.index)
                        .iter()
                        .any(|&p| ports.get(p).map_or(false, |port| port.is_output()))
                })
            })
            .map(|link| (link.source.module, link.target.module))
            .collect();
        self.execution_order
            .store(ExecutionOrderBuilder::build_ranks(&self.order, &edges));
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Position {
        Position::new(x, 0.0)
    }

    #[test]
    fn test_add_module_settles_outputs() {
        let mut circuit = Circuit::new();
        let logic = circuit.add_module(ModuleKind::Logic, at(0.0));
        // F pulls to AND of two zeros
        let q = circuit.port(logic, "Q").unwrap();
        assert_eq!(circuit.current_value(q), Ok(Value::zero(4)));
        assert_eq!(circuit.kind(logic), Ok(ModuleKind::Logic));
    }

    #[test]
    fn test_connect_delivers_current_value() {
        let mut circuit = Circuit::new();
        let sw = circuit.add_module(ModuleKind::Switch, at(0.0));
        let reg = circuit.add_module(ModuleKind::Register, at(1.0));
        circuit.set_state(sw, Value::new(4, 9)).unwrap();

        circuit.connect(sw.port(0), reg.port(0)).unwrap();
        assert_eq!(circuit.current_value(reg.port(0)), Ok(Value::new(4, 9)));
    }

    #[test]
    fn test_failed_connect_changes_nothing() {
        let mut circuit = Circuit::new();
        let clock = circuit.add_module(ModuleKind::Clock, at(0.0));
        let reg = circuit.add_module(ModuleKind::Register, at(1.0));

        let err = circuit.connect(clock.port(0), reg.port(0)).unwrap_err();
        assert!(matches!(err, SimError::TypeMismatch { .. }));
        assert_eq!(circuit.link_count(), 0);
        assert!(!circuit.ports(reg).unwrap()[0].is_connected());
        assert!(circuit.ports(clock).unwrap()[0].links.is_empty());
    }

    #[test]
    fn test_second_driver_rejected() {
        let mut circuit = Circuit::new();
        let a = circuit.add_module(ModuleKind::Switch, at(0.0));
        let b = circuit.add_module(ModuleKind::Switch, at(1.0));
        let or = circuit.add_module(ModuleKind::Or, at(2.0));

        circuit.connect(a.port(0), or.port(0)).unwrap();
        assert_eq!(
            circuit.connect(b.port(0), or.port(0)),
            Err(SimError::AlreadyConnected(or.port(0)))
        );
        assert_eq!(circuit.link_count(), 1);
    }

    #[test]
    fn test_set_input_rules() {
        let mut circuit = Circuit::new();
        let sw = circuit.add_module(ModuleKind::Switch, at(0.0));
        let or = circuit.add_module(ModuleKind::Or, at(1.0));
        circuit.connect(sw.port(0), or.port(0)).unwrap();

        assert_eq!(
            circuit.set_input(or.port(0), Value::new(4, 1)).unwrap_err(),
            SimError::AlreadyConnected(or.port(0))
        );
        assert_eq!(
            circuit.set_input(or.port(2), Value::new(4, 1)).unwrap_err(),
            SimError::WrongDirection(or.port(2))
        );
        assert_eq!(
            circuit.set_input(or.port(7), Value::new(4, 1)).unwrap_err(),
            SimError::UnknownPort(or.port(7))
        );

        circuit.set_input(or.port(1), Value::new(4, 6)).unwrap();
        assert_eq!(circuit.current_value(or.port(2)), Ok(Value::new(4, 6)));
    }

    #[test]
    fn test_unknown_references_are_reported() {
        let mut circuit = Circuit::new();
        let sw = circuit.add_module(ModuleKind::Switch, at(0.0));
        circuit.remove_module(sw).unwrap();

        assert_eq!(circuit.remove_module(sw), Err(SimError::UnknownModule(sw)));
        assert_eq!(circuit.is_error(sw), Err(SimError::UnknownModule(sw)));
        assert_eq!(circuit.current_value(sw.port(0)), Err(SimError::UnknownModule(sw)));
        assert!(matches!(
            circuit.set_state(sw, Value::new(4, 1)),
            Err(SimError::UnknownModule(_))
        ));
    }

    #[test]
    fn test_set_state_unsupported_on_gate() {
        let mut circuit = Circuit::new();
        let or = circuit.add_module(ModuleKind::Or, at(0.0));
        assert!(matches!(
            circuit.set_state(or, Value::new(4, 1)),
            Err(SimError::Unsupported(_))
        ));
    }

    #[test]
    fn test_port_lookup_by_name() {
        let mut circuit = Circuit::new();
        let ram = circuit.add_module(ModuleKind::Ram, at(0.0));
        assert_eq!(circuit.port(ram, "W"), Ok(ram.port(2)));
        assert!(matches!(circuit.port(ram, "nope"), Err(SimError::NoSuchPort { .. })));
    }

    #[test]
    fn test_position_is_stored_only() {
        let mut circuit = Circuit::new();
        let sw = circuit.add_module(ModuleKind::Switch, Position::new(3.0, 4.0));
        circuit.set_position(sw, Position::new(10.0, -2.0)).unwrap();
        assert_eq!(circuit.position(sw), Ok(Position::new(10.0, -2.0)));
    }

    #[test]
    fn test_module_data_hooks() {
        let mut circuit = Circuit::new();
        let ram = circuit.add_module(ModuleKind::Ram, at(0.0));
        let or = circuit.add_module(ModuleKind::Or, at(1.0));
        assert_eq!(circuit.module_data(or), Ok(None));
        assert_eq!(circuit.module_data(ram), Ok(None));

        let mut data = DataElement::new();
        data.set("data", "0 7");
        circuit.restore_module_data(ram, &data).unwrap();
        circuit.set_input(ram.port(0), Value::new(4, 1)).unwrap();
        assert_eq!(circuit.current_value(ram.port(3)), Ok(Value::new(4, 7)));
        assert!(circuit.module_data(ram).unwrap().is_some());
    }

    #[test]
    fn test_register_loop_is_not_a_dependency_cycle() {
        let mut circuit = Circuit::new();
        let reg = circuit.add_module(ModuleKind::Register, at(0.0));
        let add = circuit.add_module(ModuleKind::AddSub, at(1.0));
        circuit.connect(reg.port(2), add.port(0)).unwrap();
        circuit.connect(add.port(3), reg.port(0)).unwrap();

        circuit.ensure_execution_order();
        assert!(circuit.execution_order.rank(&reg) < circuit.execution_order.rank(&add));
    }
}
