use crate::core::circuit::Circuit;
use crate::core::components::registry::ModuleKind;
use crate::core::errors::{SimError, SimResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::propagation::StepReport;
use crate::core::types::{LinkId, ModuleId, PortRef, Position};
use crate::core::values::{DataElement, Value};
use log::debug;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe front end for a [`Circuit`].
///
/// Every operation takes one lock for its whole duration, so structural
/// edits, stimuli and clock ticks from different threads are serialized and
/// each sees a settled circuit.
pub struct SimulationEngine {
    circuit: Mutex<Circuit>,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self::from_circuit(Circuit::with_config(config))
    }

    pub fn from_circuit(circuit: Circuit) -> Self {
        Self {
            circuit: Mutex::new(circuit),
        }
    }

    fn lock(&self) -> SimResult<MutexGuard<'_, Circuit>> {
        self.circuit.lock().map_err(|_| SimError::LockPoisoned)
    }

    /// Run `f` against the circuit under the lock
    pub fn read<R>(&self, f: impl FnOnce(&Circuit) -> R) -> SimResult<R> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Run `f` against the circuit under the lock, allowing several edits to
    /// land as one atomic batch
    pub fn edit<R>(&self, f: impl FnOnce(&mut Circuit) -> R) -> SimResult<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    pub fn add_module(&self, kind: ModuleKind, position: Position) -> SimResult<ModuleId> {
        Ok(self.lock()?.add_module(kind, position))
    }

    pub fn remove_module(&self, id: ModuleId) -> SimResult<Vec<LinkId>> {
        self.lock()?.remove_module(id)
    }

    pub fn connect(&self, source: PortRef, target: PortRef) -> SimResult<LinkId> {
        self.lock()?.connect(source, target)
    }

    pub fn disconnect(&self, link: LinkId) -> SimResult<()> {
        self.lock()?.disconnect(link)
    }

    pub fn set_input(&self, port: PortRef, value: Value) -> SimResult<StepReport> {
        self.lock()?.set_input(port, value)
    }

    pub fn set_state(&self, id: ModuleId, value: Value) -> SimResult<StepReport> {
        self.lock()?.set_state(id, value)
    }

    pub fn tick(&self) -> SimResult<StepReport> {
        Ok(self.lock()?.tick())
    }

    /// Apply `ticks` clock edges under one lock and return the final cycle
    pub fn run(&self, ticks: u64) -> SimResult<u64> {
        let mut circuit = self.lock()?;
        for _ in 0..ticks {
            circuit.tick();
        }
        debug!("Ran {} tick(s), now at cycle {}", ticks, circuit.cycle());
        Ok(circuit.cycle())
    }

    pub fn reset(&self) -> SimResult<StepReport> {
        Ok(self.lock()?.reset())
    }

    pub fn reevaluate(&self, id: ModuleId) -> SimResult<StepReport> {
        self.lock()?.reevaluate(id)
    }

    pub fn current_value(&self, port: PortRef) -> SimResult<Value> {
        self.lock()?.current_value(port)
    }

    pub fn is_error(&self, id: ModuleId) -> SimResult<bool> {
        self.lock()?.is_error(id)
    }

    pub fn port(&self, id: ModuleId, name: &str) -> SimResult<PortRef> {
        self.lock()?.port(id, name)
    }

    pub fn current_cycle(&self) -> SimResult<u64> {
        Ok(self.lock()?.cycle())
    }

    pub fn module_data(&self, id: ModuleId) -> SimResult<Option<DataElement>> {
        self.lock()?.module_data(id)
    }

    pub fn restore_module_data(&self, id: ModuleId, data: &DataElement) -> SimResult<StepReport> {
        self.lock()?.restore_module_data(id, data)
    }

    /// Take the circuit back out of the engine
    pub fn into_inner(self) -> SimResult<Circuit> {
        self.circuit.into_inner().map_err(|_| SimError::LockPoisoned)
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SimulationEngine>();
    }

    #[test]
    fn test_run_counts_cycles() {
        let engine = SimulationEngine::default();
        let clock = engine.add_module(ModuleKind::Clock, Position::default()).unwrap();
        assert_eq!(engine.run(3), Ok(3));
        assert_eq!(engine.current_cycle(), Ok(3));
        assert_eq!(engine.current_value(clock.port(0)), Ok(Value::from_bool(true)));
    }

    #[test]
    fn test_edit_batches_under_one_lock() {
        let engine = SimulationEngine::default();
        let (sw, or) = engine
            .edit(|c| {
                let sw = c.add_module(ModuleKind::Switch, Position::default());
                let or = c.add_module(ModuleKind::Or, Position::default());
                (sw, or)
            })
            .unwrap();
        engine
            .edit(|c| c.connect(sw.port(0), or.port(0)))
            .unwrap()
            .unwrap();
        assert_eq!(engine.read(|c| c.link_count()), Ok(1));

        let circuit = engine.into_inner().unwrap();
        assert!(circuit.contains(sw) && circuit.contains(or));
        assert_eq!(circuit.current_value(or.port(2)), Ok(Value::zero(4)));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let engine = Arc::new(SimulationEngine::default());
        let poisoner = Arc::clone(&engine);
        let _ = thread::spawn(move || {
            let _ = poisoner.edit(|c| {
                if c.module_count() == 0 {
                    panic!("boom");
                }
            });
        })
        .join();
        assert_eq!(engine.tick(), Err(SimError::LockPoisoned));
    }
}
