use crate::core::components::port_specs::{Port, PortClass};
use crate::core::components::registry::ModuleKind;
use crate::core::errors::{SimError, SimResult};
use crate::core::values::data_element::DataElement;
use crate::core::values::value::Value;

/// Behaviour contract for every functional unit in a circuit.
///
/// A module owns its ports and internal state. The engine writes input
/// values into the ports, calls [`Module::propagate`], and reads outputs
/// back; a module never reaches into another module.
pub trait Module: Send {
    /// Palette entry this module was instantiated from
    fn kind(&self) -> ModuleKind;

    /// Ordered ports, inputs first
    fn ports(&self) -> &[Port];

    fn ports_mut(&mut self) -> &mut [Port];

    /// Recompute outputs from current inputs and internal state.
    ///
    /// Must not commit clocked state; that only happens in
    /// [`Module::commit_tick`].
    fn propagate(&mut self);

    /// Restore internal state and outputs to their initial condition
    fn reset(&mut self);

    /// Ports whose values may change when `input` changes.
    ///
    /// The default, every port, is always correct but makes the engine
    /// re-check more than it needs to.
    fn affected(&self, _input: usize) -> Vec<usize> {
        (0..self.ports().len()).collect()
    }

    /// Called once after a link is attached to one of this module's ports
    fn on_connect(&mut self) {}

    /// Run the module's truth-table self check on a scratch instance
    fn test(&self) -> bool {
        true
    }

    /// Whether [`Module::prepare_tick`]/[`Module::commit_tick`] do anything
    fn is_clocked(&self) -> bool {
        false
    }

    /// Compute the pending next state from current state and inputs
    fn prepare_tick(&mut self) {}

    /// Commit the pending state computed by [`Module::prepare_tick`]
    fn commit_tick(&mut self) {}

    /// Interactive stimulus, e.g. flipping a switch
    fn set_state(&mut self, _value: Value) -> SimResult<()> {
        Err(SimError::Unsupported(format!("{:?} has no settable state", self.kind())))
    }

    /// Whether `input` may be driven by an output of class `source`
    fn accepts(&self, input: usize, source: PortClass) -> bool {
        self.ports()
            .get(input)
            .map_or(false, |port| source.can_drive(&port.class))
    }

    /// Restore module-specific persistent state
    fn data_in(&mut self, _data: &DataElement) -> SimResult<()> {
        Ok(())
    }

    /// Write module-specific persistent state; returns whether anything was written
    fn data_out(&self, _data: &mut DataElement) -> bool {
        false
    }
}

/// Port lookup helpers shared by all module implementations
pub trait ModuleExt {
    /// Current value of the port at `index`
    fn value(&self, index: usize) -> Value;

    /// Index of the port called `name`
    fn port_index(&self, name: &str) -> Option<usize>;

    /// Drive an output, resizing to the port's width
    fn drive(&mut self, index: usize, value: Value);

    /// Put every output back to zero
    fn clear_outputs(&mut self);
}

impl<M: Module + ?Sized> ModuleExt for M {
    fn value(&self, index: usize) -> Value {
        self.ports()[index].value
    }

    fn port_index(&self, name: &str) -> Option<usize> {
        self.ports().iter().position(|p| p.name == name)
    }

    fn drive(&mut self, index: usize, value: Value) {
        let port = &mut self.ports_mut()[index];
        port.value = value.resized(port.width);
    }

    fn clear_outputs(&mut self) {
        for port in self.ports_mut().iter_mut().filter(|p| p.is_output()) {
            port.value = Value::zero(port.width);
        }
    }
}
