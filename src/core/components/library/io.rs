use crate::core::components::port_specs::{Port, DATA_WIDTH};
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::errors::SimResult;
use crate::core::values::data_element::DataElement;
use crate::core::values::value::Value;

/// User-operated input source. Its setting is user data and survives reset.
pub struct Switch {
    ports: Vec<Port>,
    setting: Value,
}

impl Switch {
    const Q: usize = 0;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [],
                outputs: [("Q", Data, DATA_WIDTH)]
            ],
            setting: Value::zero(DATA_WIDTH),
        }
    }

    pub fn setting(&self) -> Value {
        self.setting
    }
}

impl Default for Switch {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Switch {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Switch
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        self.drive(Self::Q, self.setting);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn set_state(&mut self, value: Value) -> SimResult<()> {
        self.setting = value.resized(DATA_WIDTH);
        Ok(())
    }

    fn data_in(&mut self, data: &DataElement) -> SimResult<()> {
        if let Some(bits) = data.get_hex("value")? {
            self.setting = Value::new(DATA_WIDTH, bits);
        }
        Ok(())
    }

    fn data_out(&self, data: &mut DataElement) -> bool {
        data.set("value", format!("{:x}", self.setting.bits()));
        true
    }

    fn test(&self) -> bool {
        let mut m = Switch::new();
        if m.set_state(Value::new(8, 0x3a)).is_err() {
            return false;
        }
        m.propagate();
        m.value(Self::Q) == Value::new(DATA_WIDTH, 0xa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_self_check() {
        assert!(Switch::new().test());
    }

    #[test]
    fn test_switch_persists_setting() {
        let mut s = Switch::new();
        s.set_state(Value::new(4, 6)).unwrap();
        let mut elem = DataElement::new();
        assert!(s.data_out(&mut elem));

        let mut restored = Switch::new();
        restored.data_in(&elem).unwrap();
        assert_eq!(restored.setting(), Value::new(4, 6));
    }
}
