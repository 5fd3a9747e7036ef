use crate::core::types::LinkId;
use crate::core::values::value::Value;
use serde::{Deserialize, Serialize};

/// Default width of data ports
pub const DATA_WIDTH: u8 = 4;

/// Direction of a port relative to its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Input port - receives values over at most one link
    Input,
    /// Output port - drives any number of links
    Output,
}

/// Logical class of a port, used to reject nonsensical links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortClass {
    Generic,
    Control,
    Clock,
    Data,
}

impl PortClass {
    /// Check if an output of this class may drive an input of class `input`
    pub fn can_drive(&self, input: &PortClass) -> bool {
        match (self, input) {
            (PortClass::Generic, _) | (_, PortClass::Generic) => true,
            (PortClass::Clock, PortClass::Control) => true,
            (a, b) => a == b,
        }
    }
}

/// A connection point owned by exactly one module
#[derive(Debug, Clone)]
pub struct Port {
    /// Port name, unique within its module
    pub name: &'static str,
    pub direction: PortDirection,
    pub class: PortClass,
    pub width: u8,
    /// Current value
    pub value: Value,
    /// Value an unconnected input falls back to
    pub pull: Option<Value>,
    /// Attached links; inputs hold at most one
    pub links: Vec<LinkId>,
}

impl Port {
    /// Create an input port that pulls to zero when unconnected
    pub fn input(name: &'static str, class: PortClass, width: u8) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            class,
            width,
            value: Value::zero(width),
            pull: Some(Value::zero(width)),
            links: Vec::new(),
        }
    }

    /// Create an output port
    pub fn output(name: &'static str, class: PortClass, width: u8) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            class,
            width,
            value: Value::zero(width),
            pull: None,
            links: Vec::new(),
        }
    }

    /// Replace the pull default of an input
    pub fn with_pull(mut self, bits: u32) -> Self {
        let pull = Value::new(self.width, bits);
        self.pull = Some(pull);
        self.value = pull;
        self
    }

    /// Leave the input floating when unconnected
    pub fn floating(mut self) -> Self {
        self.pull = None;
        self.value = Value::floating(self.width);
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// Value this input reads while no link drives it
    pub fn idle_value(&self) -> Value {
        self.pull.unwrap_or_else(|| Value::floating(self.width))
    }
}

/// Build a module's ordered port list: inputs first, then outputs.
///
/// ```ignore
/// let ports = ports![
///     inputs: [("A", Data, 4), ("B", Data, 4)],
///     outputs: [("Q", Data, 4)]
/// ];
/// ```
#[macro_export]
macro_rules! ports {
    (
        inputs: [$(($iname:expr, $iclass:ident, $iwidth:expr)),* $(,)?],
        outputs: [$(($oname:expr, $oclass:ident, $owidth:expr)),* $(,)?] $(,)?
    ) => {
        vec![
            $(
                $crate::core::components::port_specs::Port::input(
                    $iname,
                    $crate::core::components::port_specs::PortClass::$iclass,
                    $iwidth,
                ),
            )*
            $(
                $crate::core::components::port_specs::Port::output(
                    $oname,
                    $crate::core::components::port_specs::PortClass::$oclass,
                    $owidth,
                ),
            )*
        ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_compatibility() {
        assert!(PortClass::Generic.can_drive(&PortClass::Data));
        assert!(PortClass::Data.can_drive(&PortClass::Generic));
        assert!(PortClass::Clock.can_drive(&PortClass::Control));
        assert!(PortClass::Data.can_drive(&PortClass::Data));
        assert!(!PortClass::Clock.can_drive(&PortClass::Data));
        assert!(!PortClass::Control.can_drive(&PortClass::Clock));
    }

    #[test]
    fn test_ports_macro_orders_inputs_first() {
        let ports: Vec<Port> = ports![
            inputs: [("A", Data, 4), ("S", Control, 1)],
            outputs: [("Q", Data, 4)]
        ];
        assert_eq!(ports.len(), 3);
        assert!(ports[0].is_input() && ports[1].is_input());
        assert!(ports[2].is_output());
        assert_eq!(ports[1].width, 1);
    }

    #[test]
    fn test_pull_defaults() {
        let p = Port::input("E", PortClass::Control, 1).with_pull(1);
        assert_eq!(p.idle_value(), Value::new(1, 1));
        assert_eq!(p.value, Value::new(1, 1));
        let f = Port::input("X", PortClass::Data, 4).floating();
        assert!(!f.idle_value().is_valid());
    }
}
