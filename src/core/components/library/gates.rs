use super::evaluate;
use crate::core::components::port_specs::{Port, DATA_WIDTH};
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::values::value::Value;

/// Bitwise OR of two generic inputs
pub struct Or {
    ports: Vec<Port>,
}

impl Or {
    const A: usize = 0;
    const B: usize = 1;
    const Q: usize = 2;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("A", Generic, DATA_WIDTH), ("B", Generic, DATA_WIDTH)],
                outputs: [("Q", Generic, DATA_WIDTH)]
            ],
        }
    }
}

impl Default for Or {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Or {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Or
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let q = self.value(Self::A).or(&self.value(Self::B));
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        match input {
            Self::A | Self::B => vec![Self::Q],
            _ => Vec::new(),
        }
    }

    fn test(&self) -> bool {
        let mut m = Or::new();
        [(0, 0), (1, 0), (0, 1), (0b1010, 0b0101), (0b1100, 0b0100)]
            .iter()
            .all(|&(a, b)| evaluate(&mut m, &[(Self::A, a), (Self::B, b)], Self::Q) == a | b)
    }
}

/// Selectable logic unit. The two-bit `F` input picks the function:
/// 0 AND, 1 OR, 2 XOR, 3 NOT A.
pub struct Logic {
    ports: Vec<Port>,
}

impl Logic {
    const A: usize = 0;
    const B: usize = 1;
    const F: usize = 2;
    const Q: usize = 3;

    pub const AND: u32 = 0;
    pub const OR: u32 = 1;
    pub const XOR: u32 = 2;
    pub const NOT: u32 = 3;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("A", Data, DATA_WIDTH), ("B", Data, DATA_WIDTH), ("F", Control, 2)],
                outputs: [("Q", Data, DATA_WIDTH)]
            ],
        }
    }
}

impl Default for Logic {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Logic {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Logic
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let (a, b, f) = (self.value(Self::A), self.value(Self::B), self.value(Self::F));
        let q = if !f.is_valid() {
            Value::floating(DATA_WIDTH)
        } else {
            match f.bits() {
                Self::AND => a.and(&b),
                Self::OR => a.or(&b),
                Self::XOR => a.xor(&b),
                _ => a.not(),
            }
        };
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        if input <= Self::F {
            vec![Self::Q]
        } else {
            Vec::new()
        }
    }

    fn test(&self) -> bool {
        let mut m = Logic::new();
        let (a, b) = (0b1100, 0b1010);
        let mut check = |f: u32, expected: u32| {
            evaluate(&mut m, &[(Self::A, a), (Self::B, b), (Self::F, f)], Self::Q) == expected
        };
        check(Self::AND, 0b1000)
            && check(Self::OR, 0b1110)
            && check(Self::XOR, 0b0110)
            && check(Self::NOT, 0b0011)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_self_check() {
        assert!(Or::new().test());
    }

    #[test]
    fn test_logic_self_check() {
        assert!(Logic::new().test());
    }

    #[test]
    fn test_logic_floating_function_floats_output() {
        let mut m = Logic::new();
        m.ports_mut()[Logic::F].value = Value::floating(2);
        m.propagate();
        assert!(!m.value(Logic::Q).is_valid());
    }

    #[test]
    fn test_or_propagate_is_idempotent() {
        let mut m = Or::new();
        evaluate(&mut m, &[(Or::A, 3), (Or::B, 4)], Or::Q);
        let before = m.value(Or::Q);
        m.propagate();
        assert_eq!(m.value(Or::Q), before);
        assert_eq!(before, Value::new(4, 7));
    }
}
