use super::evaluate;
use crate::core::components::port_specs::{Port, DATA_WIDTH};
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::values::value::Value;

/// Adder/subtractor. `S` high selects `A - B`; `C` carries out on addition
/// and signals a borrow on subtraction.
pub struct AddSub {
    ports: Vec<Port>,
}

impl AddSub {
    const A: usize = 0;
    const B: usize = 1;
    const S: usize = 2;
    const Q: usize = 3;
    const C: usize = 4;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("A", Data, DATA_WIDTH), ("B", Data, DATA_WIDTH), ("S", Control, 1)],
                outputs: [("Q", Data, DATA_WIDTH), ("C", Control, 1)]
            ],
        }
    }
}

impl Default for AddSub {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for AddSub {
    fn kind(&self) -> ModuleKind {
        ModuleKind::AddSub
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let (a, b, s) = (self.value(Self::A), self.value(Self::B), self.value(Self::S));
        if !(a.is_valid() && b.is_valid() && s.is_valid()) {
            self.drive(Self::Q, Value::floating(DATA_WIDTH));
            self.drive(Self::C, Value::floating(1));
            return;
        }

        let max = Value::zero(DATA_WIDTH).max() as u64;
        let (result, carry) = if s.is_high() {
            (a.bits().wrapping_sub(b.bits()), a.bits() < b.bits())
        } else {
            let sum = a.bits() as u64 + b.bits() as u64;
            (sum as u32, sum > max)
        };
        self.drive(Self::Q, Value::new(DATA_WIDTH, result));
        self.drive(Self::C, Value::from_bool(carry));
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        if input <= Self::S {
            vec![Self::Q, Self::C]
        } else {
            Vec::new()
        }
    }

    fn test(&self) -> bool {
        let mut m = AddSub::new();
        let cases = [
            // (a, b, sub, q, carry)
            (3, 4, 0, 7, 0),
            (9, 9, 0, 2, 1),
            (15, 1, 0, 0, 1),
            (7, 2, 1, 5, 0),
            (2, 7, 1, 11, 1),
        ];
        cases.iter().all(|&(a, b, s, q, c)| {
            let got = evaluate(&mut m, &[(Self::A, a), (Self::B, b), (Self::S, s)], Self::Q);
            got == q && m.value(Self::C).bits() == c
        })
    }
}

/// Logical shift by one bit
pub struct Shift {
    ports: Vec<Port>,
    left: bool,
}

impl Shift {
    const D: usize = 0;
    const Q: usize = 1;

    pub fn new(left: bool) -> Self {
        Self {
            ports: crate::ports![
                inputs: [("D", Data, DATA_WIDTH)],
                outputs: [("Q", Data, DATA_WIDTH)]
            ],
            left,
        }
    }

    pub fn left() -> Self {
        Self::new(true)
    }

    pub fn right() -> Self {
        Self::new(false)
    }
}

impl Module for Shift {
    fn kind(&self) -> ModuleKind {
        if self.left {
            ModuleKind::LeftShift
        } else {
            ModuleKind::RightShift
        }
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let d = self.value(Self::D);
        let bits = if self.left { d.bits() << 1 } else { d.bits() >> 1 };
        let mut q = Value::new(DATA_WIDTH, bits);
        if !d.is_valid() {
            q = Value::floating(DATA_WIDTH);
        }
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn test(&self) -> bool {
        let mut m = Shift::new(self.left);
        let cases: &[(u32, u32)] = if self.left {
            &[(0b0001, 0b0010), (0b1001, 0b0010), (0, 0)]
        } else {
            &[(0b1000, 0b0100), (0b1001, 0b0100), (0b0001, 0)]
        };
        cases
            .iter()
            .all(|&(d, q)| evaluate(&mut m, &[(Self::D, d)], Self::Q) == q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addsub_self_check() {
        assert!(AddSub::new().test());
    }

    #[test]
    fn test_shift_self_checks() {
        assert!(Shift::left().test());
        assert!(Shift::right().test());
        assert_eq!(Shift::left().kind(), ModuleKind::LeftShift);
    }

    #[test]
    fn test_addsub_floating_input() {
        let mut m = AddSub::new();
        m.ports_mut()[AddSub::B].value = Value::floating(DATA_WIDTH);
        m.propagate();
        assert!(!m.value(AddSub::Q).is_valid());
        assert!(!m.value(AddSub::C).is_valid());
    }
}
