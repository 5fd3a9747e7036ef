use super::evaluate;
use crate::core::components::port_specs::{Port, DATA_WIDTH};
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::values::value::Value;

const HALF_WIDTH: u8 = DATA_WIDTH / 2;

/// Two-way multiplexor: `Q = S ? B : A`
pub struct Mux {
    ports: Vec<Port>,
}

impl Mux {
    const A: usize = 0;
    const B: usize = 1;
    const S: usize = 2;
    const Q: usize = 3;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("A", Data, DATA_WIDTH), ("B", Data, DATA_WIDTH), ("S", Control, 1)],
                outputs: [("Q", Data, DATA_WIDTH)]
            ],
        }
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Mux {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Mux
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let s = self.value(Self::S);
        let q = if !s.is_valid() {
            Value::floating(DATA_WIDTH)
        } else if s.is_high() {
            self.value(Self::B)
        } else {
            self.value(Self::A)
        };
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        if input <= Self::S {
            vec![Self::Q]
        } else {
            Vec::new()
        }
    }

    fn test(&self) -> bool {
        let mut m = Mux::new();
        evaluate(&mut m, &[(Self::A, 3), (Self::B, 12), (Self::S, 0)], Self::Q) == 3
            && evaluate(&mut m, &[(Self::S, 1)], Self::Q) == 12
    }
}

/// Routes `D` to `A` or `B` depending on `S`; the other output reads zero
pub struct Demux {
    ports: Vec<Port>,
}

impl Demux {
    const D: usize = 0;
    const S: usize = 1;
    const A: usize = 2;
    const B: usize = 3;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("D", Data, DATA_WIDTH), ("S", Control, 1)],
                outputs: [("A", Data, DATA_WIDTH), ("B", Data, DATA_WIDTH)]
            ],
        }
    }
}

impl Default for Demux {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Demux {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Demux
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let (d, s) = (self.value(Self::D), self.value(Self::S));
        let (a, b) = if !s.is_valid() {
            (Value::floating(DATA_WIDTH), Value::floating(DATA_WIDTH))
        } else if s.is_high() {
            (Value::zero(DATA_WIDTH), d)
        } else {
            (d, Value::zero(DATA_WIDTH))
        };
        self.drive(Self::A, a);
        self.drive(Self::B, b);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        if input <= Self::S {
            vec![Self::A, Self::B]
        } else {
            Vec::new()
        }
    }

    fn test(&self) -> bool {
        let mut m = Demux::new();
        let routed_a = evaluate(&mut m, &[(Self::D, 9), (Self::S, 0)], Self::A) == 9
            && m.value(Self::B).bits() == 0;
        let routed_b = evaluate(&mut m, &[(Self::S, 1)], Self::B) == 9
            && m.value(Self::A).bits() == 0;
        routed_a && routed_b
    }
}

/// Copies one input onto three outputs
pub struct Fanout {
    ports: Vec<Port>,
}

impl Fanout {
    const D: usize = 0;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("D", Generic, DATA_WIDTH)],
                outputs: [
                    ("Q0", Generic, DATA_WIDTH),
                    ("Q1", Generic, DATA_WIDTH),
                    ("Q2", Generic, DATA_WIDTH),
                ]
            ],
        }
    }

    fn outputs(&self) -> std::ops::Range<usize> {
        1..self.ports.len()
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Fanout {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Fanout
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let d = self.value(Self::D);
        for out in self.outputs() {
            self.drive(out, d);
        }
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn affected(&self, input: usize) -> Vec<usize> {
        if input == Self::D {
            self.outputs().collect()
        } else {
            Vec::new()
        }
    }

    fn test(&self) -> bool {
        let mut m = Fanout::new();
        evaluate(&mut m, &[(Self::D, 6)], 1);
        m.outputs().all(|out| m.value(out) == Value::new(DATA_WIDTH, 6))
    }
}

/// Splits a data word into its high and low halves
pub struct Splitter {
    ports: Vec<Port>,
}

impl Splitter {
    const D: usize = 0;
    const H: usize = 1;
    const L: usize = 2;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("D", Data, DATA_WIDTH)],
                outputs: [("H", Data, HALF_WIDTH), ("L", Data, HALF_WIDTH)]
            ],
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Splitter {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Splitter
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let d = self.value(Self::D);
        let high = Value::new(DATA_WIDTH, d.bits() >> HALF_WIDTH);
        let (mut h, mut l) = (high.resized(HALF_WIDTH), d.resized(HALF_WIDTH));
        if !d.is_valid() {
            h = Value::floating(HALF_WIDTH);
            l = Value::floating(HALF_WIDTH);
        }
        self.drive(Self::H, h);
        self.drive(Self::L, l);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn test(&self) -> bool {
        let mut m = Splitter::new();
        evaluate(&mut m, &[(Self::D, 0b1101)], Self::H) == 0b11 && m.value(Self::L).bits() == 0b01
    }
}

/// Joins two half-width inputs into one data word
pub struct Merger {
    ports: Vec<Port>,
}

impl Merger {
    const H: usize = 0;
    const L: usize = 1;
    const Q: usize = 2;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [("H", Data, HALF_WIDTH), ("L", Data, HALF_WIDTH)],
                outputs: [("Q", Data, DATA_WIDTH)]
            ],
        }
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Merger {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Merger
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let (h, l) = (self.value(Self::H), self.value(Self::L));
        let q = if h.is_valid() && l.is_valid() {
            Value::new(DATA_WIDTH, (h.bits() << HALF_WIDTH) | l.bits())
        } else {
            Value::floating(DATA_WIDTH)
        };
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.clear_outputs();
    }

    fn test(&self) -> bool {
        let mut m = Merger::new();
        evaluate(&mut m, &[(Self::H, 0b10), (Self::L, 0b01)], Self::Q) == 0b1001
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_self_checks() {
        assert!(Mux::new().test());
        assert!(Demux::new().test());
        assert!(Fanout::new().test());
        assert!(Splitter::new().test());
        assert!(Merger::new().test());
    }

    #[test]
    fn test_fanout_affects_only_outputs() {
        assert_eq!(Fanout::new().affected(0), vec![1, 2, 3]);
        assert!(Fanout::new().affected(2).is_empty());
    }

    #[test]
    fn test_demux_floating_select() {
        let mut m = Demux::new();
        m.ports_mut()[Demux::S].value = Value::floating(1);
        m.propagate();
        assert!(!m.value(Demux::A).is_valid());
        assert!(!m.value(Demux::B).is_valid());
    }
}
