use super::evaluate;
use crate::core::components::port_specs::{Port, PortClass, DATA_WIDTH};
use crate::core::components::registry::ModuleKind;
use crate::core::components::traits::{Module, ModuleExt};
use crate::core::errors::{SimError, SimResult};
use crate::core::values::data_element::DataElement;
use crate::core::values::value::Value;

/// Edge-triggered register. On a tick it latches `D` if `E` is high;
/// `E` pulls high when unconnected.
pub struct Register {
    ports: Vec<Port>,
    state: Value,
    pending: Option<Value>,
}

impl Register {
    const D: usize = 0;
    const E: usize = 1;
    const Q: usize = 2;

    pub fn new() -> Self {
        Self {
            ports: vec![
                Port::input("D", PortClass::Data, DATA_WIDTH),
                Port::input("E", PortClass::Control, 1).with_pull(1),
                Port::output("Q", PortClass::Data, DATA_WIDTH),
            ],
            state: Value::zero(DATA_WIDTH),
            pending: None,
        }
    }

    /// Latched value
    pub fn state(&self) -> Value {
        self.state
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Register {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Register
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        self.drive(Self::Q, self.state);
    }

    fn reset(&mut self) {
        self.state = Value::zero(DATA_WIDTH);
        self.pending = None;
        self.clear_outputs();
    }

    // Q only moves on a tick.
    fn affected(&self, _input: usize) -> Vec<usize> {
        Vec::new()
    }

    fn is_clocked(&self) -> bool {
        true
    }

    fn prepare_tick(&mut self) {
        self.pending = if self.value(Self::E).is_high() {
            Some(self.value(Self::D).resized(DATA_WIDTH))
        } else {
            None
        };
    }

    fn commit_tick(&mut self) {
        if let Some(next) = self.pending.take() {
            self.state = next;
        }
    }

    fn test(&self) -> bool {
        let mut m = Register::new();
        evaluate(&mut m, &[(Self::D, 5), (Self::E, 1)], Self::Q);
        if m.value(Self::Q).bits() != 0 {
            return false;
        }
        m.prepare_tick();
        m.commit_tick();
        let latched = evaluate(&mut m, &[], Self::Q) == 5;

        evaluate(&mut m, &[(Self::D, 3), (Self::E, 0)], Self::Q);
        m.prepare_tick();
        m.commit_tick();
        latched && evaluate(&mut m, &[], Self::Q) == 5
    }
}

/// Square-wave source advanced one edge per tick, starting low
pub struct Clock {
    ports: Vec<Port>,
    level: bool,
    pending: bool,
}

impl Clock {
    const Q: usize = 0;

    pub fn new() -> Self {
        Self {
            ports: crate::ports![
                inputs: [],
                outputs: [("Q", Clock, 1)]
            ],
            level: false,
            pending: false,
        }
    }

    pub fn level(&self) -> bool {
        self.level
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Clock {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Clock
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        self.drive(Self::Q, Value::from_bool(self.level));
    }

    fn reset(&mut self) {
        self.level = false;
        self.pending = false;
        self.clear_outputs();
    }

    fn is_clocked(&self) -> bool {
        true
    }

    fn prepare_tick(&mut self) {
        self.pending = !self.level;
    }

    fn commit_tick(&mut self) {
        self.level = self.pending;
    }

    fn test(&self) -> bool {
        let mut m = Clock::new();
        let mut levels = Vec::new();
        for _ in 0..4 {
            m.prepare_tick();
            m.commit_tick();
            levels.push(evaluate(&mut m, &[], Self::Q));
        }
        levels == [1, 0, 1, 0]
    }
}

/// Sixteen-word memory. `Q` reads the word at `A` combinationally; on a
/// tick with `W` high the word at `A` is replaced by `D`.
///
/// Contents are user data: they survive `reset` and are persisted through
/// `data_out`.
pub struct Ram {
    ports: Vec<Port>,
    memory: Vec<u32>,
    pending: Option<(usize, u32)>,
}

impl Ram {
    const A: usize = 0;
    const D: usize = 1;
    const W: usize = 2;
    const Q: usize = 3;

    pub const WORDS: usize = 1 << DATA_WIDTH;

    pub fn new() -> Self {
        Self {
            ports: vec![
                Port::input("A", PortClass::Data, DATA_WIDTH),
                Port::input("D", PortClass::Data, DATA_WIDTH),
                Port::input("W", PortClass::Control, 1),
                Port::output("Q", PortClass::Data, DATA_WIDTH),
            ],
            memory: vec![0; Self::WORDS],
            pending: None,
        }
    }

    pub fn word(&self, address: usize) -> Option<u32> {
        self.memory.get(address).copied()
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Ram {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Ram
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    fn propagate(&mut self) {
        let address = self.value(Self::A);
        let q = if address.is_valid() {
            Value::new(DATA_WIDTH, self.memory[address.bits() as usize % Self::WORDS])
        } else {
            Value::floating(DATA_WIDTH)
        };
        self.drive(Self::Q, q);
    }

    fn reset(&mut self) {
        self.pending = None;
        self.clear_outputs();
    }

    // Writes only land on a tick, so D and W never move Q directly.
    fn affected(&self, input: usize) -> Vec<usize> {
        if input == Self::A {
            vec![Self::Q]
        } else {
            Vec::new()
        }
    }

    fn is_clocked(&self) -> bool {
        true
    }

    fn prepare_tick(&mut self) {
        let (address, data) = (self.value(Self::A), self.value(Self::D));
        self.pending = if self.value(Self::W).is_high() && address.is_valid() && data.is_valid() {
            Some((address.bits() as usize % Self::WORDS, data.bits()))
        } else {
            None
        };
    }

    fn commit_tick(&mut self) {
        if let Some((address, data)) = self.pending.take() {
            self.memory[address] = data;
        }
    }

    fn data_in(&mut self, data: &DataElement) -> SimResult<()> {
        let Some(raw) = data.get("data") else {
            return Ok(());
        };
        let words = raw
            .split_whitespace()
            .map(|w| u32::from_str_radix(w, 16))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SimError::InvalidData(format!("ram data: {}", e)))?;
        if words.len() > Self::WORDS {
            return Err(SimError::InvalidData(format!(
                "ram holds {} words, got {}",
                Self::WORDS,
                words.len()
            )));
        }
        let max = Value::zero(DATA_WIDTH).max();
        if let Some(word) = words.iter().find(|&&w| w > max) {
            return Err(SimError::InvalidData(format!(
                "ram word {:x} does not fit in {} bits",
                word, DATA_WIDTH
            )));
        }
        self.memory = vec![0; Self::WORDS];
        for (slot, word) in self.memory.iter_mut().zip(words) {
            *slot = word;
        }
        Ok(())
    }

    fn data_out(&self, data: &mut DataElement) -> bool {
        if self.memory.iter().all(|&w| w == 0) {
            return false;
        }
        let encoded: Vec<String> = self.memory.iter().map(|w| format!("{:x}", w)).collect();
        data.set("data", encoded.join(" "));
        true
    }

    fn test(&self) -> bool {
        let mut m = Ram::new();
        evaluate(&mut m, &[(Self::A, 7), (Self::D, 12), (Self::W, 1)], Self::Q);
        m.prepare_tick();
        m.commit_tick();
        let written = evaluate(&mut m, &[(Self::W, 0)], Self::Q) == 12;
        let other = evaluate(&mut m, &[(Self::A, 6)], Self::Q) == 0;
        written && other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_self_checks() {
        assert!(Register::new().test());
        assert!(Clock::new().test());
        assert!(Ram::new().test());
    }

    #[test]
    fn test_register_reset_clears_state() {
        let mut r = Register::new();
        evaluate(&mut r, &[(Register::D, 9)], Register::Q);
        r.prepare_tick();
        r.commit_tick();
        assert_eq!(r.state(), Value::new(DATA_WIDTH, 9));
        r.reset();
        assert_eq!(r.state(), Value::zero(DATA_WIDTH));
        assert_eq!(r.value(Register::Q), Value::zero(DATA_WIDTH));
    }

    #[test]
    fn test_clock_commit_uses_state_from_prepare() {
        let mut c = Clock::new();
        c.prepare_tick();
        c.prepare_tick();
        c.commit_tick();
        assert!(c.level());
    }

    #[test]
    fn test_ram_data_round_trip_and_reset_keeps_contents() {
        let mut ram = Ram::new();
        let mut elem = DataElement::new();
        assert!(!ram.data_out(&mut elem));

        elem.set("data", "1 2 f");
        ram.data_in(&elem).unwrap();
        assert_eq!(ram.word(2), Some(15));
        ram.reset();
        assert_eq!(ram.word(1), Some(2));

        let mut out = DataElement::new();
        assert!(ram.data_out(&mut out));
        assert!(out.get("data").unwrap().starts_with("1 2 f 0"));
    }

    #[test]
    fn test_ram_rejects_bad_data() {
        let mut ram = Ram::new();
        let mut elem = DataElement::new();
        elem.set("data", "1 q");
        assert!(matches!(ram.data_in(&elem), Err(SimError::InvalidData(_))));
        assert_eq!(ram.word(0), Some(0));
    }

    #[test]
    fn test_ram_rejects_words_wider_than_data() {
        let mut ram = Ram::new();
        let mut elem = DataElement::new();
        elem.set("data", "3");
        ram.data_in(&elem).unwrap();

        elem.set("data", "1 f0");
        assert!(matches!(ram.data_in(&elem), Err(SimError::InvalidData(_))));
        // A rejected load leaves the previous contents alone
        assert_eq!(ram.word(0), Some(3));
        assert_eq!(ram.word(1), Some(0));
    }
}
