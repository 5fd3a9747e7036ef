use crate::core::components::library::{
    AddSub, Clock, Demux, Fanout, Logic, Merger, Mux, Or, Ram, Register, Shift, Splitter, Switch,
};
use crate::core::components::traits::Module;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Every module type that can be placed in a circuit.
///
/// Variant names are persisted by save files and must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    AddSub,
    Clock,
    Demux,
    Fanout,
    Logic,
    Mux,
    Or,
    Ram,
    Register,
    LeftShift,
    RightShift,
    Splitter,
    Merger,
    Switch,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 14] = [
        ModuleKind::AddSub,
        ModuleKind::Clock,
        ModuleKind::Demux,
        ModuleKind::Fanout,
        ModuleKind::Logic,
        ModuleKind::Mux,
        ModuleKind::Or,
        ModuleKind::Ram,
        ModuleKind::Register,
        ModuleKind::LeftShift,
        ModuleKind::RightShift,
        ModuleKind::Splitter,
        ModuleKind::Merger,
        ModuleKind::Switch,
    ];

    /// Create a fresh module of this kind
    pub fn instantiate(&self) -> Box<dyn Module> {
        match self {
            ModuleKind::AddSub => Box::new(AddSub::new()),
            ModuleKind::Clock => Box::new(Clock::new()),
            ModuleKind::Demux => Box::new(Demux::new()),
            ModuleKind::Fanout => Box::new(Fanout::new()),
            ModuleKind::Logic => Box::new(Logic::new()),
            ModuleKind::Mux => Box::new(Mux::new()),
            ModuleKind::Or => Box::new(Or::new()),
            ModuleKind::Ram => Box::new(Ram::new()),
            ModuleKind::Register => Box::new(Register::new()),
            ModuleKind::LeftShift => Box::new(Shift::left()),
            ModuleKind::RightShift => Box::new(Shift::right()),
            ModuleKind::Splitter => Box::new(Splitter::new()),
            ModuleKind::Merger => Box::new(Merger::new()),
            ModuleKind::Switch => Box::new(Switch::new()),
        }
    }

    /// Human-readable palette name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleKind::AddSub => "Arithmetic Unit",
            ModuleKind::Clock => "Clock",
            ModuleKind::Demux => "Demultiplexor",
            ModuleKind::Fanout => "Fanout",
            ModuleKind::Logic => "Logic Unit",
            ModuleKind::Mux => "Multiplexor",
            ModuleKind::Or => "OR",
            ModuleKind::Ram => "RAM",
            ModuleKind::Register => "Register",
            ModuleKind::LeftShift => "Left-shift",
            ModuleKind::RightShift => "Right-shift",
            ModuleKind::Splitter => "Splitter",
            ModuleKind::Merger => "Merger",
            ModuleKind::Switch => "Switch Input",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Run every module type's self check in parallel.
///
/// Returns the kinds whose check failed; empty means the whole palette passed.
pub fn self_test_all() -> Vec<ModuleKind> {
    let mut failed: Vec<ModuleKind> = ModuleKind::ALL[..]
        .par_iter()
        .filter(|kind| !kind.instantiate().test())
        .copied()
        .collect();
    failed.sort_by_key(|kind| ModuleKind::ALL.iter().position(|k| k == kind));
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_reports_own_kind() {
        for kind in ModuleKind::ALL {
            assert_eq!(kind.instantiate().kind(), kind);
        }
    }

    #[test]
    fn test_all_kinds_pass_self_check() {
        assert_eq!(self_test_all(), Vec::<ModuleKind>::new());
    }

    #[test]
    fn test_ports_are_inputs_then_outputs() {
        for kind in ModuleKind::ALL {
            let module = kind.instantiate();
            let first_output = module
                .ports()
                .iter()
                .position(|p| p.is_output())
                .expect("every module has an output");
            assert!(
                module.ports()[first_output..].iter().all(|p| p.is_output()),
                "{} mixes inputs after outputs",
                kind
            );
        }
    }
}
