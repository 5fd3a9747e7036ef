use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a module placed in a circuit.
///
/// Identifiers are random and never reused, so a reference kept after the
/// module was removed can always be told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(Uuid);

impl ModuleId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a handle for the port at `index` on this module
    pub fn port(&self, index: usize) -> PortRef {
        PortRef {
            module: *self,
            index,
        }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M-{}", &self.0.simple().to_string()[..8])
    }
}

/// Identifier of a link between two ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(Uuid);

impl LinkId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L-{}", &self.0.simple().to_string()[..8])
    }
}

/// Handle for a port: the owning module plus the port's position in the
/// module's ordered port list (inputs first, then outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub module: ModuleId,
    pub index: usize,
}

impl PortRef {
    pub fn new(module: ModuleId, index: usize) -> Self {
        Self { module, index }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.module, self.index)
    }
}

/// Canvas position of a module. The engine stores it for collaborators and
/// never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
