use crate::core::components::port_specs::PortClass;
use crate::core::types::{LinkId, ModuleId, PortRef};

/// Error types for circuit operations
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The input port already has a link attached
    AlreadyConnected(PortRef),
    /// The logical classes of the two ports cannot be linked
    TypeMismatch {
        source: PortClass,
        target: PortClass,
    },
    /// Port index out of range for a live module
    UnknownPort(PortRef),
    /// No port with this name on the module
    NoSuchPort { module: ModuleId, name: String },
    /// Module is not (or no longer) part of the circuit
    UnknownModule(ModuleId),
    /// Link is not (or no longer) part of the circuit
    UnknownLink(LinkId),
    /// Link endpoints must run from an output to an input
    WrongDirection(PortRef),
    /// Both endpoints belong to the same module
    SelfLoop(ModuleId),
    /// The module does not support the requested operation
    Unsupported(String),
    /// Persisted module data could not be decoded
    InvalidData(String),
    /// Propagation exceeded its iteration bound on the given modules
    OscillationDetected(Vec<ModuleId>),
    /// A thread panicked while holding the circuit lock
    LockPoisoned,
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::AlreadyConnected(port) => {
                write!(f, "Input port {} is already connected", port)
            }
            SimError::TypeMismatch { source, target } => {
                write!(f, "Type mismatch: cannot link {:?} output to {:?} input", source, target)
            }
            SimError::UnknownPort(port) => write!(f, "Unknown port: {}", port),
            SimError::NoSuchPort { module, name } => {
                write!(f, "Module {} has no port '{}'", module, name)
            }
            SimError::UnknownModule(id) => write!(f, "Unknown module: {}", id),
            SimError::UnknownLink(id) => write!(f, "Unknown link: {}", id),
            SimError::WrongDirection(port) => {
                write!(f, "Port {} has the wrong direction for this link end", port)
            }
            SimError::SelfLoop(id) => write!(f, "Cannot link module {} to itself", id),
            SimError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            SimError::InvalidData(msg) => write!(f, "Invalid module data: {}", msg),
            SimError::OscillationDetected(ids) => {
                write!(f, "Oscillation detected on {} module(s)", ids.len())
            }
            SimError::LockPoisoned => write!(f, "Circuit lock poisoned"),
        }
    }
}

impl std::error::Error for SimError {}

/// Result alias used throughout the engine
pub type SimResult<T> = Result<T, SimError>;
