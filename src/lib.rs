pub mod core;

// Re-export commonly used types
pub use crate::core::circuit::Circuit;
pub use crate::core::components::{Module, ModuleExt, ModuleKind, Port, PortClass, PortDirection};
pub use crate::core::connections::Link;
pub use crate::core::errors::{SimError, SimResult};
pub use crate::core::execution::{SimulationConfig, SimulationEngine, StepReport, WorkOrder};
pub use crate::core::types::{LinkId, ModuleId, PortRef, Position};
pub use crate::core::values::{DataElement, Value};
