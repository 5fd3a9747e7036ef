pub mod library;
pub mod port_specs;
pub mod registry;
pub mod traits;

// Re-export commonly used types
pub use port_specs::{Port, PortClass, PortDirection, DATA_WIDTH};
pub use registry::{self_test_all, ModuleKind};
pub use traits::{Module, ModuleExt};
