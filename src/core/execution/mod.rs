pub mod config;
pub mod execution_order;
pub mod propagation;
pub mod simulation_engine;

// Re-export commonly used types
pub use config::{SimulationConfig, WorkOrder, DEFAULT_EVALUATION_BOUND};
pub use execution_order::{ExecutionOrder, ExecutionOrderBuilder};
pub use propagation::StepReport;
pub use simulation_engine::SimulationEngine;
