pub mod circuit;
pub mod components;
pub mod connections;
pub mod errors;
pub mod execution;
pub mod types;
pub mod values;
