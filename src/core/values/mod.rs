pub mod data_element;
pub mod value;

// Re-export all public types
pub use data_element::DataElement;
pub use value::{Value, MAX_WIDTH};
