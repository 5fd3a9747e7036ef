pub mod link;
pub mod manager;
pub mod port_validator;

pub use link::Link;
pub use manager::{ConnectionManager, ConnectionStats};
pub use port_validator::PortValidator;
