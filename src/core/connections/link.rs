use crate::core::types::{LinkId, PortRef};

/// Directed wire from one output port to one input port.
///
/// A link carries no simulation state; values live on the ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub source: PortRef,
    pub target: PortRef,
}

impl Link {
    pub(crate) fn new(source: PortRef, target: PortRef) -> Self {
        Self {
            id: LinkId::new(),
            source,
            target,
        }
    }

    /// Whether either end sits on a port of `module`
    pub fn touches(&self, module: &crate::core::types::ModuleId) -> bool {
        &self.source.module == module || &self.target.module == module
    }
}
