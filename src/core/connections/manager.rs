use crate::core::connections::link::Link;
use crate::core::errors::{SimError, SimResult};
use crate::core::types::{LinkId, ModuleId};
use std::collections::HashMap;

/// Owns every link in a circuit.
///
/// Ports keep the ids of their attached links; the manager maps those ids
/// back to endpoints.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    links: HashMap<LinkId, Link>,
    /// Creation order, for deterministic listing
    order: Vec<LinkId>,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link
    pub fn add_link(&mut self, link: Link) -> LinkId {
        let id = link.id;
        self.order.push(id);
        self.links.insert(id, link);
        id
    }

    /// Forget a link, returning its endpoints
    pub fn remove_link(&mut self, id: &LinkId) -> SimResult<Link> {
        let link = self.links.remove(id).ok_or(SimError::UnknownLink(*id))?;
        self.order.retain(|l| l != id);
        Ok(link)
    }

    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.order.iter().filter_map(|id| self.links.get(id))
    }

    /// Links with an endpoint on `module`
    pub fn links_touching(&self, module: &ModuleId) -> Vec<LinkId> {
        self.links()
            .filter(|link| link.touches(module))
            .map(|link| link.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Get connection statistics
    pub fn stats(&self) -> ConnectionStats {
        let mut fan_out: HashMap<_, usize> = HashMap::new();
        for link in self.links.values() {
            *fan_out.entry(link.source).or_default() += 1;
        }
        ConnectionStats {
            links: self.links.len(),
            driven_outputs: fan_out.len(),
            max_fan_out: fan_out.values().copied().max().unwrap_or(0),
        }
    }
}

/// Connection statistics for debugging
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionStats {
    pub links: usize,
    pub driven_outputs: usize,
    pub max_fan_out: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PortRef;

    #[test]
    fn test_add_and_remove() {
        let (a, b) = (ModuleId::new(), ModuleId::new());
        let mut manager = ConnectionManager::new();
        let id = manager.add_link(Link::new(PortRef::new(a, 1), PortRef::new(b, 0)));

        assert_eq!(manager.links_touching(&a), vec![id]);
        assert_eq!(manager.links_touching(&b), vec![id]);
        assert!(manager.remove_link(&id).is_ok());
        assert!(manager.is_empty());
        assert_eq!(manager.remove_link(&id), Err(SimError::UnknownLink(id)));
    }

    #[test]
    fn test_stats_count_fan_out() {
        let (a, b, c) = (ModuleId::new(), ModuleId::new(), ModuleId::new());
        let mut manager = ConnectionManager::new();
        manager.add_link(Link::new(PortRef::new(a, 2), PortRef::new(b, 0)));
        manager.add_link(Link::new(PortRef::new(a, 2), PortRef::new(c, 0)));
        manager.add_link(Link::new(PortRef::new(b, 1), PortRef::new(c, 1)));

        assert_eq!(
            manager.stats(),
            ConnectionStats {
                links: 3,
                driven_outputs: 2,
                max_fan_out: 2,
            }
        );
    }
}
