use crate::core::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format-agnostic fragment a module writes its persistent state into.
///
/// Whoever saves the circuit decides how the fragment is encoded; modules only
/// see named string attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataElement {
    attributes: BTreeMap<String, String>,
}

impl DataElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Read a hex-encoded number attribute
    pub fn get_hex(&self, name: &str) -> SimResult<Option<u32>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => u32::from_str_radix(raw, 16)
                .map(Some)
                .map_err(|e| SimError::InvalidData(format!("attribute '{}': {}", name, e))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_attribute() {
        let mut elem = DataElement::new();
        elem.set("value", "a");
        assert_eq!(elem.get_hex("value"), Ok(Some(10)));
        assert_eq!(elem.get_hex("missing"), Ok(None));
    }

    #[test]
    fn test_attributes_listed_in_name_order() {
        let mut elem = DataElement::new();
        assert!(elem.is_empty());
        elem.set("value", "3");
        elem.set("data", "1 2");
        assert!(!elem.is_empty());
        let listed: Vec<_> = elem.attributes().collect();
        assert_eq!(listed, vec![("data", "1 2"), ("value", "3")]);
    }

    #[test]
    fn test_bad_hex_is_reported() {
        let mut elem = DataElement::new();
        elem.set("value", "zz");
        assert!(matches!(elem.get_hex("value"), Err(SimError::InvalidData(_))));
    }
}
