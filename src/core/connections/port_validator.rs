use crate::core::components::port_specs::Port;
use crate::core::components::traits::Module;
use crate::core::errors::{SimError, SimResult};
use crate::core::types::PortRef;

/// Port validation utilities for links
pub struct PortValidator;

impl PortValidator {
    /// Validate that `port` names an output on `module`
    pub fn validate_source_port(module: &dyn Module, port: PortRef) -> SimResult<&Port> {
        let spec = module.ports().get(port.index).ok_or(SimError::UnknownPort(port))?;
        if !spec.is_output() {
            return Err(SimError::WrongDirection(port));
        }
        Ok(spec)
    }

    /// Validate that `port` names an input on `module`
    pub fn validate_target_port(module: &dyn Module, port: PortRef) -> SimResult<&Port> {
        let spec = module.ports().get(port.index).ok_or(SimError::UnknownPort(port))?;
        if !spec.is_input() {
            return Err(SimError::WrongDirection(port));
        }
        Ok(spec)
    }

    /// Validate a complete link. Checks run in a fixed order so the same bad
    /// request always reports the same error.
    pub fn validate_link(
        source_module: &dyn Module,
        source: PortRef,
        target_module: &dyn Module,
        target: PortRef,
    ) -> SimResult<()> {
        let source_port = Self::validate_source_port(source_module, source)?;
        let target_port = Self::validate_target_port(target_module, target)?;

        if source.module == target.module {
            return Err(SimError::SelfLoop(source.module));
        }

        // Multiple drivers not allowed
        if target_port.is_connected() {
            return Err(SimError::AlreadyConnected(target));
        }

        if !target_module.accepts(target.index, source_port.class) {
            return Err(SimError::TypeMismatch {
                source: source_port.class,
                target: target_port.class,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::registry::ModuleKind;
    use crate::core::types::{LinkId, ModuleId};

    #[test]
    fn test_valid_link() {
        let (sw, reg) = (ModuleKind::Switch.instantiate(), ModuleKind::Register.instantiate());
        let (a, b) = (ModuleId::new(), ModuleId::new());
        assert!(
            PortValidator::validate_link(sw.as_ref(), a.port(0), reg.as_ref(), b.port(0)).is_ok()
        );
    }

    #[test]
    fn test_direction_and_range() {
        let or = ModuleKind::Or.instantiate();
        let (a, b) = (ModuleId::new(), ModuleId::new());
        // Input used as a source
        assert_eq!(
            PortValidator::validate_link(or.as_ref(), a.port(0), or.as_ref(), b.port(1)),
            Err(SimError::WrongDirection(a.port(0)))
        );
        assert_eq!(
            PortValidator::validate_link(or.as_ref(), a.port(2), or.as_ref(), b.port(9)),
            Err(SimError::UnknownPort(b.port(9)))
        );
    }

    #[test]
    fn test_self_loop_rejected() {
        let or = ModuleKind::Or.instantiate();
        let a = ModuleId::new();
        assert_eq!(
            PortValidator::validate_link(or.as_ref(), a.port(2), or.as_ref(), a.port(0)),
            Err(SimError::SelfLoop(a))
        );
    }

    #[test]
    fn test_clock_into_data_is_mismatch() {
        let (clock, reg) = (ModuleKind::Clock.instantiate(), ModuleKind::Register.instantiate());
        let (a, b) = (ModuleId::new(), ModuleId::new());
        assert!(matches!(
            PortValidator::validate_link(clock.as_ref(), a.port(0), reg.as_ref(), b.port(0)),
            Err(SimError::TypeMismatch { .. })
        ));
        // Clock may drive the register's enable
        let (clock, reg) = (clock.as_ref(), reg.as_ref());
        assert!(PortValidator::validate_link(clock, a.port(0), reg, b.port(1)).is_ok());
    }

    #[test]
    fn test_connected_input_rejected() {
        let sw = ModuleKind::Switch.instantiate();
        let mut or = ModuleKind::Or.instantiate();
        or.ports_mut()[0].links.push(LinkId::new());
        let (a, b) = (ModuleId::new(), ModuleId::new());
        assert_eq!(
            PortValidator::validate_link(sw.as_ref(), a.port(0), or.as_ref(), b.port(0)),
            Err(SimError::AlreadyConnected(b.port(0)))
        );
    }
}
