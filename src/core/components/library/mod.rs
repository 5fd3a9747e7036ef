//! Concrete module types available on the palette.

pub mod arithmetic;
pub mod gates;
pub mod io;
pub mod routing;
pub mod sequential;

pub use arithmetic::{AddSub, Shift};
pub use gates::{Logic, Or};
pub use io::Switch;
pub use routing::{Demux, Fanout, Merger, Mux, Splitter};
pub use sequential::{Clock, Ram, Register};

use crate::core::components::traits::Module;
use crate::core::values::value::Value;

/// Drive the given inputs of a scratch module, propagate, and read `output`.
/// Used by the `test()` self checks.
pub(crate) fn evaluate(module: &mut dyn Module, inputs: &[(usize, u32)], output: usize) -> u32 {
    for &(index, bits) in inputs {
        let port = &mut module.ports_mut()[index];
        port.value = Value::new(port.width, bits);
    }
    module.propagate();
    module.ports()[output].value.bits()
}
