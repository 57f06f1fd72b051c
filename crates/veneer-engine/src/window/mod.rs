//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the compositor.

mod runtime;
mod translate;

pub use runtime::{Runtime, RuntimeConfig};
pub use translate::InputTranslator;
