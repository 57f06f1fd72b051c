//! Veneer engine crate.
//!
//! Composites an externally painted UI into a host render loop: the UI engine
//! paints into an offscreen target, which is drawn to the window as one
//! textured quad each frame.

pub mod compositor;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod schedule;
pub mod shader;
pub mod target;
pub mod time;
pub mod window;

mod error;

pub use error::{RenderError, ShaderCompileError, ShaderStage};
