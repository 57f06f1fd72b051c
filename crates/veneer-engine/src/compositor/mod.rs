//! Render orchestration: the offscreen canvas, the UI engine contract and
//! the per-frame compositing protocol.

mod canvas;
mod engine;
mod event;
mod frame;
mod orchestrator;

pub use canvas::{Canvas, CanvasSurface};
pub use engine::{EngineHooks, UiEngine};
pub use event::{AppControl, EventKind, HostEvent};
pub use frame::FrameState;
pub use orchestrator::{Compositor, CompositorConfig};
