//! Input events forwarded to the UI engine.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The window runtime translates platform events into `InputEvent`s.

mod types;

pub use types::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};
