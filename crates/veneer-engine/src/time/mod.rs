//! Frame timing.
//!
//! One `FrameClock` per render loop; `tick()` once per executed render.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
