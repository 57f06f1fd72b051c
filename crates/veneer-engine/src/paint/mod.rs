//! Paint model shared by the canvas and the graphics devices.
//!
//! Colors are linear premultiplied RGBA, matching the blend state of the
//! compositing pipeline.

mod color;

pub use color::Color;
