//! Offscreen render target and the compositing mesh that blits it.

mod mesh;
mod offscreen;

pub use mesh::{CompositingMesh, QUAD_INDEX_COUNT, QUAD_INDICES, QUAD_VERTICES, QuadVertex};
pub use offscreen::{OffscreenTarget, TargetState};
