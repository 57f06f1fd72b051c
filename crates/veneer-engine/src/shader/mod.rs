//! Compositing shader program and shader source loading.

pub(crate) mod front;
mod program;
mod resources;

pub use front::{FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use program::ShaderProgram;
pub use resources::{DirResources, EmbeddedResources, ResourceError, ResourceLoader, load_or_placeholder};

/// Resource path of the bundled compositing vertex stage.
pub const COMPOSITE_VERTEX_PATH: &str = "shaders/composite.vert.wgsl";
/// Resource path of the bundled compositing fragment stage.
pub const COMPOSITE_FRAGMENT_PATH: &str = "shaders/composite.frag.wgsl";

pub const COMPOSITE_VERTEX_SOURCE: &str = include_str!("shaders/composite.vert.wgsl");
pub const COMPOSITE_FRAGMENT_SOURCE: &str = include_str!("shaders/composite.frag.wgsl");
