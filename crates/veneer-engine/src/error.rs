use std::fmt;

use crate::device::{DeviceError, FramebufferStatus, GraphicsHandle};

/// Stage at which building the compositing program failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(name)
    }
}

/// Compile or link failure, carrying the driver log.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{stage} stage failed:\n{log}")]
pub struct ShaderCompileError {
    pub stage: ShaderStage,
    /// Driver log; never empty.
    pub log: String,
}

impl ShaderCompileError {
    pub(crate) fn new(stage: ShaderStage, log: String) -> Self {
        let log = if log.trim().is_empty() {
            "driver returned an empty log".to_string()
        } else {
            log
        };
        Self { stage, log }
    }
}

/// Errors surfaced by the compositor.
///
/// Everything except [`RenderError::InvalidDimensions`] leaves the GPU
/// pipeline in a state that cannot produce defined output; callers are
/// expected to tear down and exit.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader program failed to build: {0}")]
    ShaderCompile(#[from] ShaderCompileError),

    #[error("offscreen framebuffer {framebuffer} is incomplete: {status}")]
    IncompleteFramebuffer {
        framebuffer: GraphicsHandle,
        status: FramebufferStatus,
    },

    #[error("`{operation}` requires a ready render target")]
    TargetNotReady { operation: &'static str },

    #[error("render target size must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("shader program used before it was compiled")]
    ProgramNotCompiled,

    #[error("compositing mesh used before it was created")]
    MeshNotCreated,

    #[error("render loop has been shut down")]
    ShutDown,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl RenderError {
    /// Whether the error is a caller mistake detected before touching the driver.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RenderError::TargetNotReady { .. }
                | RenderError::InvalidDimensions { .. }
                | RenderError::ProgramNotCompiled
                | RenderError::MeshNotCreated
                | RenderError::ShutDown
        )
    }
}
