//! Graphics devices.
//!
//! This module is responsible for:
//! - the driver-level object model (`GraphicsHandle`, `GraphicsDevice`)
//! - the wgpu backend bound to a window surface
//! - a headless software device used for tests and offline runs

mod backend;
mod gpu;
mod handle;
mod headless;
mod init;
mod surface;

pub use backend::{
    BufferKind, DeviceError, FramebufferStatus, GraphicsDevice, ObjectCounts, ObjectKind,
    PixelRect, ShaderKind, VertexArrayDesc, VertexAttribute,
};
pub use gpu::WgpuDevice;
pub use handle::GraphicsHandle;
pub use headless::{Command, HeadlessConfig, HeadlessDevice};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;

pub(crate) use backend::{AttachmentInfo, Attachments, Bindings, attachment_status};
pub(crate) use handle::HandleTable;
