use std::fmt;

use crate::paint::Color;

use super::GraphicsHandle;

/// Failure reported by a graphics device while executing a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// A command referenced a handle that is not a live object of the expected kind.
    #[error("{kind} {handle} is not a live object")]
    InvalidHandle {
        kind: ObjectKind,
        handle: GraphicsHandle,
    },

    /// A command needed binding state that was not set up.
    #[error("invalid binding state: {0}")]
    InvalidState(String),

    /// The presentation surface can no longer be used (commonly out of memory).
    #[error("presentation surface failed: {0}")]
    SurfaceLost(String),

    /// The backend reported a failure outside of the command stream.
    #[error("graphics backend failure: {0}")]
    Backend(String),
}

/// Kind of driver object, used for diagnostics and object accounting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    Framebuffer,
    Texture,
    Renderbuffer,
    Buffer,
    VertexArray,
    Shader,
    Program,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Framebuffer => "framebuffer",
            ObjectKind::Texture => "texture",
            ObjectKind::Renderbuffer => "renderbuffer",
            ObjectKind::Buffer => "buffer",
            ObjectKind::VertexArray => "vertex array",
            ObjectKind::Shader => "shader",
            ObjectKind::Program => "program",
        };
        f.write_str(name)
    }
}

/// Result of a framebuffer completeness check.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramebufferStatus {
    Complete,
    /// No live texture is attached as the color attachment.
    MissingColorAttachment,
    /// No live renderbuffer is attached as the depth/stencil attachment.
    MissingDepthStencilAttachment,
    /// Color and depth/stencil attachments differ in size.
    MismatchedDimensions,
    /// Attachment size exceeds what the device supports.
    UnsupportedDimensions,
    /// The handle is not a live framebuffer.
    InvalidFramebuffer,
}

impl FramebufferStatus {
    #[inline]
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FramebufferStatus::Complete => "complete",
            FramebufferStatus::MissingColorAttachment => "missing color attachment",
            FramebufferStatus::MissingDepthStencilAttachment => "missing depth/stencil attachment",
            FramebufferStatus::MismatchedDimensions => "attachment dimensions differ",
            FramebufferStatus::UnsupportedDimensions => "unsupported attachment dimensions",
            FramebufferStatus::InvalidFramebuffer => "not a framebuffer",
        };
        f.write_str(text)
    }
}

/// Size and support of one framebuffer attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct AttachmentInfo {
    pub width: u32,
    pub height: u32,
    pub supported: bool,
}

/// Completeness rules shared by every device.
///
/// `None` means the attachment point is empty or refers to a deleted object.
pub(crate) fn attachment_status(
    color: Option<AttachmentInfo>,
    depth_stencil: Option<AttachmentInfo>,
) -> FramebufferStatus {
    let Some(color) = color else {
        return FramebufferStatus::MissingColorAttachment;
    };
    let Some(depth_stencil) = depth_stencil else {
        return FramebufferStatus::MissingDepthStencilAttachment;
    };
    if !color.supported || !depth_stencil.supported {
        return FramebufferStatus::UnsupportedDimensions;
    }
    if (color.width, color.height) != (depth_stencil.width, depth_stencil.height) {
        return FramebufferStatus::MismatchedDimensions;
    }
    FramebufferStatus::Complete
}

/// Attachment points of a framebuffer object.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub(crate) struct Attachments {
    pub color: GraphicsHandle,
    pub depth_stencil: GraphicsHandle,
}

/// Current bind points of a device.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub(crate) struct Bindings {
    pub framebuffer: GraphicsHandle,
    pub program: GraphicsHandle,
    pub vertex_array: GraphicsHandle,
    pub texture: GraphicsHandle,
}

/// Shader stage accepted by [`GraphicsDevice::compile_shader`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

/// Usage of a buffer object.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Vertex,
    /// 32-bit unsigned indices.
    Index,
}

/// One `f32` vector attribute inside an interleaved vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of `f32` components (1..=4).
    pub components: u32,
    /// Byte offset inside one vertex.
    pub offset: u32,
}

/// Layout bound into a vertex array object.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexArrayDesc {
    pub vertex_buffer: GraphicsHandle,
    pub index_buffer: GraphicsHandle,
    /// Bytes between consecutive vertices.
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Rectangle in physical pixels, top-left origin.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Clips the rectangle to a `width` x `height` surface.
    ///
    /// Returns `None` when nothing remains.
    pub fn clipped_to(self, width: u32, height: u32) -> Option<Self> {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Live driver objects per kind.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ObjectCounts {
    pub framebuffers: usize,
    pub textures: usize,
    pub renderbuffers: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub shaders: usize,
    pub programs: usize,
}

impl ObjectCounts {
    pub fn total(&self) -> usize {
        self.framebuffers
            + self.textures
            + self.renderbuffers
            + self.buffers
            + self.vertex_arrays
            + self.shaders
            + self.programs
    }
}

/// Driver-level object and command API used by the compositor.
///
/// The model is a single current context with bind points: a framebuffer
/// (`NONE` = on-screen), a program, a vertex array, and one sampled texture.
/// Commands act on whatever is bound. All calls must come from the thread
/// that owns the device.
///
/// Deleting `GraphicsHandle::NONE` is a no-op. Deleting a handle that is not
/// live is logged and otherwise ignored.
pub trait GraphicsDevice {
    /// Creates an RGBA8 color texture with linear filtering and clamp-to-edge wrapping.
    fn create_texture(&mut self, width: u32, height: u32) -> GraphicsHandle;

    /// Creates a combined 24-bit depth / 8-bit stencil renderbuffer.
    fn create_renderbuffer(&mut self, width: u32, height: u32) -> GraphicsHandle;

    /// Creates a framebuffer with no attachments.
    fn create_framebuffer(&mut self) -> GraphicsHandle;

    fn attach_color(&mut self, framebuffer: GraphicsHandle, texture: GraphicsHandle);

    fn attach_depth_stencil(&mut self, framebuffer: GraphicsHandle, renderbuffer: GraphicsHandle);

    fn framebuffer_status(&self, framebuffer: GraphicsHandle) -> FramebufferStatus;

    fn delete_texture(&mut self, texture: GraphicsHandle);

    fn delete_renderbuffer(&mut self, renderbuffer: GraphicsHandle);

    fn delete_framebuffer(&mut self, framebuffer: GraphicsHandle);

    /// Creates an immutable buffer initialised with `contents`.
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> GraphicsHandle;

    fn create_vertex_array(&mut self, desc: VertexArrayDesc) -> GraphicsHandle;

    fn delete_buffer(&mut self, buffer: GraphicsHandle);

    fn delete_vertex_array(&mut self, vertex_array: GraphicsHandle);

    /// Compiles one WGSL stage. On failure no object is created and the
    /// compiler log is returned.
    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<GraphicsHandle, String>;

    /// Links a vertex and a fragment shader. On failure no object is created
    /// and the linker log is returned. The shaders stay alive either way.
    fn link_program(
        &mut self,
        vertex: GraphicsHandle,
        fragment: GraphicsHandle,
    ) -> Result<GraphicsHandle, String>;

    fn delete_shader(&mut self, shader: GraphicsHandle);

    fn delete_program(&mut self, program: GraphicsHandle);

    fn bind_framebuffer(&mut self, framebuffer: GraphicsHandle);

    fn use_program(&mut self, program: GraphicsHandle);

    fn bind_vertex_array(&mut self, vertex_array: GraphicsHandle);

    /// Binds `texture` to the single sampled texture unit.
    fn bind_texture(&mut self, texture: GraphicsHandle);

    /// Clears color to `color`, depth to 1.0 and stencil to 0 on the bound framebuffer.
    fn clear(&mut self, color: Color) -> Result<(), DeviceError>;

    /// Overwrites a rectangle of the bound offscreen color attachment.
    fn fill_rect(&mut self, rect: PixelRect, color: Color) -> Result<(), DeviceError>;

    /// Draws `index_count` indices as a triangle list with the bound program,
    /// vertex array and texture.
    fn draw_elements(&mut self, index_count: u32) -> Result<(), DeviceError>;

    /// Submits recorded commands without waiting for them.
    fn flush(&mut self) -> Result<(), DeviceError>;

    /// Submits recorded commands and blocks until the device is idle.
    fn finish(&mut self) -> Result<(), DeviceError>;

    /// Resizes the on-screen framebuffer to follow the window.
    ///
    /// Zero sizes are remembered but do not reconfigure anything.
    fn resize_screen(&mut self, width: u32, height: u32);

    /// Hands the on-screen framebuffer to the window system.
    fn present(&mut self) -> Result<(), DeviceError>;

    fn object_counts(&self) -> ObjectCounts;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_inside_is_identity() {
        let r = PixelRect::new(2, 3, 4, 5);
        assert_eq!(r.clipped_to(100, 100), Some(r));
    }

    #[test]
    fn clip_trims_overhang() {
        let r = PixelRect::new(8, 8, 10, 10);
        assert_eq!(r.clipped_to(10, 12), Some(PixelRect::new(8, 8, 2, 4)));
    }

    #[test]
    fn clip_outside_is_none() {
        assert_eq!(PixelRect::new(20, 0, 5, 5).clipped_to(10, 10), None);
        assert_eq!(PixelRect::new(0, 0, 0, 5).clipped_to(10, 10), None);
    }

    fn info(width: u32, height: u32) -> Option<AttachmentInfo> {
        Some(AttachmentInfo { width, height, supported: true })
    }

    #[test]
    fn status_requires_both_attachments() {
        assert_eq!(attachment_status(None, info(4, 4)), FramebufferStatus::MissingColorAttachment);
        assert_eq!(
            attachment_status(info(4, 4), None),
            FramebufferStatus::MissingDepthStencilAttachment
        );
        assert_eq!(attachment_status(info(4, 4), info(4, 4)), FramebufferStatus::Complete);
    }

    #[test]
    fn status_rejects_mismatched_or_unsupported_sizes() {
        assert_eq!(
            attachment_status(info(4, 4), info(4, 5)),
            FramebufferStatus::MismatchedDimensions
        );
        let too_big = Some(AttachmentInfo { width: 1 << 20, height: 4, supported: false });
        assert_eq!(
            attachment_status(too_big, info(4, 4)),
            FramebufferStatus::UnsupportedDimensions
        );
    }

    #[test]
    fn total_sums_every_kind() {
        let counts = ObjectCounts {
            framebuffers: 1,
            textures: 1,
            renderbuffers: 1,
            buffers: 2,
            vertex_arrays: 1,
            shaders: 0,
            programs: 1,
        };
        assert_eq!(counts.total(), 7);
    }
}
