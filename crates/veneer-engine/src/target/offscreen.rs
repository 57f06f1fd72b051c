use crate::device::{GraphicsDevice, GraphicsHandle};
use crate::error::RenderError;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetState {
    /// All handles are zero.
    Uninitialized,
    /// All handles are live and the framebuffer is complete.
    Ready,
}

/// Offscreen framebuffer the UI canvas paints into.
///
/// Owns the framebuffer, its RGBA color texture and its depth/stencil
/// renderbuffer. The handles are either all zero or all live; a failed
/// allocation releases everything before reporting.
///
/// Resizing keeps the framebuffer object and swaps both attachments.
#[derive(Debug, Default)]
pub struct OffscreenTarget {
    framebuffer: GraphicsHandle,
    color_texture: GraphicsHandle,
    depth_stencil: GraphicsHandle,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the framebuffer and both attachments, then checks completeness.
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        check_dimensions(width, height)?;
        if self.state() == TargetState::Ready {
            log::warn!("offscreen target created twice; releasing the previous one");
            self.destroy(device);
        }

        self.framebuffer = device.create_framebuffer();
        self.attach(device, width, height)?;
        log::debug!(
            "offscreen target {} created at {width}x{height}",
            self.framebuffer
        );
        Ok(())
    }

    /// Replaces both attachments with ones of the new size.
    ///
    /// Requesting the current size is a no-op.
    pub fn resize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if self.state() != TargetState::Ready {
            return Err(RenderError::TargetNotReady { operation: "resize" });
        }
        check_dimensions(width, height)?;
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }

        self.release_attachments(device);
        self.attach(device, width, height)?;
        log::debug!(
            "offscreen target {} resized to {width}x{height}",
            self.framebuffer
        );
        Ok(())
    }

    /// Releases every handle. Safe to call any number of times.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.release_attachments(device);
        let framebuffer = GraphicsHandle::take(&mut self.framebuffer);
        if framebuffer.is_allocated() {
            device.delete_framebuffer(framebuffer);
        }
        self.width = 0;
        self.height = 0;
    }

    /// Makes the target the destination of subsequent commands.
    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<(), RenderError> {
        if self.state() != TargetState::Ready {
            return Err(RenderError::TargetNotReady { operation: "bind" });
        }
        device.bind_framebuffer(self.framebuffer);
        Ok(())
    }

    /// Color texture for sampling. Fails unless the target is ready.
    pub fn ready_color_attachment(&self) -> Result<GraphicsHandle, RenderError> {
        if self.state() != TargetState::Ready {
            return Err(RenderError::TargetNotReady { operation: "composite" });
        }
        Ok(self.color_texture)
    }

    pub fn state(&self) -> TargetState {
        if self.framebuffer.is_allocated() {
            TargetState::Ready
        } else {
            TargetState::Uninitialized
        }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn framebuffer(&self) -> GraphicsHandle {
        self.framebuffer
    }

    #[inline]
    pub fn color_texture(&self) -> GraphicsHandle {
        self.color_texture
    }

    #[inline]
    pub fn depth_stencil(&self) -> GraphicsHandle {
        self.depth_stencil
    }

    fn attach(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.color_texture = device.create_texture(width, height);
        self.depth_stencil = device.create_renderbuffer(width, height);
        device.attach_color(self.framebuffer, self.color_texture);
        device.attach_depth_stencil(self.framebuffer, self.depth_stencil);

        let status = device.framebuffer_status(self.framebuffer);
        if !status.is_complete() {
            let framebuffer = self.framebuffer;
            self.destroy(device);
            log::error!("offscreen framebuffer {framebuffer} at {width}x{height}: {status}");
            return Err(RenderError::IncompleteFramebuffer {
                framebuffer,
                status,
            });
        }

        self.width = width;
        self.height = height;
        Ok(())
    }

    fn release_attachments(&mut self, device: &mut dyn GraphicsDevice) {
        let color = GraphicsHandle::take(&mut self.color_texture);
        let depth_stencil = GraphicsHandle::take(&mut self.depth_stencil);
        if color.is_allocated() {
            device.delete_texture(color);
        }
        if depth_stencil.is_allocated() {
            device.delete_renderbuffer(depth_stencil);
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    Ok(())
}
