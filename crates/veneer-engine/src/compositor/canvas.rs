use crate::device::{DeviceError, GraphicsDevice, GraphicsHandle, PixelRect};
use crate::paint::Color;

/// Canvas surface bound to one generation of the offscreen target.
///
/// Released and replaced on every resize; `generation` tells them apart.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CanvasSurface {
    pub framebuffer: GraphicsHandle,
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

/// Drawing access to the bound offscreen target during `UiEngine::paint`.
///
/// Fills overwrite texels; there is no blending inside the canvas.
pub struct Canvas<'a> {
    device: &'a mut dyn GraphicsDevice,
    surface: CanvasSurface,
    scale: f32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(device: &'a mut dyn GraphicsDevice, surface: CanvasSurface, scale: f32) -> Self {
        Self {
            device,
            surface,
            scale,
        }
    }

    /// Size in physical pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.surface.width, self.surface.height)
    }

    /// Size in logical units.
    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.surface.width as f32 / self.scale,
            self.surface.height as f32 / self.scale,
        )
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn surface(&self) -> CanvasSurface {
        self.surface
    }

    pub fn clear(&mut self, color: Color) -> Result<(), DeviceError> {
        self.device.clear(color)
    }

    /// Fills a rectangle given in physical pixels; the part outside the canvas is dropped.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) -> Result<(), DeviceError> {
        match rect.clipped_to(self.surface.width, self.surface.height) {
            Some(rect) => self.device.fill_rect(rect, color),
            None => Ok(()),
        }
    }

    /// Fills a rectangle given in logical units, snapped outward to whole pixels.
    pub fn fill_logical_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> Result<(), DeviceError> {
        let s = self.scale;
        let x0 = (x * s).floor().max(0.0);
        let y0 = (y * s).floor().max(0.0);
        let x1 = ((x + width) * s).ceil().max(0.0);
        let y1 = ((y + height) * s).ceil().max(0.0);
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }
        let rect = PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
        self.fill_rect(rect, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    fn offscreen(dev: &mut HeadlessDevice, w: u32, h: u32) -> (CanvasSurface, GraphicsHandle) {
        let fb = dev.create_framebuffer();
        let tex = dev.create_texture(w, h);
        let rb = dev.create_renderbuffer(w, h);
        dev.attach_color(fb, tex);
        dev.attach_depth_stencil(fb, rb);
        dev.bind_framebuffer(fb);
        let surface = CanvasSurface {
            framebuffer: fb,
            width: w,
            height: h,
            generation: 1,
        };
        (surface, tex)
    }

    #[test]
    fn logical_rect_scales_to_pixels() {
        let mut dev = HeadlessDevice::default();
        let (surface, tex) = offscreen(&mut dev, 8, 8);
        let mut canvas = Canvas::new(&mut dev, surface, 2.0);
        assert_eq!(canvas.logical_size(), (4.0, 4.0));
        canvas.clear(Color::WHITE).unwrap();
        canvas.fill_logical_rect(1.0, 1.0, 1.0, 1.0, Color::BLACK).unwrap();

        assert_eq!(dev.pixel(tex, 1, 1), Some([255, 255, 255, 255]));
        assert_eq!(dev.pixel(tex, 2, 2), Some([0, 0, 0, 255]));
        assert_eq!(dev.pixel(tex, 3, 3), Some([0, 0, 0, 255]));
        assert_eq!(dev.pixel(tex, 4, 4), Some([255, 255, 255, 255]));
    }

    #[test]
    fn rect_outside_canvas_is_dropped() {
        let mut dev = HeadlessDevice::default();
        let (surface, _) = offscreen(&mut dev, 4, 4);
        let mut canvas = Canvas::new(&mut dev, surface, 1.0);
        canvas.fill_rect(PixelRect::new(10, 10, 2, 2), Color::BLACK).unwrap();
        canvas.fill_logical_rect(-5.0, -5.0, 2.0, 2.0, Color::BLACK).unwrap();
        assert!(
            !dev.commands()
                .iter()
                .any(|c| matches!(c, crate::device::Command::FillRect { .. }))
        );
    }
}
