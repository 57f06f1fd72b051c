use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use super::{DeviceError, GpuInit};

/// What the surface did after refusing to hand out a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame can be acquired normally.
    Reconfigured,
    /// Transient; drop this frame's on-screen work.
    SkipFrame,
    /// The surface cannot recover.
    Fatal,
}

/// The window surface together with its configuration.
///
/// `size` is the drawable size last reported by the window and may be zero
/// (minimized). The configuration keeps the last non-zero size, since wgpu
/// refuses to configure an empty surface.
pub(crate) struct ScreenSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
}

impl ScreenSurface {
    pub(crate) fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        init: &GpuInit,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: choose_present_mode(&caps.present_modes, init.present_mode),
            alpha_mode: choose_alpha_mode(&caps.alpha_modes, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(device, &config);
        log::debug!(
            "surface configured: {format:?}, {:?}, {:?}",
            config.present_mode,
            config.alpha_mode
        );

        Ok(Self {
            surface,
            config,
            size,
        })
    }

    #[inline]
    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[inline]
    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    #[inline]
    pub(crate) fn is_drawable(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    pub(crate) fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.size = size;
        if !self.is_drawable() {
            log::debug!("surface hidden at {}x{}", size.width, size.height);
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(device, &self.config);
    }

    /// Acquires the next frame.
    ///
    /// `Ok(None)` means there is no frame this time; the caller drops its
    /// on-screen work until the next present.
    pub(crate) fn acquire(
        &self,
        device: &wgpu::Device,
    ) -> Result<Option<wgpu::SurfaceTexture>, DeviceError> {
        if !self.is_drawable() {
            return Ok(None);
        }
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => {
                let message = err.to_string();
                match self.recover(device, err) {
                    SurfaceErrorAction::Fatal => Err(DeviceError::SurfaceLost(message)),
                    action => {
                        log::warn!("surface frame unavailable ({message}): {action:?}");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn recover(&self, device: &wgpu::Device, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.surface.configure(device, &self.config);
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Picks the first preferred format the surface supports, else its first format.
///
/// Without `prefer_srgb` linear formats come first, so offscreen texels reach
/// the screen without another encode.
fn choose_format(
    supported: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat::{Bgra8Unorm, Bgra8UnormSrgb, Rgba8Unorm, Rgba8UnormSrgb};

    let preferred = if prefer_srgb {
        [Bgra8UnormSrgb, Rgba8UnormSrgb]
    } else {
        [Bgra8Unorm, Rgba8Unorm]
    };
    preferred
        .into_iter()
        .find(|f| supported.contains(f))
        .or_else(|| supported.first().copied())
}

fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Falls back to `Fifo`, which every surface supports.
fn choose_present_mode(
    supported: &[wgpu::PresentMode],
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if supported.contains(&requested) {
        requested
    } else {
        log::warn!("present mode {requested:?} unsupported; using Fifo");
        wgpu::PresentMode::Fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, PresentMode, TextureFormat};

    #[test]
    fn linear_formats_win_unless_srgb_is_preferred() {
        let supported = [
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgba8Unorm,
            TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(choose_format(&supported, false), Some(TextureFormat::Bgra8Unorm));
        assert_eq!(choose_format(&supported, true), Some(TextureFormat::Bgra8UnormSrgb));
    }

    #[test]
    fn unknown_formats_fall_back_to_the_first() {
        let supported = [TextureFormat::Rgb10a2Unorm];
        assert_eq!(choose_format(&supported, false), Some(TextureFormat::Rgb10a2Unorm));
        assert_eq!(choose_format(&[], true), None);
    }

    #[test]
    fn alpha_mode_honors_supported_requests_only() {
        let supported = [CompositeAlphaMode::Opaque, CompositeAlphaMode::PreMultiplied];
        assert_eq!(
            choose_alpha_mode(&supported, Some(CompositeAlphaMode::PreMultiplied)),
            CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(
            choose_alpha_mode(&supported, Some(CompositeAlphaMode::PostMultiplied)),
            CompositeAlphaMode::Opaque
        );
        assert_eq!(choose_alpha_mode(&[], None), CompositeAlphaMode::Auto);
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let supported = [PresentMode::Fifo, PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&supported, PresentMode::Mailbox), PresentMode::Mailbox);
        assert_eq!(choose_present_mode(&supported, PresentMode::Immediate), PresentMode::Fifo);
    }
}
