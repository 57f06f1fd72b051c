/// How [`WgpuDevice`](super::WgpuDevice) picks its adapter and sets up the
/// window surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may use.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: the offscreen canvas already holds display-encoded
    /// texels and the compositing pass copies them through unchanged.
    pub prefer_srgb: bool,

    /// Falls back to `Fifo` when the surface does not support it.
    pub present_mode: wgpu::PresentMode,

    /// Used only when the surface supports it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,

    /// `max_texture_dimension_2d` bounds the offscreen target: larger sizes
    /// leave the framebuffer incomplete.
    pub required_limits: wgpu::Limits,

    /// Frame latency hint for the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
