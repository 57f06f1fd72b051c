/// Size, scale and frame count of the compositor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameState {
    /// Physical pixels, never zero.
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    /// Renders executed so far.
    pub frame_counter: u64,
}

impl FrameState {
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            scale: sanitize_scale(scale),
            frame_counter: 0,
        }
    }

    /// Records a new size, clamping zero dimensions to 1. Returns the stored size.
    pub fn resize(&mut self, width: u32, height: u32) -> (u32, u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        (self.width, self.height)
    }

    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = sanitize_scale(scale);
        self.scale
    }

    /// Counts one executed render and returns the new total.
    pub fn record_frame(&mut self) -> u64 {
        self.frame_counter += 1;
        self.frame_counter
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_clamped() {
        let mut state = FrameState::new(0, 0, 1.0);
        assert_eq!((state.width, state.height), (1, 1));
        assert_eq!(state.resize(0, 300), (1, 300));
    }

    #[test]
    fn bad_scale_falls_back_to_one() {
        let mut state = FrameState::new(10, 10, f32::NAN);
        assert_eq!(state.scale, 1.0);
        assert_eq!(state.set_scale(-2.0), 1.0);
        assert_eq!(state.set_scale(1.5), 1.5);
    }

    #[test]
    fn frame_counter_increments() {
        let mut state = FrameState::new(10, 10, 1.0);
        assert_eq!(state.record_frame(), 1);
        assert_eq!(state.record_frame(), 2);
    }
}
