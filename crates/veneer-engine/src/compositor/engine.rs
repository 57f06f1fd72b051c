use crate::device::DeviceError;
use crate::input::InputEvent;
use crate::schedule::{Invalidator, TaskSpawner};

use super::Canvas;

/// Handles the compositor gives a UI engine when constructing it.
#[derive(Clone)]
pub struct EngineHooks {
    /// Requests a repaint on the next tick.
    pub invalidator: Invalidator,
    /// Queues work to run between event polls.
    pub spawner: TaskSpawner,
}

/// Declarative UI engine painting into the offscreen canvas.
///
/// Sizes are physical pixels. The engine never renders on its own; it asks
/// for a repaint through [`EngineHooks::invalidator`].
pub trait UiEngine {
    fn set_size(&mut self, width: u32, height: u32);

    fn set_scale(&mut self, scale: f32);

    /// Paints one frame. The canvas has already been cleared.
    fn paint(&mut self, canvas: &mut Canvas<'_>, timestamp_nanos: u64) -> Result<(), DeviceError>;

    fn handle_input(&mut self, event: &InputEvent) {
        let _ = event;
    }
}
