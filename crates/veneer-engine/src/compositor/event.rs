use crate::input::InputEvent;

/// Windowing event as seen by the compositor.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// New drawable size in physical pixels. May be zero while minimized.
    Resized { width: u32, height: u32 },
    ContentScaleChanged { scale_x: f32, scale_y: f32 },
    CloseRequested,
    Input(InputEvent),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventKind {
    Resize,
    ContentScale,
    Close,
    Input,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resized { .. } => EventKind::Resize,
            HostEvent::ContentScaleChanged { .. } => EventKind::ContentScale,
            HostEvent::CloseRequested => EventKind::Close,
            HostEvent::Input(_) => EventKind::Input,
        }
    }
}

/// Control directive returned after handling an event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}
