use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, ModifiersState, NamedKey};

use crate::input::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};

/// Turns winit window events into [`InputEvent`]s in logical units.
///
/// Remembers modifier and pointer state because winit reports them
/// separately from the button and wheel events that need them.
#[derive(Debug, Default)]
pub struct InputTranslator {
    modifiers: Modifiers,
    pointer: Option<(f32, f32)>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one window event. `scale` is the window's scale factor.
    pub fn translate(&mut self, event: &WindowEvent, scale: f64) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(m) => Some(self.modifiers_changed(m.state())),

            WindowEvent::Focused(focused) => Some(InputEvent::Focused(*focused)),

            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
                Some(InputEvent::PointerLeft)
            }

            WindowEvent::CursorMoved { position, .. } => {
                Some(self.pointer_moved(*position, scale))
            }

            WindowEvent::MouseInput { state, button, .. } => Some(self.button(*state, *button)),

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => WheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        let (x, y) = to_logical(*p, scale);
                        WheelDelta::Pixel { x, y }
                    }
                };
                Some(InputEvent::Wheel {
                    delta,
                    modifiers: self.modifiers,
                })
            }

            WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
                key: map_key(&event.logical_key),
                state: map_state(event.state),
                modifiers: self.modifiers,
                repeat: event.repeat,
            }),

            WindowEvent::Ime(winit::event::Ime::Commit(text)) if !text.is_empty() => {
                Some(InputEvent::Text(text.clone()))
            }

            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    fn modifiers_changed(&mut self, state: ModifiersState) -> InputEvent {
        self.modifiers = map_modifiers(state);
        InputEvent::ModifiersChanged(self.modifiers)
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>, scale: f64) -> InputEvent {
        let (x, y) = to_logical(position, scale);
        self.pointer = Some((x, y));
        InputEvent::PointerMoved { x, y }
    }

    fn button(&self, state: ElementState, button: WinitMouseButton) -> InputEvent {
        let (x, y) = self.pointer.unwrap_or((0.0, 0.0));
        InputEvent::PointerButton {
            button: map_mouse_button(button),
            state: map_state(state),
            x,
            y,
            modifiers: self.modifiers,
        }
    }
}

fn to_logical(pos: PhysicalPosition<f64>, scale: f64) -> (f32, f32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(named) => map_named(*named),
        WinitKey::Character(text) => text.chars().next().map_or(Key::Unknown, Key::Character),
        _ => Key::Unknown,
    }
}

fn map_named(named: NamedKey) -> Key {
    match named {
        NamedKey::Escape => Key::Escape,
        NamedKey::Enter => Key::Enter,
        NamedKey::Tab => Key::Tab,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::Delete => Key::Delete,
        NamedKey::Space => Key::Space,

        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::PageDown => Key::PageDown,

        NamedKey::ArrowUp => Key::ArrowUp,
        NamedKey::ArrowDown => Key::ArrowDown,
        NamedKey::ArrowLeft => Key::ArrowLeft,
        NamedKey::ArrowRight => Key::ArrowRight,

        NamedKey::Shift => Key::Shift,
        NamedKey::Control => Key::Control,
        NamedKey::Alt => Key::Alt,
        NamedKey::Super | NamedKey::Meta => Key::Meta,

        NamedKey::F1 => Key::Function(1),
        NamedKey::F2 => Key::Function(2),
        NamedKey::F3 => Key::Function(3),
        NamedKey::F4 => Key::Function(4),
        NamedKey::F5 => Key::Function(5),
        NamedKey::F6 => Key::Function(6),
        NamedKey::F7 => Key::Function(7),
        NamedKey::F8 => Key::Function(8),
        NamedKey::F9 => Key::Function(9),
        NamedKey::F10 => Key::Function(10),
        NamedKey::F11 => Key::Function(11),
        NamedKey::F12 => Key::Function(12),

        _ => Key::Unknown,
    }
}
