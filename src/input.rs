//! Pointer, wheel and key tracking.
//!
//! [`Input`] accumulates raw winit window events over a frame. At the end of
//! the frame [`Input::actions`] turns them into [`Action`]s for the engine:
//!
//! | Input | Action |
//! |-------|--------|
//! | left drag | pan |
//! | wheel | zoom about the cursor (x1.1 per notch in, x0.9 out) |
//! | `1`..`4` | select visualization mode |
//! | `Space` | pause / resume |
//! | `R` | reset simulation |
//! | `F` | fit the disk to the window |
//! | `[` / `]` | halve / double time scale |
//! | `P` | save a PNG snapshot |

use std::collections::HashSet;

use glam::DVec2;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::state::VisualizationMode;

/// Zoom multiplier per wheel notch scrolled forward.
pub const ZOOM_IN_FACTOR: f64 = 1.1;
/// Zoom multiplier per wheel notch scrolled back.
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Pixels of trackpad scroll treated as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Key1,
    Key2,
    Key3,
    Key4,
    Space,
    R,
    F,
    P,
    BracketLeft,
    BracketRight,
    Escape,
}

impl KeyCode {
    fn from_winit(key: WinitKeyCode) -> Option<Self> {
        Some(match key {
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Key1,
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Key2,
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Key3,
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Key4,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyF => KeyCode::F,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::BracketLeft => KeyCode::BracketLeft,
            WinitKeyCode::BracketRight => KeyCode::BracketRight,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => return None,
        })
    }
}

/// A host command derived from one frame of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Drag in screen pixels.
    Pan(DVec2),
    /// Zoom by `factor` about a screen point.
    ZoomAt { screen: DVec2, factor: f64 },
    SetMode(VisualizationMode),
    TogglePause,
    Reset,
    Fit,
    /// Multiply the time scale.
    ScaleTime(f64),
    Snapshot,
    Quit,
}

/// Input state for the current frame.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_held: HashSet<MouseButton>,
    cursor: DVec2,
    drag: DVec2,
    scroll_notches: f64,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Cursor position in pixels.
    pub fn cursor(&self) -> DVec2 {
        self.cursor
    }

    /// Accumulated left-drag this frame, in pixels.
    pub fn drag(&self) -> DVec2 {
        self.drag
    }

    /// Wheel notches this frame; positive is forward.
    pub fn scroll_notches(&self) -> f64 {
        self.scroll_notches
    }

    /// Clear per-frame state. Held keys and buttons persist.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.drag = DVec2::ZERO;
        self.scroll_notches = 0.0;
    }

    /// Record a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = KeyCode::from_winit(code) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => self.press(key),
                    ElementState::Released => {
                        self.keys_held.remove(&key);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = MouseButton::from_winit(*button) {
                    match state {
                        ElementState::Pressed => self.mouse_held.insert(button),
                        ElementState::Released => self.mouse_held.remove(&button),
                    };
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(DVec2::new(position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                self.mouse_held.clear();
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_notches += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_NOTCH,
                };
            }

            _ => {}
        }
    }

    fn cursor_moved(&mut self, position: DVec2) {
        if self.mouse_held(MouseButton::Left) {
            self.drag += position - self.cursor;
        }
        self.cursor = position;
    }

    fn press(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    /// Translate this frame's input into actions, in a stable order.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.drag != DVec2::ZERO {
            actions.push(Action::Pan(self.drag));
        }
        if self.scroll_notches != 0.0 {
            let per_notch = if self.scroll_notches > 0.0 {
                ZOOM_IN_FACTOR
            } else {
                ZOOM_OUT_FACTOR
            };
            actions.push(Action::ZoomAt {
                screen: self.cursor,
                factor: per_notch.powf(self.scroll_notches.abs()),
            });
        }

        let modes = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3, KeyCode::Key4];
        for (i, key) in modes.into_iter().enumerate() {
            if self.key_pressed(key) {
                if let Some(mode) = VisualizationMode::from_index(i + 1) {
                    actions.push(Action::SetMode(mode));
                }
            }
        }

        let bindings = [
            (KeyCode::Space, Action::TogglePause),
            (KeyCode::R, Action::Reset),
            (KeyCode::F, Action::Fit),
            (KeyCode::BracketLeft, Action::ScaleTime(0.5)),
            (KeyCode::BracketRight, Action::ScaleTime(2.0)),
            (KeyCode::P, Action::Snapshot),
            (KeyCode::Escape, Action::Quit),
        ];
        actions.extend(
            bindings
                .into_iter()
                .filter(|(key, _)| self.key_pressed(*key))
                .map(|(_, action)| action),
        );

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_is_edge_triggered() {
        let mut input = Input::new();
        input.press(KeyCode::Space);
        assert!(input.key_pressed(KeyCode::Space));
        assert_eq!(input.actions(), vec![Action::TogglePause]);

        input.begin_frame();
        input.press(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));
        assert!(input.actions().is_empty());
    }

    #[test]
    fn test_drag_only_while_left_held() {
        let mut input = Input::new();
        input.cursor_moved(DVec2::new(10.0, 10.0));
        input.cursor_moved(DVec2::new(20.0, 10.0));
        assert_eq!(input.drag(), DVec2::ZERO);

        input.mouse_held.insert(MouseButton::Left);
        input.cursor_moved(DVec2::new(25.0, 4.0));
        input.cursor_moved(DVec2::new(30.0, 0.0));
        assert_eq!(input.drag(), DVec2::new(10.0, -10.0));
        assert_eq!(input.actions(), vec![Action::Pan(DVec2::new(10.0, -10.0))]);
    }

    #[test]
    fn test_wheel_zoom_factors() {
        let mut input = Input::new();
        input.cursor = DVec2::new(5.0, 6.0);
        input.scroll_notches = 1.0;
        assert_eq!(
            input.actions(),
            vec![Action::ZoomAt { screen: DVec2::new(5.0, 6.0), factor: 1.1 }]
        );

        input.scroll_notches = -2.0;
        match input.actions()[0] {
            Action::ZoomAt { factor, .. } => assert!((factor - 0.81).abs() < 1e-12),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_mode_and_time_keys() {
        let mut input = Input::new();
        input.press(KeyCode::Key3);
        input.press(KeyCode::BracketRight);
        assert_eq!(
            input.actions(),
            vec![Action::SetMode(VisualizationMode::Solar), Action::ScaleTime(2.0)]
        );
    }
}
