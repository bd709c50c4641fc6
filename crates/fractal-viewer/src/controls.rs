//! Turns winit window events into per-frame navigation input.

use glam::DVec2;
use tilecache::{Action, EdgeDetector};
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Keyboard binding for every action.
pub fn action_for(key: KeyCode) -> Option<Action> {
    let action = match key {
        KeyCode::Equal | KeyCode::NumpadAdd | KeyCode::KeyE => Action::ZoomIn,
        KeyCode::Minus | KeyCode::NumpadSubtract | KeyCode::KeyQ => Action::ZoomOut,
        KeyCode::ArrowUp | KeyCode::KeyW => Action::PanUp,
        KeyCode::ArrowDown | KeyCode::KeyS => Action::PanDown,
        KeyCode::ArrowLeft | KeyCode::KeyA => Action::PanLeft,
        KeyCode::ArrowRight | KeyCode::KeyD => Action::PanRight,
        KeyCode::KeyR => Action::Recalculate,
        KeyCode::KeyH => Action::ToggleHud,
        KeyCode::Escape => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Input collected since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Actions whose key went down this frame.
    pub pressed: Vec<Action>,
    /// Accumulated left-drag motion in window pixels.
    pub drag_px: DVec2,
    /// Wheel notches, positive zooms in.
    pub zoom_steps: f64,
    /// Last known cursor position in window pixels.
    pub cursor_px: DVec2,
    /// The left button went up, ending a drag gesture.
    pub drag_released: bool,
}

#[derive(Debug, Default)]
pub struct Controls {
    keys: EdgeDetector<Action>,
    cursor: DVec2,
    // Cursor at the last applied drag step; `None` while the button is up.
    drag_anchor: Option<DVec2>,
    drag: DVec2,
    released: bool,
    scroll: f64,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.set_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { button, state, .. } if *button == MouseButton::Left => {
                self.set_dragging(*state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(DVec2::new(position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / 120.0,
                };
                self.scroll(notches);
            }
            WindowEvent::Focused(false) => {
                self.keys.clear();
                self.set_dragging(false);
            }
            _ => {}
        }
    }

    /// Button down latches the cursor; motion only counts from the next move.
    pub fn set_dragging(&mut self, down: bool) {
        if !down && self.drag_anchor.is_some() {
            self.released = true;
        }
        self.drag_anchor = down.then_some(self.cursor);
    }

    pub fn cursor_moved(&mut self, pos: DVec2) {
        if let Some(anchor) = self.drag_anchor {
            self.drag += pos - anchor;
            self.drag_anchor = Some(pos);
        }
        self.cursor = pos;
    }

    pub fn scroll(&mut self, notches: f64) {
        self.scroll += notches;
    }

    /// Hands out everything gathered this frame and starts the next one.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            pressed: self.keys.pressed().collect(),
            drag_px: std::mem::take(&mut self.drag),
            zoom_steps: std::mem::take(&mut self.scroll),
            cursor_px: self.cursor,
            drag_released: std::mem::take(&mut self.released),
        };
        self.keys.end_frame();
        frame
    }

    /// Feeds a key state directly, bypassing winit.
    pub fn set_key(&mut self, key: KeyCode, held: bool) {
        if let Some(action) = action_for(key) {
            self.keys.set(action, held);
        }
    }
}
