use std::collections::HashSet;

use winit::event::{ ElementState, MouseScrollDelta };
use winit::keyboard::KeyCode;
use winit::window::{ CursorGrabMode, Window };

use crate::engine::components::camera::{ CameraEvent, FrameInput, MovementKeys };

/// Pixels of touchpad scroll that count as one wheel notch.
const PIXELS_PER_LINE: f64 = 20.0;

/// Cursor change the window has to carry out after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRequest {
    Grab,
    Release,
}

/// Collects window input between frames and hands it to the camera as a
/// `FrameInput`.
///
/// Mouse motion is only recorded while the cursor is grabbed. Tab toggles the
/// grab, Escape releases it.
#[derive(Debug)]
pub struct InputSystem {
    pressed_keys: HashSet<KeyCode>,
    events: Vec<CameraEvent>,
    cursor_grabbed: bool,
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSystem {
    /// Starts with the cursor grabbed, as the viewer does on launch.
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            events: Vec::new(),
            cursor_grabbed: true,
        }
    }

    pub fn cursor_grabbed(&self) -> bool {
        self.cursor_grabbed
    }

    pub fn receive_key(&mut self, key: KeyCode, state: ElementState) -> Option<CursorRequest> {
        match (key, state) {
            (KeyCode::Tab, ElementState::Pressed) => {
                self.cursor_grabbed = !self.cursor_grabbed;
                log::debug!("Cursor grab toggled: {}", self.cursor_grabbed);
                Some(if self.cursor_grabbed { CursorRequest::Grab } else { CursorRequest::Release })
            }
            (KeyCode::Escape, ElementState::Pressed) => {
                if !self.cursor_grabbed {
                    return None;
                }
                self.cursor_grabbed = false;
                log::debug!("Cursor released via Escape");
                Some(CursorRequest::Release)
            }
            (KeyCode::Tab | KeyCode::Escape, ElementState::Released) => None,
            (key, ElementState::Pressed) => {
                self.pressed_keys.insert(key);
                None
            }
            (key, ElementState::Released) => {
                self.pressed_keys.remove(&key);
                None
            }
        }
    }

    /// Raw, unaccelerated pointer motion.
    pub fn receive_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.cursor_grabbed {
            self.events.push(CameraEvent::MouseMotion {
                dx: dx as f32,
                dy: dy as f32,
            });
        }
    }

    pub fn receive_scroll(&mut self, delta: MouseScrollDelta) {
        let dy = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
        };
        self.events.push(CameraEvent::Scroll { dy });
    }

    /// Held keys are released when the window loses focus, so no key stays
    /// stuck down.
    pub fn focus_lost(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn movement_keys(&self) -> MovementKeys {
        let held = |key| self.pressed_keys.contains(&key);
        MovementKeys {
            forward: held(KeyCode::KeyW),
            backward: held(KeyCode::KeyS),
            left: held(KeyCode::KeyA),
            right: held(KeyCode::KeyD),
            raise: held(KeyCode::KeyQ),
            lower: held(KeyCode::KeyE),
        }
    }

    /// Drains the pointer events collected since the last call.
    pub fn take_frame(&mut self) -> FrameInput {
        FrameInput {
            events: std::mem::take(&mut self.events),
            keys: self.movement_keys(),
        }
    }
}

/// Hides and confines the cursor, or gives it back.
pub fn apply_cursor_grab(window: &Window, grabbed: bool) {
    if grabbed {
        window.set_cursor_visible(false);
        let grab = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grab {
            log::warn!("Cursor grab not supported on this platform: {}", e);
        }
    } else {
        if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Failed to release cursor: {}", e);
        }
        window.set_cursor_visible(true);
    }
}
