use cgmath::{ Deg, InnerSpace, Matrix4, Point3, Vector3 };

use crate::engine::config::CameraConfig;

pub const MIN_PITCH: f32 = -89.0;
pub const MAX_PITCH: f32 = 89.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    /// Height change per frame while Q or E is held.
    pub height_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 5.0,
            sensitivity: 0.05,
            height_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraEvent {
    MouseMotion {
        dx: f32,
        dy: f32,
    },
    Scroll {
        dy: f32,
    },
}

/// Movement keys held down this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub raise: bool,
    pub lower: bool,
}

/// Everything the camera consumes in one frame: pointer events in arrival
/// order plus the keys held at the end of the frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub events: Vec<CameraEvent>,
    pub keys: MovementKeys,
}

/// First-person camera. Angles are in degrees.
///
/// `front` is always derived from `yaw` and `pitch` once the mouse has moved;
/// `pitch` stays within [-89, 89] and `fov` within [1, 45].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    /// Overrides `position.y` after every keyboard update.
    pub height: f32,
    pub settings: CameraSettings,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 3.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            height: 1.0,
            settings: CameraSettings::default(),
        }
    }
}

impl From<&CameraConfig> for CameraState {
    fn from(config: &CameraConfig) -> Self {
        let pitch = config.pitch.clamp(MIN_PITCH, MAX_PITCH);
        let [x, y, z] = config.position;
        Self {
            position: Point3::new(x, y, z),
            front: front_from_angles(config.yaw, pitch),
            up: Vector3::unit_y(),
            yaw: config.yaw,
            pitch,
            fov: config.fov.clamp(MIN_FOV, MAX_FOV),
            height: config.height,
            settings: CameraSettings {
                speed: config.speed,
                sensitivity: config.sensitivity,
                height_step: config.height_step,
            },
        }
    }
}

pub fn front_from_angles(yaw: f32, pitch: f32) -> Vector3<f32> {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vector3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin()).normalize()
}

impl CameraState {
    pub fn update(mut self, input: &FrameInput, dt: f32) -> Self {
        for event in &input.events {
            self = self.apply_event(*event);
        }
        self.apply_keys(input.keys, dt)
    }

    pub fn apply_event(mut self, event: CameraEvent) -> Self {
        match event {
            CameraEvent::MouseMotion { dx, dy } => {
                self.yaw += dx * self.settings.sensitivity;
                self.pitch = (self.pitch - dy * self.settings.sensitivity).clamp(MIN_PITCH, MAX_PITCH);
                self.front = front_from_angles(self.yaw, self.pitch);
                log::trace!("Yaw: {:.2}, Pitch: {:.2}", self.yaw, self.pitch);
            }
            CameraEvent::Scroll { dy } => {
                self.fov = (self.fov - dy).clamp(MIN_FOV, MAX_FOV);
                log::trace!("Fov: {:.2}", self.fov);
            }
        }
        self
    }

    pub fn apply_keys(mut self, keys: MovementKeys, dt: f32) -> Self {
        let step = self.settings.speed * dt;
        let right = self.front.cross(self.up).normalize();

        if keys.forward {
            self.position += self.front * step;
        }
        if keys.backward {
            self.position -= self.front * step;
        }
        if keys.left {
            self.position -= right * step;
        }
        if keys.right {
            self.position += right * step;
        }
        if keys.raise {
            self.height += self.settings.height_step;
        }
        if keys.lower {
            self.height -= self.settings.height_step;
        }

        self.position.y = self.height;
        self
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection(&self, aspect_ratio: f32) -> Matrix4<f32> {
        cgmath::perspective(Deg(self.fov), aspect_ratio, Z_NEAR, Z_FAR)
    }
}
