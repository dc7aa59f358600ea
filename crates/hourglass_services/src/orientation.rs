//! Orientation drivers.
//!
//! The integrator only needs a unit quaternion per tick; these are the
//! sources a host can plug in.

use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

pub use hourglass_sim::OrientationSource;

/// A constant orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed(pub Quat);

impl Default for Fixed {
    fn default() -> Self {
        Fixed(Quat::IDENTITY)
    }
}

impl OrientationSource for Fixed {
    fn orientation(&mut self, _dt: f32) -> Quat {
        self.0
    }
}

/// Continuous rotation about a fixed axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRotate {
    axis: Vec3,
    /// Radians per second.
    speed: f32,
    angle: f32,
}

impl AutoRotate {
    /// A zero or non-finite axis falls back to Z (tipping the hourglass
    /// end over end in the view plane).
    pub fn new(axis: Vec3, speed: f32) -> Self {
        let axis = axis.try_normalize().unwrap_or(Vec3::Z);
        Self {
            axis,
            speed: if speed.is_finite() { speed } else { 0.0 },
            angle: 0.0,
        }
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl OrientationSource for AutoRotate {
    fn orientation(&mut self, dt: f32) -> Quat {
        if dt.is_finite() && dt > 0.0 {
            self.angle = (self.angle + self.speed * dt).rem_euclid(std::f32::consts::TAU);
        }
        Quat::from_axis_angle(self.axis, self.angle)
    }
}

/// Yaw/pitch accumulated from pointer drags, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRotation {
    yaw: f32,
    pitch: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Pitch is held within `±pitch_limit` radians.
    pub pitch_limit: f32,
}

impl Default for DragRotation {
    fn default() -> Self {
        Self::new(0.005)
    }
}

impl DragRotation {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity,
            pitch_limit: FRAC_PI_2,
        }
    }

    /// Horizontal drags spin about Y, vertical drags tip about X.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.yaw = (self.yaw + dx * self.sensitivity).rem_euclid(std::f32::consts::TAU);
        self.pitch =
            (self.pitch + dy * self.sensitivity).clamp(-self.pitch_limit, self.pitch_limit);
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }
}

impl OrientationSource for DragRotation {
    fn orientation(&mut self, _dt: f32) -> Quat {
        self.rotation()
    }
}
