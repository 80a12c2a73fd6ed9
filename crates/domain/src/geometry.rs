//! Engine-space geometry.
//!
//! Positions are in game engine units (100 units is roughly one metre).
//! Rotations are in degrees and follow the engine convention: yaw turns
//! around the vertical axis measured from +X toward +Y, and positive pitch
//! looks up.

use serde::{Deserialize, Serialize};

/// A point or direction in engine space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two points.
    pub fn distance(&self, other: &Vector3) -> f64 {
        (*other - *self).length()
    }

    /// Distance ignoring the vertical axis.
    pub fn horizontal_distance(&self, other: &Vector3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Camera or actor orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f64,
    pub yaw: f64,
    #[serde(default)]
    pub roll: f64,
}

impl Rotator {
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Signed `(pitch, yaw)` error from `self` to `target`, each normalized
    /// to [-180, 180].
    pub fn delta_to(&self, target: &Rotator) -> (f64, f64) {
        (
            normalize_angle(target.pitch - self.pitch),
            normalize_angle(target.yaw - self.yaw),
        )
    }
}

/// Wraps an angle in degrees into [-180, 180].
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = angle % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped < -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Rotation that points a camera at `from` toward `to`.
///
/// Pitch is positive when the target is above the camera.
pub fn rotation_to_target(from: &Vector3, to: &Vector3) -> Rotator {
    let delta = *to - *from;
    let horizontal = (delta.x * delta.x + delta.y * delta.y).sqrt();
    let yaw = delta.y.atan2(delta.x).to_degrees();
    let pitch = delta.z.atan2(horizontal).to_degrees();
    Rotator::new(pitch, yaw, 0.0)
}
