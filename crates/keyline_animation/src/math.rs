//! Vector and transform primitives shared by the wire format and the resolver
//!
//! Wire values are plain `{x, y, z}` objects; quaternion work goes through
//! `glam` so slerp and Euler conversion follow one well-tested implementation.

use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Componentwise linear interpolation
    pub fn lerp(&self, other: Vec3, t: f64) -> Vec3 {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<DVec3> for Vec3 {
    fn from(v: DVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for DVec3 {
    fn from(v: Vec3) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

/// Position, XYZ Euler rotation (radians) and scale of an object.
///
/// Inside a keyframe, position and rotation are offsets from the object's rest
/// pose while scale is absolute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Builder: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder: set rotation (radians, XYZ order)
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Orientation as a quaternion
    pub fn orientation(&self) -> DQuat {
        euler_to_quat(self.rotation)
    }

    /// All components finite and scale strictly positive
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.scale.is_finite()
            && self.scale.x > 0.0
            && self.scale.y > 0.0
            && self.scale.z > 0.0
    }
}

/// Convert XYZ-ordered Euler angles to a quaternion
pub fn euler_to_quat(rotation: Vec3) -> DQuat {
    DQuat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Convert a quaternion back to XYZ-ordered Euler angles
pub fn quat_to_euler(q: DQuat) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Angular distance between two orientations, in radians
pub fn angle_between(a: DQuat, b: DQuat) -> f64 {
    let dot = a.dot(b).abs().min(1.0);
    2.0 * dot.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_lerp() {
        let a = Vec3::new(0.0, 2.0, -4.0);
        let b = Vec3::new(2.0, 2.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(a.lerp(b, 0.0), a);
    }

    #[test]
    fn test_transform_defaults_from_json() {
        let t: Transform = serde_json::from_str(r#"{"position":{"x":1,"y":2,"z":3}}"#).unwrap();
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_euler_round_trip() {
        let rotation = Vec3::new(0.3, -0.7, 1.1);
        let back = quat_to_euler(euler_to_quat(rotation));
        assert!((back.x - rotation.x).abs() < 1e-9);
        assert!((back.y - rotation.y).abs() < 1e-9);
        assert!((back.z - rotation.z).abs() < 1e-9);
    }

    #[test]
    fn test_angle_between() {
        let a = euler_to_quat(Vec3::ZERO);
        let b = euler_to_quat(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!((angle_between(a, b) - FRAC_PI_2).abs() < 1e-9);
        assert!(angle_between(a, a) < 1e-9);
    }

    #[test]
    fn test_scale_must_be_positive() {
        assert!(Transform::IDENTITY.is_valid());
        assert!(!Transform::IDENTITY
            .with_scale(Vec3::new(1.0, 0.0, 1.0))
            .is_valid());
    }
}
