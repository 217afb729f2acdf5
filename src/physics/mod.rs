//! Physics collaborator
//!
//! The game never integrates anything itself. It describes bodies, asks the
//! backend to step, and queries contacts. `PhysicsBackend` is the seam;
//! `RapierWorld` is the real engine, tests use a scripted double.

pub mod rapier;

#[cfg(test)]
pub(crate) mod scripted;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

pub use rapier::RapierWorld;

/// Opaque body handle issued by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Position + orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Collision/visual primitive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box given by its full size
    Cuboid { size: Vec3 },
    Ball { radius: f32 },
}

/// Everything a backend needs to create a rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub pose: Pose,
    /// 0 makes the body static
    pub mass: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    /// Never let the body fall asleep (forces keep applying every frame)
    pub keep_awake: bool,
    /// Continuous collision detection for fast movers
    pub ccd: bool,
}

impl BodyDesc {
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

/// Separation below which two bodies count as touching
pub const CONTACT_TOLERANCE: f32 = 0.01;

/// Result of a contact query
///
/// `distance` is the smallest signed separation found; negative values are
/// penetration depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResult {
    pub has_contact: bool,
    pub distance: f32,
}

impl ContactResult {
    pub const NONE: Self = Self {
        has_contact: false,
        distance: f32::INFINITY,
    };

    /// Build a result from the separations of every contact point found
    pub fn from_distances(distances: impl IntoIterator<Item = f32>) -> Self {
        let distance = distances.into_iter().fold(f32::INFINITY, f32::min);
        Self {
            has_contact: distance <= CONTACT_TOLERANCE,
            distance,
        }
    }
}

/// Physics operations the game relies on
///
/// Queries against unknown handles return `None` / `ContactResult::NONE`, and
/// mutations on unknown handles are ignored: objects may be mid-destruction.
pub trait PhysicsBackend {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    fn remove_body(&mut self, body: BodyHandle);
    fn contains(&self, body: BodyHandle) -> bool;

    /// Advance simulation time by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Contact between one body and anything else in the world
    fn contact_test(&self, body: BodyHandle) -> ContactResult;
    /// Contact between two specific bodies
    fn contact_pair_test(&self, a: BodyHandle, b: BodyHandle) -> ContactResult;

    fn pose(&self, body: BodyHandle) -> Option<Pose>;
    fn set_pose(&mut self, body: BodyHandle, pose: Pose);
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);
    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_result_from_distances() {
        let touching = ContactResult::from_distances([0.3, -0.02, 0.1]);
        assert!(touching.has_contact);
        assert!((touching.distance + 0.02).abs() < 1e-6);

        let apart = ContactResult::from_distances([0.3, 0.1]);
        assert!(!apart.has_contact);

        let empty = ContactResult::from_distances([]);
        assert_eq!(empty, ContactResult::NONE);
    }
}
