//! Scripted physics double for controller tests
//!
//! Bodies move by `velocity * dt` with no gravity and no collisions. Contacts
//! are whatever the test declares.

use std::collections::{BTreeMap, HashSet};

use glam::Vec3;

use super::{BodyDesc, BodyHandle, ContactResult, PhysicsBackend, Pose};

#[derive(Debug, Clone)]
pub struct ScriptedBody {
    pub desc: BodyDesc,
    pub pose: Pose,
    pub velocity: Vec3,
    pub force: Vec3,
}

#[derive(Debug, Default)]
pub struct ScriptedPhysics {
    pub bodies: BTreeMap<BodyHandle, ScriptedBody>,
    /// Every `set_linear_velocity` call, in order
    pub velocity_log: Vec<(BodyHandle, Vec3)>,
    /// Every `apply_central_force` call, in order
    pub force_log: Vec<(BodyHandle, Vec3)>,
    pairs: HashSet<(BodyHandle, BodyHandle)>,
    touching: HashSet<BodyHandle>,
    next: u32,
}

impl ScriptedPhysics {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Default::default()
        }
    }

    fn key(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Declare whether `a` and `b` are touching
    pub fn set_pair_contact(&mut self, a: BodyHandle, b: BodyHandle, touching: bool) {
        if touching {
            self.pairs.insert(Self::key(a, b));
        } else {
            self.pairs.remove(&Self::key(a, b));
        }
    }

    /// Declare whether `body` touches anything at all
    pub fn set_world_contact(&mut self, body: BodyHandle, touching: bool) {
        if touching {
            self.touching.insert(body);
        } else {
            self.touching.remove(&body);
        }
    }
}

fn hit(touching: bool) -> ContactResult {
    if touching {
        ContactResult {
            has_contact: true,
            distance: -0.01,
        }
    } else {
        ContactResult::NONE
    }
}

impl PhysicsBackend for ScriptedPhysics {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next);
        self.next += 1;
        self.bodies.insert(
            handle,
            ScriptedBody {
                desc: *desc,
                pose: desc.pose,
                velocity: Vec3::ZERO,
                force: Vec3::ZERO,
            },
        );
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.touching.remove(&body);
        self.pairs.retain(|(a, b)| *a != body && *b != body);
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(&body)
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if !body.desc.is_static() {
                body.pose.position += body.velocity * dt;
            }
            body.force = Vec3::ZERO;
        }
    }

    fn contact_test(&self, body: BodyHandle) -> ContactResult {
        if !self.contains(body) {
            return ContactResult::NONE;
        }
        let paired = self.pairs.iter().any(|(a, b)| *a == body || *b == body);
        hit(paired || self.touching.contains(&body))
    }

    fn contact_pair_test(&self, a: BodyHandle, b: BodyHandle) -> ContactResult {
        if !self.contains(a) || !self.contains(b) {
            return ContactResult::NONE;
        }
        hit(self.pairs.contains(&Self::key(a, b)))
    }

    fn pose(&self, body: BodyHandle) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn set_pose(&mut self, body: BodyHandle, pose: Pose) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pose = pose;
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
            self.velocity_log.push((body, velocity));
        }
    }

    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.force += force;
            self.force_log.push((body, force));
        }
    }
}
