//! rapier3d backend
//!
//! Owns every piece of rapier state behind the `PhysicsBackend` trait. Time is
//! advanced in fixed `PHYSICS_DT` sub-steps with an accumulator, at most
//! `MAX_SUBSTEPS` per call.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::math::{Isometry, Real, Vector};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};

use super::{BodyDesc, BodyHandle, ContactResult, PhysicsBackend, Pose, Shape};
use crate::consts::{GRAVITY, MAX_SUBSTEPS, PHYSICS_DT};

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,

    entries: HashMap<BodyHandle, BodyEntry>,
    next_handle: u32,
    accumulator: f32,
}

impl RapierWorld {
    pub fn new() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            ..Default::default()
        };

        Self {
            gravity: Vector::new(0.0, -GRAVITY, 0.0),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: HashMap::new(),
            next_handle: 1,
            accumulator: 0.0,
        }
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    fn substep(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn to_isometry(pose: Pose) -> Isometry<Real> {
    let q = pose.rotation;
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z));
    let p = pose.position;
    Isometry::from_parts(Vector::new(p.x, p.y, p.z).into(), rotation)
}

fn from_isometry(iso: &Isometry<Real>) -> Pose {
    let t = iso.translation.vector;
    let q = iso.rotation;
    Pose {
        position: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(q.i, q.j, q.k, q.w),
    }
}

impl PhysicsBackend for RapierWorld {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = if desc.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .can_sleep(!desc.keep_awake)
                .ccd_enabled(desc.ccd)
                .angular_damping(desc.rolling_friction)
        };
        let body = self
            .rigid_body_set
            .insert(builder.position(to_isometry(desc.pose)).build());

        let collider = match desc.shape {
            Shape::Cuboid { size } => {
                ColliderBuilder::cuboid(size.x * 0.5, size.y * 0.5, size.z * 0.5)
            }
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
        };
        let mut collider = collider.friction(desc.friction);
        if !desc.is_static() {
            collider = collider.mass(desc.mass);
        }
        let collider = self.collider_set.insert_with_parent(
            collider.build(),
            body,
            &mut self.rigid_body_set,
        );

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.insert(handle, BodyEntry { body, collider });
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        let Some(entry) = self.entries.remove(&body) else {
            log::trace!("remove_body: unknown handle {:?}", body);
            return;
        };
        self.rigid_body_set.remove(
            entry.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.entries.contains_key(&body)
    }

    fn step(&mut self, dt: f32) {
        self.accumulator += dt.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= PHYSICS_DT && substeps < MAX_SUBSTEPS {
            self.substep();
            self.accumulator -= PHYSICS_DT;
            substeps += 1;
        }
        // Drop the backlog instead of spiralling
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(PHYSICS_DT);
        }

        // Central forces last one frame, like an impulse spread over it
        if substeps > 0 {
            for (_, rb) in self.rigid_body_set.iter_mut() {
                rb.reset_forces(false);
            }
        }
    }

    fn contact_test(&self, body: BodyHandle) -> ContactResult {
        let Some(entry) = self.entries.get(&body) else {
            return ContactResult::NONE;
        };
        ContactResult::from_distances(
            self.narrow_phase
                .contact_pairs_with(entry.collider)
                .flat_map(|pair| pair.manifolds.iter())
                .flat_map(|manifold| manifold.points.iter().map(|p| p.dist)),
        )
    }

    fn contact_pair_test(&self, a: BodyHandle, b: BodyHandle) -> ContactResult {
        let (Some(a), Some(b)) = (self.entries.get(&a), self.entries.get(&b)) else {
            return ContactResult::NONE;
        };
        match self.narrow_phase.contact_pair(a.collider, b.collider) {
            Some(pair) => ContactResult::from_distances(
                pair.manifolds
                    .iter()
                    .flat_map(|manifold| manifold.points.iter().map(|p| p.dist)),
            ),
            None => ContactResult::NONE,
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<Pose> {
        let entry = self.entries.get(&body)?;
        let rb = self.rigid_body_set.get(entry.body)?;
        Some(from_isometry(rb.position()))
    }

    fn set_pose(&mut self, body: BodyHandle, pose: Pose) {
        let Some(entry) = self.entries.get(&body) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(entry.body) {
            rb.set_position(to_isometry(pose), true);
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        let entry = self.entries.get(&body)?;
        let v = self.rigid_body_set.get(entry.body)?.linvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        let Some(entry) = self.entries.get(&body) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(entry.body) {
            rb.set_linvel(Vector::new(velocity.x, velocity.y, velocity.z), true);
        }
    }

    fn apply_central_force(&mut self, body: BodyHandle, force: Vec3) {
        let Some(entry) = self.entries.get(&body) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(entry.body) {
            rb.add_force(Vector::new(force.x, force.y, force.z), true);
        }
    }
}
