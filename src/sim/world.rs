//! World model
//!
//! Every entity owns a mesh in the scene graph and, usually, a body in the
//! physics backend. Both are created in `spawn` and removed in `destroy`, so an
//! entity is never half-built across a frame.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::layout::{BlockSpec, RoomLayout};
use crate::consts::{COLLECTIBLE_RADIUS, PLAYER_RADIUS, PROJECTILE_RADIUS, PUZZLE_BLOCK_SIZE};
use crate::physics::{BodyDesc, BodyHandle, PhysicsBackend, Pose, Shape};
use crate::renderer::scene::{MeshNode, NodeId, SceneGraph};
use crate::rgb;

/// Stable entity id, never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Ground,
    Wall,
    Platform,
    Door,
    PuzzleBlock,
    Player,
    Collectible,
    Projectile,
}

/// Rigid-body parameters for a spawned entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    /// 0 makes the body static
    pub mass: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub keep_awake: bool,
    pub ccd: bool,
}

impl PhysicsParams {
    pub fn fixed() -> Self {
        Self {
            mass: 0.0,
            friction: 0.5,
            rolling_friction: 0.0,
            keep_awake: false,
            ccd: false,
        }
    }

    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            friction: 4.0,
            rolling_friction: 1.0,
            keep_awake: false,
            ccd: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub shape: Shape,
    pub color: [f32; 4],
    /// `None` spawns a purely visual entity
    pub physics: Option<PhysicsParams>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub node: NodeId,
    pub body: Option<BodyHandle>,
}

pub struct World<P: PhysicsBackend> {
    pub physics: P,
    pub scene: SceneGraph,
    entities: BTreeMap<EntityId, Entity>,
    collectibles: BTreeSet<EntityId>,
    projectiles: Vec<EntityId>,
    player: Option<EntityId>,
    ground: Option<EntityId>,
    door: Option<EntityId>,
    puzzle_block: Option<EntityId>,
    next_id: u32,
}

impl<P: PhysicsBackend> World<P> {
    pub fn new(physics: P) -> Self {
        Self {
            physics,
            scene: SceneGraph::new(),
            entities: BTreeMap::new(),
            collectibles: BTreeSet::new(),
            projectiles: Vec::new(),
            player: None,
            ground: None,
            door: None,
            puzzle_block: None,
            next_id: 1,
        }
    }

    /// Create an entity with its mesh and (optional) body
    pub fn spawn(&mut self, kind: EntityKind, pose: Pose, params: SpawnParams) -> EntityId {
        let body = params.physics.map(|p| {
            self.physics.add_body(&BodyDesc {
                shape: params.shape,
                pose,
                mass: p.mass,
                friction: p.friction,
                rolling_friction: p.rolling_friction,
                keep_awake: p.keep_awake,
                ccd: p.ccd,
            })
        });
        let node = self.scene.add(MeshNode {
            shape: params.shape,
            color: params.color,
            pose,
        });

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity { id, kind, node, body });

        match kind {
            EntityKind::Collectible => {
                self.collectibles.insert(id);
            }
            EntityKind::Projectile => self.projectiles.push(id),
            EntityKind::Player => self.player = Some(id),
            EntityKind::Ground => self.ground = Some(id),
            EntityKind::Door => self.door = Some(id),
            EntityKind::PuzzleBlock => self.puzzle_block = Some(id),
            EntityKind::Wall | EntityKind::Platform => {}
        }
        id
    }

    /// Remove an entity from both collaborators and every list.
    /// Returns false if it was already gone.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        if let Some(body) = entity.body {
            self.physics.remove_body(body);
        }
        self.scene.remove(entity.node);

        self.collectibles.remove(&id);
        self.projectiles.retain(|p| *p != id);
        for slot in [
            &mut self.player,
            &mut self.ground,
            &mut self.door,
            &mut self.puzzle_block,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        true
    }

    /// Visit every tracked entity in id order
    pub fn for_each_tracked(&self, mut f: impl FnMut(&Entity)) {
        for entity in self.entities.values() {
            f(entity);
        }
    }

    /// Copy body poses into their meshes
    pub fn sync_transforms(&mut self) {
        for entity in self.entities.values() {
            let Some(body) = entity.body else { continue };
            if let Some(pose) = self.physics.pose(body) {
                self.scene.set_pose(entity.node, pose);
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn ground(&self) -> Option<EntityId> {
        self.ground
    }

    pub fn door(&self) -> Option<EntityId> {
        self.door
    }

    pub fn puzzle_block(&self) -> Option<EntityId> {
        self.puzzle_block
    }

    pub fn projectiles(&self) -> &[EntityId] {
        &self.projectiles
    }

    pub fn is_collectible(&self, id: EntityId) -> bool {
        self.collectibles.contains(&id)
    }

    pub fn collectible_count(&self) -> usize {
        self.collectibles.len()
    }

    /// Body handle of a live entity
    pub fn body_of(&self, id: Option<EntityId>) -> Option<BodyHandle> {
        self.entities.get(&id?)?.body
    }

    /// Current pose: the body's if it has one, otherwise the mesh's
    pub fn pose_of(&self, id: EntityId) -> Option<Pose> {
        let entity = self.entities.get(&id)?;
        match entity.body {
            Some(body) => self.physics.pose(body),
            None => self.scene.get(entity.node).map(|n| n.pose),
        }
    }

    /// Active collectibles with their current positions
    pub fn collectible_positions(&self) -> Vec<(EntityId, Vec3)> {
        self.collectibles
            .iter()
            .filter_map(|id| Some((*id, self.pose_of(*id)?.position)))
            .collect()
    }

    /// Move an entity and stop it
    pub fn teleport(&mut self, id: EntityId, position: Vec3) {
        let Some(entity) = self.entities.get(&id).copied() else {
            return;
        };
        let pose = Pose::at(position);
        if let Some(body) = entity.body {
            self.physics.set_pose(body, pose);
            self.physics.set_linear_velocity(body, Vec3::ZERO);
        }
        self.scene.set_pose(entity.node, pose);
    }

    pub fn spawn_player(&mut self, position: Vec3) -> EntityId {
        self.spawn(
            EntityKind::Player,
            Pose::at(position),
            SpawnParams {
                shape: Shape::Ball {
                    radius: PLAYER_RADIUS,
                },
                color: rgb(0xff0505),
                physics: Some(PhysicsParams {
                    keep_awake: true,
                    ..PhysicsParams::dynamic(1.0)
                }),
            },
        )
    }

    pub fn spawn_collectible(&mut self, position: Vec3) -> EntityId {
        self.spawn(
            EntityKind::Collectible,
            Pose::at(position),
            SpawnParams {
                shape: Shape::Ball {
                    radius: COLLECTIBLE_RADIUS,
                },
                color: rgb(0x0a64ff),
                physics: Some(PhysicsParams::dynamic(1.0)),
            },
        )
    }

    pub fn spawn_projectile(&mut self, position: Vec3, velocity: Vec3) -> EntityId {
        let id = self.spawn(
            EntityKind::Projectile,
            Pose::at(position),
            SpawnParams {
                shape: Shape::Ball {
                    radius: PROJECTILE_RADIUS,
                },
                color: rgb(0x3399ff),
                physics: Some(PhysicsParams {
                    ccd: true,
                    ..PhysicsParams::dynamic(1.0)
                }),
            },
        );
        if let Some(body) = self.body_of(Some(id)) {
            self.physics.set_linear_velocity(body, velocity);
        }
        id
    }

    fn spawn_block(&mut self, block: &BlockSpec) -> EntityId {
        self.spawn(
            block.kind,
            Pose::at(block.center),
            SpawnParams {
                shape: Shape::Cuboid { size: block.size },
                color: block.color,
                physics: Some(PhysicsParams::fixed()),
            },
        )
    }

    pub fn spawn_puzzle_block(&mut self, pose: Pose) -> EntityId {
        self.spawn(
            EntityKind::PuzzleBlock,
            pose,
            SpawnParams {
                shape: Shape::Cuboid {
                    size: Vec3::splat(PUZZLE_BLOCK_SIZE),
                },
                color: rgb(0xff8c00),
                physics: Some(PhysicsParams {
                    friction: 0.5,
                    rolling_friction: 0.0,
                    ..PhysicsParams::dynamic(1.0)
                }),
            },
        )
    }

    /// Build a room's geometry, puzzle block and collectibles.
    /// `collectibles` overrides the layout's ball positions (restores).
    /// Returns the number of collectibles placed.
    pub fn build_room(&mut self, layout: &RoomLayout, collectibles: Option<&[Vec3]>) -> usize {
        self.spawn_block(&layout.ground);
        for wall in &layout.walls {
            self.spawn_block(wall);
        }
        self.spawn_block(&layout.platform);
        if let Some(door) = &layout.door {
            self.spawn_block(door);
        }
        self.spawn_puzzle_block(layout.puzzle_block);

        let positions = collectibles.unwrap_or(&layout.collectibles);
        for &position in positions {
            self.spawn_collectible(position);
        }
        log::info!(
            "Built room {}: {} entities, {} collectibles",
            layout.index,
            self.len(),
            positions.len()
        );
        positions.len()
    }

    /// Destroy every entity except the player
    pub fn clear_room(&mut self) {
        let doomed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.kind != EntityKind::Player)
            .map(|e| e.id)
            .collect();
        for id in doomed {
            self.destroy(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::scripted::ScriptedPhysics;

    fn world() -> World<ScriptedPhysics> {
        World::new(ScriptedPhysics::new())
    }

    #[test]
    fn test_spawn_creates_both_handles() {
        let mut world = world();
        let id = world.spawn_collectible(Vec3::new(1.0, 2.5, 3.0));
        let entity = *world.get(id).unwrap();

        assert!(world.scene.get(entity.node).is_some());
        assert!(world.physics.contains(entity.body.unwrap()));
        assert!(world.is_collectible(id));
    }

    #[test]
    fn test_destroy_removes_both_handles_once() {
        let mut world = world();
        let id = world.spawn_collectible(Vec3::ZERO);
        let entity = *world.get(id).unwrap();

        assert!(world.destroy(id));
        assert!(world.scene.get(entity.node).is_none());
        assert!(!world.physics.contains(entity.body.unwrap()));
        assert!(!world.is_collectible(id));

        assert!(!world.destroy(id));
    }

    #[test]
    fn test_visual_only_entity() {
        let mut world = world();
        let id = world.spawn(
            EntityKind::Wall,
            Pose::IDENTITY,
            SpawnParams {
                shape: Shape::Cuboid { size: Vec3::ONE },
                color: [1.0; 4],
                physics: None,
            },
        );
        assert_eq!(world.get(id).unwrap().body, None);
        assert_eq!(world.pose_of(id), Some(Pose::IDENTITY));
        assert!(world.physics.bodies.is_empty());
    }

    #[test]
    fn test_build_and_clear_room_keeps_player() {
        let mut world = world();
        let layout = RoomLayout::for_room(1, 5);
        let player = world.spawn_player(layout.player_spawn);
        let placed = world.build_room(&layout, None);

        assert_eq!(placed, layout.collectibles.len());
        assert!(world.door().is_some());
        assert!(world.puzzle_block().is_some());
        assert!(world.ground().is_some());

        world.clear_room();
        assert_eq!(world.len(), 1);
        assert_eq!(world.player(), Some(player));
        assert_eq!(world.door(), None);
        assert_eq!(world.puzzle_block(), None);
        assert_eq!(world.collectible_count(), 0);
        assert_eq!(world.scene.len(), 1);
        assert_eq!(world.physics.bodies.len(), 1);
    }

    #[test]
    fn test_sync_transforms_follows_bodies() {
        let mut world = world();
        let id = world.spawn_projectile(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        world.physics.step(0.5);
        world.sync_transforms();

        let node = world.get(id).unwrap().node;
        let pose = world.scene.get(node).unwrap().pose;
        assert!((pose.position.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_for_each_tracked_visits_in_id_order() {
        let mut world = world();
        let a = world.spawn_collectible(Vec3::ZERO);
        let b = world.spawn_collectible(Vec3::ONE);
        let mut seen = Vec::new();
        world.for_each_tracked(|e| seen.push(e.id));
        assert_eq!(seen, vec![a, b]);
    }
}
