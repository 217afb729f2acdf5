//! Room layouts
//!
//! Static geometry is fixed per room; collectible placement is jittered by a
//! seeded RNG so a given seed always produces the same room.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::world::EntityKind;
use crate::consts::{BALLS_PER_ROOM, COLLECTIBLE_RADIUS, GROUND_TOP, PLAYER_RADIUS, PUZZLE_BLOCK_SIZE};
use crate::physics::Pose;
use crate::rgb;

/// Last room; the door only exists before it
pub const FINAL_ROOM: u32 = 2;

const WALL_HEIGHT: f32 = 10.0;
const WALL_THICKNESS: f32 = 2.0;

/// A static box in a room
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    pub kind: EntityKind,
    pub center: Vec3,
    pub size: Vec3,
    pub color: [f32; 4],
}

impl BlockSpec {
    fn new(kind: EntityKind, center: Vec3, size: Vec3, color: u32) -> Self {
        Self {
            kind,
            center,
            size,
            color: rgb(color),
        }
    }

    /// Height of the top face
    pub fn top(&self) -> f32 {
        self.center.y + self.size.y * 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomLayout {
    pub index: u32,
    pub player_spawn: Vec3,
    pub ground: BlockSpec,
    pub walls: Vec<BlockSpec>,
    /// Pedestal the puzzle block starts on
    pub platform: BlockSpec,
    pub door: Option<BlockSpec>,
    pub puzzle_block: Pose,
    pub collectibles: Vec<Vec3>,
}

/// Per-room parameters
struct RoomParams {
    half_extent: f32,
    ground_color: u32,
    wall_color: u32,
    platform_center: (f32, f32),
    platform_size: Vec3,
    ring_center: (f32, f32),
    ring_radius: f32,
    spawn_z: f32,
}

fn room_params(index: u32) -> RoomParams {
    match index {
        1 => RoomParams {
            half_extent: 50.0,
            ground_color: 0xa0afa4,
            wall_color: 0x8a9aa8,
            platform_center: (0.0, -20.0),
            platform_size: Vec3::new(8.0, 2.0, 8.0),
            ring_center: (0.0, 10.0),
            ring_radius: 18.0,
            spawn_z: 40.0,
        },
        // Bigger room, narrower and taller pedestal off to the side
        _ => RoomParams {
            half_extent: 70.0,
            ground_color: 0x9aa89e,
            wall_color: 0x6b7b8c,
            platform_center: (25.0, -35.0),
            platform_size: Vec3::new(5.0, 4.0, 5.0),
            ring_center: (0.0, 15.0),
            ring_radius: 26.0,
            spawn_z: 58.0,
        },
    }
}

impl RoomLayout {
    /// Layout of room `index` (rooms past the last reuse its layout)
    pub fn for_room(index: u32, seed: u64) -> Self {
        let p = room_params(index);
        let ground_y = GROUND_TOP - 1.0;

        let ground = BlockSpec::new(
            EntityKind::Ground,
            Vec3::new(0.0, ground_y, 0.0),
            Vec3::new(p.half_extent * 2.0, 2.0, p.half_extent * 2.0),
            p.ground_color,
        );

        let wall_y = GROUND_TOP + WALL_HEIGHT * 0.5;
        let offset = p.half_extent + WALL_THICKNESS * 0.5;
        let span = p.half_extent * 2.0 + WALL_THICKNESS * 2.0;
        let walls = vec![
            BlockSpec::new(
                EntityKind::Wall,
                Vec3::new(0.0, wall_y, -offset),
                Vec3::new(span, WALL_HEIGHT, WALL_THICKNESS),
                p.wall_color,
            ),
            BlockSpec::new(
                EntityKind::Wall,
                Vec3::new(0.0, wall_y, offset),
                Vec3::new(span, WALL_HEIGHT, WALL_THICKNESS),
                p.wall_color,
            ),
            BlockSpec::new(
                EntityKind::Wall,
                Vec3::new(-offset, wall_y, 0.0),
                Vec3::new(WALL_THICKNESS, WALL_HEIGHT, span),
                p.wall_color,
            ),
            BlockSpec::new(
                EntityKind::Wall,
                Vec3::new(offset, wall_y, 0.0),
                Vec3::new(WALL_THICKNESS, WALL_HEIGHT, span),
                p.wall_color,
            ),
        ];

        let (px, pz) = p.platform_center;
        let platform = BlockSpec::new(
            EntityKind::Platform,
            Vec3::new(px, GROUND_TOP + p.platform_size.y * 0.5, pz),
            p.platform_size,
            0x808080,
        );

        let puzzle_block = Pose {
            position: Vec3::new(px, platform.top() + PUZZLE_BLOCK_SIZE * 0.5, pz),
            rotation: Quat::IDENTITY,
        };

        // Door sits flush against the inside of the far wall
        let door = (index < FINAL_ROOM).then(|| {
            BlockSpec::new(
                EntityKind::Door,
                Vec3::new(0.0, GROUND_TOP + 5.0, -(p.half_extent - 1.0)),
                Vec3::new(10.0, 10.0, 1.0),
                0x8b5a2b,
            )
        });

        Self {
            index,
            player_spawn: Vec3::new(0.0, GROUND_TOP + PLAYER_RADIUS + 1.0, p.spawn_z),
            ground,
            walls,
            platform,
            door,
            puzzle_block,
            collectibles: scatter_collectibles(&p, index, seed),
        }
    }

    /// Height of the plane that move and aim rays are cast against
    pub fn ground_top(&self) -> f32 {
        self.ground.top()
    }
}

/// Balls on a ring with seeded angle and radius jitter
fn scatter_collectibles(p: &RoomParams, index: u32, seed: u64) -> Vec<Vec3> {
    let mut rng = Pcg32::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let (cx, cz) = p.ring_center;
    let step = TAU / BALLS_PER_ROOM as f32;

    (0..BALLS_PER_ROOM)
        .map(|i| {
            let theta = i as f32 * step + rng.random_range(-0.2..0.2);
            let r = p.ring_radius + rng.random_range(-3.0..3.0);
            Vec3::new(
                cx + r * theta.cos(),
                GROUND_TOP + COLLECTIBLE_RADIUS,
                cz + r * theta.sin(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_deterministic_per_seed() {
        let a = RoomLayout::for_room(1, 42);
        let b = RoomLayout::for_room(1, 42);
        let c = RoomLayout::for_room(1, 43);
        assert_eq!(a, b);
        assert_ne!(a.collectibles, c.collectibles);
    }

    #[test]
    fn test_only_first_room_has_door() {
        assert!(RoomLayout::for_room(1, 7).door.is_some());
        assert!(RoomLayout::for_room(2, 7).door.is_none());
    }

    #[test]
    fn test_collectibles_inside_walls() {
        for index in 1..=FINAL_ROOM {
            let layout = RoomLayout::for_room(index, 99);
            let half = layout.ground.size.x * 0.5;
            assert_eq!(layout.collectibles.len(), BALLS_PER_ROOM);
            for ball in &layout.collectibles {
                assert!(ball.x.abs() < half && ball.z.abs() < half);
                assert!((ball.y - (GROUND_TOP + COLLECTIBLE_RADIUS)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_puzzle_block_rests_on_platform() {
        let layout = RoomLayout::for_room(2, 0);
        let bottom = layout.puzzle_block.position.y - PUZZLE_BLOCK_SIZE * 0.5;
        assert!((bottom - layout.platform.top()).abs() < 1e-5);
        assert!(layout.platform.top() > layout.ground_top());
    }
}
