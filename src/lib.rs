//! Knockdown - collect balls, shoot them, topple the cube
//!
//! Core modules:
//! - `sim`: Gameplay state, world model, interaction controller, frame driver
//! - `physics`: Physics collaborator trait and its rapier3d backend
//! - `renderer`: Scene graph and WebGPU mesh pipeline
//! - `camera` / `input`: Orbit camera, screen rays, pointer translation
//! - `persistence`: Versioned save envelope in LocalStorage
//! - `platform`: Browser DOM helpers

pub mod camera;
pub mod hud;
pub mod input;
pub mod persistence;
pub mod physics;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed physics sub-step (seconds)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Maximum physics sub-steps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 10;
    /// Frames longer than this are clamped (tab switches, breakpoints)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// World gravity along -Y
    pub const GRAVITY: f32 = 10.0;

    /// Horizontal speed while walking to a clicked point
    pub const MOVE_SPEED: f32 = 20.0;
    /// Squared horizontal distance at which a move target counts as reached
    pub const ARRIVE_DISTANCE_SQ: f32 = 1.0;
    /// Central force applied while a roll key is held
    pub const KEY_ROLL_FORCE: f32 = 40.0;

    /// Projectile launch speed
    pub const SHOOT_SPEED: f32 = 100.0;
    /// Projectiles spawn this far above the player's centre
    pub const SHOOT_SPAWN_OFFSET: f32 = 3.0;
    /// Screen-space pick radius for equipping a ball (CSS pixels)
    pub const EQUIP_PICK_RADIUS_PX: f32 = 30.0;

    /// Delay before the out-of-ammo lose re-check (seconds)
    pub const LOSE_CHECK_DELAY: f64 = 3.0;
    /// Collectible balls placed in every room
    pub const BALLS_PER_ROOM: usize = 8;
    /// Snapshots kept for undo
    pub const UNDO_DEPTH: usize = 16;

    /// Entity sizes
    pub const PLAYER_RADIUS: f32 = 2.0;
    pub const COLLECTIBLE_RADIUS: f32 = 1.5;
    pub const PROJECTILE_RADIUS: f32 = 1.0;
    pub const PUZZLE_BLOCK_SIZE: f32 = 4.0;

    /// Top surface of the ground slab; move and aim rays hit this plane
    pub const GROUND_TOP: f32 = 1.0;
}

/// sRGB-ish colour from a 0xRRGGBB literal
#[inline]
pub fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Drop the vertical component of a vector
#[inline]
pub fn horizontal(v: glam::Vec3) -> glam::Vec3 {
    glam::Vec3::new(v.x, 0.0, v.z)
}
