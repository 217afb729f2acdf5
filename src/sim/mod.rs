//! Gameplay simulation
//!
//! All gameplay rules live here. Physics is reached only through
//! `PhysicsBackend`, so everything in this module runs headless:
//! - Session state in one owned struct, no globals
//! - Seeded RNG only (room layouts)
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies beyond the scene graph

pub mod controller;
pub mod history;
pub mod layout;
pub mod state;
pub mod tick;
pub mod world;

pub use history::{History, SessionSnapshot};
pub use layout::{FINAL_ROOM, RoomLayout};
pub use state::{GameEvent, GameSession, Outcome, OutcomeTimer, RoomState, TimerToken};
pub use tick::{FrameInput, frame};
pub use world::{Entity, EntityId, EntityKind, PhysicsParams, SpawnParams, World};
