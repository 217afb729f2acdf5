//! Snapshots for undo and save/load

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::layout::{FINAL_ROOM, RoomLayout};
use super::state::{GameEvent, GameSession, Outcome, RoomState};
use super::world::World;
use crate::physics::{PhysicsBackend, Pose};

/// Serializable subset of session + world state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub seed: u64,
    pub room_index: u32,
    pub held_balls: u32,
    pub balls_used: u32,
    pub balls_collected: u32,
    pub total_balls: u32,
    pub can_shoot: bool,
    pub popup_shown: bool,
    pub outcome: Option<Outcome>,
    pub player_position: Vec3,
    pub puzzle_block: Option<Pose>,
    pub collectibles: Vec<Vec3>,
}

impl SessionSnapshot {
    /// Counters obey `held + used <= collected <= total` and the room exists
    pub fn is_consistent(&self) -> bool {
        let spent = self.held_balls.checked_add(self.balls_used);
        (1..=FINAL_ROOM).contains(&self.room_index)
            && spent.is_some_and(|spent| spent <= self.balls_collected)
            && self.balls_collected <= self.total_balls
    }
}

/// Bounded undo stack; the oldest snapshot falls off the bottom
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<SessionSnapshot>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: SessionSnapshot) {
        if self.capacity == 0 {
            return;
        }
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<SessionSnapshot> {
        self.snapshots.pop_back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Capture the current state
pub fn capture<P: PhysicsBackend>(session: &GameSession, world: &World<P>) -> SessionSnapshot {
    let player_position = world
        .player()
        .and_then(|id| world.pose_of(id))
        .map(|p| p.position)
        .unwrap_or(Vec3::ZERO);

    SessionSnapshot {
        seed: session.seed,
        room_index: session.room.index,
        held_balls: session.held_balls,
        balls_used: session.balls_used,
        balls_collected: session.balls_collected,
        total_balls: session.total_balls,
        can_shoot: session.can_shoot,
        popup_shown: session.room.popup_shown,
        outcome: session.room.outcome,
        player_position,
        puzzle_block: world.puzzle_block().and_then(|id| world.pose_of(id)),
        collectibles: world
            .collectible_positions()
            .into_iter()
            .map(|(_, pos)| pos)
            .collect(),
    }
}

/// Replace the session and the room with a snapshot.
///
/// The room is rebuilt from its layout with the saved collectibles, so
/// projectiles in flight are gone afterwards.
pub fn restore<P: PhysicsBackend>(
    session: &mut GameSession,
    world: &mut World<P>,
    snapshot: &SessionSnapshot,
) {
    session.room.cancel_lose_check();

    world.clear_room();
    let layout = RoomLayout::for_room(snapshot.room_index, snapshot.seed);
    world.build_room(&layout, Some(&snapshot.collectibles));

    if let (Some(pose), Some(block)) = (snapshot.puzzle_block, world.puzzle_block()) {
        if let Some(body) = world.body_of(Some(block)) {
            world.physics.set_pose(body, pose);
        }
    }
    match world.player() {
        Some(player) => world.teleport(player, snapshot.player_position),
        None => {
            world.spawn_player(snapshot.player_position);
        }
    }
    world.sync_transforms();

    session.seed = snapshot.seed;
    session.held_balls = snapshot.held_balls;
    session.balls_used = snapshot.balls_used;
    session.balls_collected = snapshot.balls_collected;
    session.total_balls = snapshot.total_balls;
    session.can_shoot = snapshot.can_shoot;
    session.move_target = None;
    session.room = RoomState {
        index: snapshot.room_index,
        popup_shown: snapshot.popup_shown,
        outcome_decided: snapshot.outcome.is_some(),
        outcome: snapshot.outcome,
        pending_lose_check: None,
    };

    log::info!(
        "Restored room {} with {} held, {} collectibles",
        snapshot.room_index,
        snapshot.held_balls,
        snapshot.collectibles.len()
    );
    session.emit(GameEvent::Restored {
        room: snapshot.room_index,
    });
    session.emit_ball_count();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(held: u32) -> SessionSnapshot {
        SessionSnapshot {
            seed: 0,
            room_index: 1,
            held_balls: held,
            balls_used: 0,
            balls_collected: held,
            total_balls: 8,
            can_shoot: held > 0,
            popup_shown: false,
            outcome: None,
            player_position: Vec3::ZERO,
            puzzle_block: None,
            collectibles: Vec::new(),
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = History::new(3);
        for held in 0..5 {
            history.push(snapshot(held));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.pop().map(|s| s.held_balls), Some(4));
        assert_eq!(history.pop().map(|s| s.held_balls), Some(3));
        assert_eq!(history.pop().map(|s| s.held_balls), Some(2));
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = History::new(0);
        history.push(snapshot(1));
        assert!(history.is_empty());
    }
}
