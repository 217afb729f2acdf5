//! Session and room state
//!
//! Everything the gameplay rules mutate lives in `GameSession`. The world
//! (bodies, meshes) lives in `World`; the two are passed side by side.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::history::History;
use super::world::EntityId;
use crate::consts::{LOSE_CHECK_DELAY, UNDO_DEPTH};

/// How a room ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The puzzle block reached the floor
    Win,
    /// Out of balls and the block is still up
    Lose,
}

/// Identifies one scheduled lose re-check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerToken(pub u32);

/// A pending, cancellable lose re-check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeTimer {
    pub token: TimerToken,
    /// Session clock (seconds) at which the re-check runs
    pub due_at: f64,
}

/// Per-room progression flags
#[derive(Debug, Clone, PartialEq)]
pub struct RoomState {
    /// 1-based room number
    pub index: u32,
    /// Win popup already shown; stops further floor checks
    pub popup_shown: bool,
    /// Win or lose has been announced for this room
    pub outcome_decided: bool,
    pub outcome: Option<Outcome>,
    /// At most one per room
    pub pending_lose_check: Option<OutcomeTimer>,
}

impl RoomState {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            popup_shown: false,
            outcome_decided: false,
            outcome: None,
            pending_lose_check: None,
        }
    }

    /// Drop the pending lose re-check, if any
    pub fn cancel_lose_check(&mut self) -> Option<OutcomeTimer> {
        let cancelled = self.pending_lose_check.take();
        if let Some(timer) = cancelled {
            log::debug!("Room {}: cancelled lose check {:?}", self.index, timer.token);
        }
        cancelled
    }

    /// Record the room's outcome. Returns false if one was already decided.
    pub fn decide(&mut self, outcome: Outcome) -> bool {
        if self.outcome_decided {
            return false;
        }
        self.outcome_decided = true;
        self.outcome = Some(outcome);
        true
    }
}

/// Player-visible state changes, drained once per frame by the host
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Ball counter needs refreshing
    BallCountChanged { held: u32 },
    Equipped { ball: EntityId },
    Shot { projectile: EntityId },
    RoomEntered { index: u32 },
    Won { room: u32 },
    Lost { room: u32 },
    /// Undo or load replaced the session
    Restored { room: u32 },
}

/// The whole mutable game session
#[derive(Debug)]
pub struct GameSession {
    /// Seed for room layouts
    pub seed: u64,
    /// Balls in reserve
    pub held_balls: u32,
    /// Balls shot so far
    pub balls_used: u32,
    /// Balls ever equipped
    pub balls_collected: u32,
    /// Balls collected so far plus those still lying in the current room
    pub total_balls: u32,
    /// Set by the first equip; stays set (shared ammo pool)
    pub can_shoot: bool,
    pub move_target: Option<Vec3>,
    pub aim_point: Option<Vec3>,
    /// Player touched anything during the last contact check
    pub player_grounded: bool,
    pub room: RoomState,
    /// Simulated seconds since the session started
    pub clock: f64,
    pub history: History,
    events: Vec<GameEvent>,
    next_timer: u32,
}

impl GameSession {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            held_balls: 0,
            balls_used: 0,
            balls_collected: 0,
            total_balls: 0,
            can_shoot: false,
            move_target: None,
            aim_point: None,
            player_grounded: false,
            room: RoomState::new(1),
            clock: 0.0,
            history: History::new(UNDO_DEPTH),
            events: Vec::new(),
            next_timer: 1,
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn emit_ball_count(&mut self) {
        let held = self.held_balls;
        self.emit(GameEvent::BallCountChanged { held });
    }

    /// No balls in reserve and every placed ball has been shot
    pub fn out_of_ammo(&self) -> bool {
        self.total_balls > 0 && self.held_balls == 0 && self.balls_used == self.total_balls
    }

    /// Schedule the lose re-check unless one is already pending
    pub fn schedule_lose_check(&mut self) -> Option<TimerToken> {
        if self.room.pending_lose_check.is_some() || self.room.outcome_decided {
            return None;
        }
        let token = TimerToken(self.next_timer);
        self.next_timer += 1;
        self.room.pending_lose_check = Some(OutcomeTimer {
            token,
            due_at: self.clock + LOSE_CHECK_DELAY,
        });
        log::debug!(
            "Room {}: out of balls, lose check {:?} in {}s",
            self.room.index,
            token,
            LOSE_CHECK_DELAY
        );
        Some(token)
    }

    /// Take the pending lose re-check if its time has come
    pub fn take_due_lose_check(&mut self) -> Option<OutcomeTimer> {
        match self.room.pending_lose_check {
            Some(timer) if self.clock >= timer.due_at => self.room.pending_lose_check.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_decides_once() {
        let mut room = RoomState::new(1);
        assert!(room.decide(Outcome::Win));
        assert!(!room.decide(Outcome::Lose));
        assert_eq!(room.outcome, Some(Outcome::Win));
    }

    #[test]
    fn test_single_pending_lose_check() {
        let mut session = GameSession::new(1);
        let first = session.schedule_lose_check();
        assert!(first.is_some());
        assert_eq!(session.schedule_lose_check(), None);

        session.room.cancel_lose_check();
        let second = session.schedule_lose_check();
        assert!(second.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn test_lose_check_due_after_delay() {
        let mut session = GameSession::new(1);
        session.schedule_lose_check();

        session.clock += LOSE_CHECK_DELAY - 0.5;
        assert!(session.take_due_lose_check().is_none());

        session.clock += 0.5;
        assert!(session.take_due_lose_check().is_some());
        assert!(session.room.pending_lose_check.is_none());
    }

    #[test]
    fn test_out_of_ammo() {
        let mut session = GameSession::new(1);
        assert!(!session.out_of_ammo(), "nothing placed yet");

        session.total_balls = 8;
        session.balls_used = 8;
        assert!(session.out_of_ammo());

        session.held_balls = 1;
        assert!(!session.out_of_ammo());
    }

    #[test]
    fn test_drain_events() {
        let mut session = GameSession::new(1);
        session.emit_ball_count();
        session.emit(GameEvent::Won { room: 1 });
        let events = session.drain_events();
        assert_eq!(events.len(), 2);
        assert!(session.drain_events().is_empty());
    }
}
