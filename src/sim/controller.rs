//! Interaction controller
//!
//! Turns semantic input actions and per-frame contact queries into game state
//! changes: ball pickup, shooting, room transitions, win and lose. Per-frame
//! evaluation order is fixed: move, any-contact, door, puzzle floor, then the
//! delayed lose check.

use glam::Vec3;

use super::history;
use super::layout::{FINAL_ROOM, RoomLayout};
use super::state::{GameEvent, GameSession, Outcome, RoomState};
use super::world::{EntityId, World};
use crate::consts::*;
use crate::horizontal;
use crate::input::PointerAction;
use crate::physics::PhysicsBackend;

/// Spawn the player and build the first room
pub fn start_session<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>) {
    log::info!("Starting session with seed {}", session.seed);
    enter_room(session, world, 1);
    session.emit_ball_count();
}

/// Replace the current room with room `index`.
///
/// Everything but the player is destroyed, the layout is rebuilt, and the
/// room flags start over. Ball counters carry across rooms, minus the
/// collectibles left behind in the old one.
pub fn enter_room<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>, index: u32) {
    session.room.cancel_lose_check();
    let abandoned = world.collectible_count() as u32;
    if abandoned > 0 {
        log::debug!("Leaving {abandoned} uncollected balls behind");
    }
    session.total_balls = session.total_balls.saturating_sub(abandoned);
    world.clear_room();

    let layout = RoomLayout::for_room(index, session.seed);
    let placed = world.build_room(&layout, None);
    session.total_balls += placed as u32;

    match world.player() {
        Some(player) => world.teleport(player, layout.player_spawn),
        None => {
            world.spawn_player(layout.player_spawn);
        }
    }
    world.sync_transforms();

    session.room = RoomState::new(index);
    session.move_target = None;
    session.emit(GameEvent::RoomEntered { index });
}

/// Pick up a collectible. No-op if the ball is no longer active.
pub fn equip<P: PhysicsBackend>(
    session: &mut GameSession,
    world: &mut World<P>,
    ball: EntityId,
) -> bool {
    if !world.is_collectible(ball) {
        log::trace!("Equip ignored, {:?} is not an active collectible", ball);
        return false;
    }
    session.history.push(history::capture(session, world));

    world.destroy(ball);
    session.held_balls += 1;
    session.balls_collected += 1;
    session.can_shoot = true;

    session.emit(GameEvent::Equipped { ball });
    session.emit_ball_count();
    true
}

pub fn move_to(session: &mut GameSession, point: Vec3) {
    session.move_target = Some(point);
}

pub fn set_aim(session: &mut GameSession, point: Option<Vec3>) {
    if point.is_some() {
        session.aim_point = point;
    }
}

/// Dispatch a translated pointer-down
pub fn apply_pointer<P: PhysicsBackend>(
    session: &mut GameSession,
    world: &mut World<P>,
    action: PointerAction,
) {
    match action {
        PointerAction::Equip(ball) => {
            equip(session, world, ball);
        }
        PointerAction::MoveTo(point) => move_to(session, point),
        PointerAction::None => {}
    }
}

/// Horizontal unit direction from `from` toward the aim point
fn aim_direction(from: Vec3, aim: Option<Vec3>) -> Vec3 {
    aim.map(|target| horizontal(target - from).normalize_or_zero())
        .filter(|dir| *dir != Vec3::ZERO)
        .unwrap_or(Vec3::NEG_Z)
}

/// Fire one held ball toward the aim point
pub fn shoot<P: PhysicsBackend>(
    session: &mut GameSession,
    world: &mut World<P>,
) -> Option<EntityId> {
    if !session.can_shoot || session.held_balls == 0 {
        return None;
    }
    let origin = world
        .player()
        .and_then(|id| world.pose_of(id))?
        .position;

    session.history.push(history::capture(session, world));

    let velocity = aim_direction(origin, session.aim_point) * SHOOT_SPEED;
    let spawn_at = origin + Vec3::new(0.0, SHOOT_SPAWN_OFFSET, 0.0);
    let projectile = world.spawn_projectile(spawn_at, velocity);

    session.held_balls -= 1;
    session.balls_used += 1;
    log::debug!(
        "Shot {:?}: {} held, {}/{} used",
        projectile,
        session.held_balls,
        session.balls_used,
        session.total_balls
    );

    session.emit(GameEvent::Shot { projectile });
    session.emit_ball_count();
    Some(projectile)
}

/// Push the player along `direction` while it is on something
pub fn roll<P: PhysicsBackend>(session: &GameSession, world: &mut World<P>, direction: Vec3) {
    let dir = horizontal(direction).normalize_or_zero();
    if dir == Vec3::ZERO || !session.player_grounded {
        return;
    }
    if let Some(body) = world.body_of(world.player()) {
        world.physics.apply_central_force(body, dir * KEY_ROLL_FORCE);
    }
}

/// Restore the most recent snapshot.
///
/// A room's outcome is decided once: rewinding within the same room keeps
/// the verdict and its popup flag.
pub fn undo<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>) -> bool {
    let Some(snapshot) = session.history.pop() else {
        log::debug!("Nothing to undo");
        return false;
    };
    let decided = session.room.clone();
    history::restore(session, world, &snapshot);
    if decided.outcome_decided && decided.index == session.room.index {
        session.room.outcome_decided = true;
        session.room.outcome = decided.outcome;
        session.room.popup_shown = decided.popup_shown;
    }
    true
}

/// Re-evaluate state once per frame, after physics has stepped
pub fn update<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>) {
    steer(session, world);
    check_grounded(session, world);
    check_door(session, world);
    check_puzzle_floor(session, world);
    run_due_lose_check(session, world);
}

fn steer<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>) {
    let Some(target) = session.move_target else {
        return;
    };
    let Some(body) = world.body_of(world.player()) else {
        return;
    };
    let (Some(pose), Some(velocity)) = (
        world.physics.pose(body),
        world.physics.linear_velocity(body),
    ) else {
        return;
    };

    let to_target = horizontal(target - pose.position);
    let planar = if to_target.length_squared() < ARRIVE_DISTANCE_SQ {
        session.move_target = None;
        Vec3::ZERO
    } else {
        to_target.normalize() * MOVE_SPEED
    };
    // Vertical velocity belongs to gravity
    world
        .physics
        .set_linear_velocity(body, Vec3::new(planar.x, velocity.y, planar.z));
}

fn check_grounded<P: PhysicsBackend>(session: &mut GameSession, world: &World<P>) {
    session.player_grounded = world
        .body_of(world.player())
        .is_some_and(|body| world.physics.contact_test(body).has_contact);
}

fn check_door<P: PhysicsBackend>(session: &mut GameSession, world: &mut World<P>) {
    if session.room.index >= FINAL_ROOM {
        return;
    }
    let (Some(player), Some(door)) = (world.body_of(world.player()), world.body_of(world.door()))
    else {
        return;
    };
    if world.physics.contact_pair_test(player, door).has_contact {
        let next = session.room.index + 1;
        log::info!("Door reached, entering room {next}");
        enter_room(session, world, next);
    }
}

fn block_on_floor<P: PhysicsBackend>(world: &World<P>) -> Option<bool> {
    let block = world.body_of(world.puzzle_block())?;
    let ground = world.body_of(world.ground())?;
    Some(world.physics.contact_pair_test(block, ground).has_contact)
}

fn check_puzzle_floor<P: PhysicsBackend>(session: &mut GameSession, world: &World<P>) {
    if session.room.popup_shown {
        return;
    }
    let Some(on_floor) = block_on_floor(world) else {
        return;
    };

    if on_floor {
        session.room.popup_shown = true;
        session.room.cancel_lose_check();
        if session.room.decide(Outcome::Win) {
            log::info!("Room {} won", session.room.index);
            let room = session.room.index;
            session.emit(GameEvent::Won { room });
        }
    } else if session.out_of_ammo() {
        session.schedule_lose_check();
    }
}

fn run_due_lose_check<P: PhysicsBackend>(session: &mut GameSession, world: &World<P>) {
    let Some(timer) = session.take_due_lose_check() else {
        return;
    };
    if session.room.outcome_decided {
        log::debug!("Lose check {:?} skipped, outcome already decided", timer.token);
        return;
    }
    // Block missing mid-rebuild: no verdict
    if block_on_floor(world) != Some(false) {
        return;
    }
    if session.room.decide(Outcome::Lose) {
        log::info!("Room {} lost", session.room.index);
        let room = session.room.index;
        session.emit(GameEvent::Lost { room });
    }
}
