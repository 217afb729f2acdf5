//! Frame driver
//!
//! One call per rendered frame: physics first, then the controller, then the
//! scene graph catches up with the bodies. The host draws afterwards.

use glam::Vec3;

use super::controller;
use super::state::{GameEvent, GameSession};
use super::world::World;
use crate::consts::MAX_FRAME_DT;
use crate::physics::PhysicsBackend;

/// Held-key state sampled for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// World-space roll direction from the movement keys (zero when idle)
    pub roll: Vec3,
}

/// Advance the game by one rendered frame of `dt` seconds
pub fn frame<P: PhysicsBackend>(
    session: &mut GameSession,
    world: &mut World<P>,
    input: &FrameInput,
    dt: f32,
) -> Vec<GameEvent> {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    session.clock += f64::from(dt);

    // Forces are cleared after every step
    controller::roll(session, world, input.roll);
    world.physics.step(dt);

    controller::update(session, world);
    world.sync_transforms();

    session.drain_events()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LOSE_CHECK_DELAY;
    use crate::physics::scripted::ScriptedPhysics;
    use crate::physics::RapierWorld;
    use crate::sim::controller::{equip, shoot, start_session};
    use crate::sim::state::Outcome;

    #[test]
    fn test_frame_clamps_dt() {
        let mut session = GameSession::new(3);
        let mut world = World::new(ScriptedPhysics::new());
        start_session(&mut session, &mut world);

        frame(&mut session, &mut world, &FrameInput::default(), 5.0);
        assert!((session.clock - f64::from(MAX_FRAME_DT)).abs() < 1e-9);

        frame(&mut session, &mut world, &FrameInput::default(), f32::NAN);
        frame(&mut session, &mut world, &FrameInput::default(), -1.0);
        assert!((session.clock - f64::from(MAX_FRAME_DT)).abs() < 1e-9);
    }

    #[test]
    fn test_frame_drains_events() {
        let mut session = GameSession::new(3);
        let mut world = World::new(ScriptedPhysics::new());
        start_session(&mut session, &mut world);

        let events = frame(&mut session, &mut world, &FrameInput::default(), 0.016);
        assert!(events.contains(&GameEvent::RoomEntered { index: 1 }));
        assert!(frame(&mut session, &mut world, &FrameInput::default(), 0.016).is_empty());
    }

    #[test]
    fn test_projectile_moves_in_scene_graph() {
        let mut session = GameSession::new(3);
        let mut world = World::new(ScriptedPhysics::new());
        start_session(&mut session, &mut world);
        let ball = world.collectible_positions()[0].0;
        equip(&mut session, &mut world, ball);
        let projectile = shoot(&mut session, &mut world).unwrap();
        let start = world.pose_of(projectile).unwrap().position;

        frame(&mut session, &mut world, &FrameInput::default(), 0.05);

        let node = world.get(projectile).unwrap().node;
        let now = world.scene.get(node).unwrap().pose.position;
        assert!((start - now).length() > 1.0);
    }

    #[test]
    fn test_lose_check_fires_on_frame_clock() {
        let mut session = GameSession::new(3);
        let mut world = World::new(ScriptedPhysics::new());
        start_session(&mut session, &mut world);
        while let Some((ball, _)) = world.collectible_positions().first().copied() {
            equip(&mut session, &mut world, ball);
        }
        while shoot(&mut session, &mut world).is_some() {}
        session.drain_events();

        let mut lost = 0;
        let frames = (LOSE_CHECK_DELAY / 0.05) as usize + 5;
        for _ in 0..frames {
            let events = frame(&mut session, &mut world, &FrameInput::default(), 0.05);
            lost += events
                .iter()
                .filter(|e| matches!(e, GameEvent::Lost { .. }))
                .count();
        }
        assert_eq!(lost, 1);
        assert_eq!(session.room.outcome, Some(Outcome::Lose));
    }

    #[test]
    fn test_player_settles_on_ground_with_rapier() {
        let mut session = GameSession::new(11);
        let mut world = World::new(RapierWorld::new());
        start_session(&mut session, &mut world);

        for _ in 0..120 {
            frame(&mut session, &mut world, &FrameInput::default(), 1.0 / 60.0);
        }
        assert!(session.player_grounded);
        assert_eq!(session.room.outcome, None);
    }
}
