//! Input translation
//!
//! Raw pointer and keyboard events become semantic actions here. Nothing in
//! this module touches game state; the controller applies the results.

use glam::{Vec2, Vec3};

use crate::camera::{OrbitCamera, Viewport};
use crate::consts::EQUIP_PICK_RADIUS_PX;
use crate::sim::EntityId;

/// What a left-button press means
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// Pick up this collectible
    Equip(EntityId),
    /// Walk to this ground point
    MoveTo(Vec3),
    /// Clicked the sky (or the viewport is unusable)
    None,
}

/// Closest collectible within the pick radius of `cursor`
pub fn pick_collectible(
    camera: &OrbitCamera,
    viewport: Viewport,
    cursor: Vec2,
    collectibles: &[(EntityId, Vec3)],
) -> Option<EntityId> {
    let radius_sq = EQUIP_PICK_RADIUS_PX * EQUIP_PICK_RADIUS_PX;
    let mut best: Option<(EntityId, f32)> = None;

    for &(id, position) in collectibles {
        let Some(screen) = camera.project(viewport, position) else {
            continue;
        };
        let dist_sq = screen.distance_squared(cursor);
        if dist_sq > radius_sq {
            continue;
        }
        // Strict: on a tie the earlier ball keeps it
        if best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((id, dist_sq));
        }
    }
    best.map(|(id, _)| id)
}

/// Ground-plane point under the cursor
pub fn aim_point(
    camera: &OrbitCamera,
    viewport: Viewport,
    cursor: Vec2,
    ground_y: f32,
) -> Option<Vec3> {
    camera
        .ray_through(viewport, cursor)?
        .intersect_horizontal_plane(ground_y)
}

/// Translate a left-button press
pub fn translate_pointer_down(
    camera: &OrbitCamera,
    viewport: Viewport,
    cursor: Vec2,
    collectibles: &[(EntityId, Vec3)],
    ground_y: f32,
) -> PointerAction {
    if let Some(ball) = pick_collectible(camera, viewport, cursor, collectibles) {
        return PointerAction::Equip(ball);
    }
    match aim_point(camera, viewport, cursor, ground_y) {
        Some(point) => PointerAction::MoveTo(point),
        None => PointerAction::None,
    }
}

/// One-shot key commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Shoot,
    Undo,
    Save,
    Load,
    DeleteSave,
}

/// Map a `KeyboardEvent.code` to a command
pub fn key_action(code: &str) -> Option<KeyAction> {
    match code {
        "Space" => Some(KeyAction::Shoot),
        "KeyU" => Some(KeyAction::Undo),
        "KeyK" => Some(KeyAction::Save),
        "KeyL" => Some(KeyAction::Load),
        "KeyX" => Some(KeyAction::DeleteSave),
        _ => None,
    }
}

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl RollKeys {
    /// Track a key press/release. Returns false for non-movement keys.
    pub fn set(&mut self, code: &str, pressed: bool) -> bool {
        let slot = match code {
            "KeyW" | "ArrowUp" => &mut self.forward,
            "KeyS" | "ArrowDown" => &mut self.back,
            "KeyA" | "ArrowLeft" => &mut self.left,
            "KeyD" | "ArrowRight" => &mut self.right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// World-space roll direction relative to where the camera looks
    pub fn direction(&self, camera: &OrbitCamera) -> Vec3 {
        let axis = |pos: bool, neg: bool| pos as i8 as f32 - neg as i8 as f32;
        let forward = camera.forward_flat();
        let right = forward.cross(Vec3::Y);
        (forward * axis(self.forward, self.back) + right * axis(self.right, self.left))
            .normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OrbitCamera, Viewport) {
        let viewport = Viewport::new(800.0, 600.0);
        let mut camera = OrbitCamera::default();
        camera.set_aspect(viewport);
        (camera, viewport)
    }

    #[test]
    fn test_click_near_ball_equips() {
        let (camera, viewport) = setup();
        let ball = Vec3::new(5.0, 2.5, 5.0);
        let screen = camera.project(viewport, ball).unwrap();
        let action = translate_pointer_down(
            &camera,
            viewport,
            screen + Vec2::new(10.0, 10.0),
            &[(EntityId(4), ball)],
            1.0,
        );
        assert_eq!(action, PointerAction::Equip(EntityId(4)));
    }

    #[test]
    fn test_closest_ball_wins() {
        let (camera, viewport) = setup();
        let a = Vec3::new(0.0, 2.5, 0.0);
        let b = Vec3::new(0.5, 2.5, 0.0);
        let cursor = camera.project(viewport, b).unwrap();
        let picked = pick_collectible(
            &camera,
            viewport,
            cursor,
            &[(EntityId(1), a), (EntityId(2), b)],
        );
        assert_eq!(picked, Some(EntityId(2)));
    }

    #[test]
    fn test_tie_keeps_first() {
        let (camera, viewport) = setup();
        let p = Vec3::new(3.0, 2.5, 3.0);
        let cursor = camera.project(viewport, p).unwrap();
        let picked = pick_collectible(
            &camera,
            viewport,
            cursor,
            &[(EntityId(7), p), (EntityId(3), p)],
        );
        assert_eq!(picked, Some(EntityId(7)));
    }

    #[test]
    fn test_click_far_from_balls_moves() {
        let (camera, viewport) = setup();
        let ball = Vec3::new(-30.0, 2.5, 0.0);
        let action = translate_pointer_down(
            &camera,
            viewport,
            Vec2::new(400.0, 300.0),
            &[(EntityId(1), ball)],
            1.0,
        );
        match action {
            PointerAction::MoveTo(point) => {
                assert!((point.y - 1.0).abs() < 1e-4);
            }
            other => panic!("expected MoveTo, got {other:?}"),
        }
    }

    #[test]
    fn test_sky_click_is_noop() {
        let (camera, viewport) = setup();
        let action = translate_pointer_down(&camera, viewport, Vec2::new(400.0, 0.0), &[], 1.0);
        assert_eq!(action, PointerAction::None);
        assert_eq!(aim_point(&camera, viewport, Vec2::new(400.0, 0.0), 1.0), None);
    }

    #[test]
    fn test_degenerate_viewport_is_noop() {
        let (camera, _) = setup();
        let viewport = Viewport::new(0.0, 0.0);
        let action = translate_pointer_down(
            &camera,
            viewport,
            Vec2::ZERO,
            &[(EntityId(1), Vec3::ZERO)],
            1.0,
        );
        assert_eq!(action, PointerAction::None);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_action("Space"), Some(KeyAction::Shoot));
        assert_eq!(key_action("KeyU"), Some(KeyAction::Undo));
        assert_eq!(key_action("KeyQ"), None);
    }

    #[test]
    fn test_roll_direction_follows_camera() {
        let (mut camera, _) = setup();
        let mut keys = RollKeys::default();
        assert!(keys.set("KeyW", true));
        assert!(!keys.set("Enter", true));
        assert!((keys.direction(&camera) - Vec3::NEG_Z).length() < 1e-5);

        keys.set("KeyD", true);
        let diag = keys.direction(&camera);
        assert!((diag.length() - 1.0).abs() < 1e-5);
        assert!(diag.x > 0.0 && diag.z < 0.0);

        keys.clear();
        keys.set("ArrowUp", true);
        camera.orbit(std::f32::consts::FRAC_PI_2, 0.0);
        assert!((keys.direction(&camera) - Vec3::NEG_X).length() < 1e-5);
    }
}
