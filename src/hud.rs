//! HUD text
//!
//! The page shows a ball counter, a controls hint and modal win/lose alerts.

use crate::sim::GameEvent;

pub const BALL_COUNT_ELEMENT: &str = "ball-count";
pub const CONTROLS_ELEMENT: &str = "controls";

pub const CONTROLS_MESSAGE: &str = "Left click anywhere to move. \
    Click a blue ball to collect it. \
    Press SPACE to shoot. \
    WASD / arrows to roll. \
    Right click and drag to rotate camera. \
    U undo, K save, L load, X delete save.";

pub const WIN_MESSAGE: &str = "you have successfully knocked down the orange cube! :D";
pub const LOSE_MESSAGE: &str =
    "you have lost, you have not knocked down the orange cube and ran out of balls :(";

pub fn ball_count_text(held: u32) -> String {
    format!("Balls: {held}")
}

/// Alert text for an event, if it gets one
pub fn alert_for(event: &GameEvent) -> Option<&'static str> {
    match event {
        GameEvent::Won { .. } => Some(WIN_MESSAGE),
        GameEvent::Lost { .. } => Some(LOSE_MESSAGE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_count_text() {
        assert_eq!(ball_count_text(0), "Balls: 0");
        assert_eq!(ball_count_text(12), "Balls: 12");
    }

    #[test]
    fn test_alerts() {
        assert_eq!(alert_for(&GameEvent::Won { room: 1 }), Some(WIN_MESSAGE));
        assert_eq!(alert_for(&GameEvent::Lost { room: 2 }), Some(LOSE_MESSAGE));
        assert_eq!(alert_for(&GameEvent::BallCountChanged { held: 1 }), None);
    }
}
