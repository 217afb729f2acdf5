//! Save/load of a single game slot
//!
//! A snapshot is wrapped in a versioned JSON envelope and stored in
//! LocalStorage. Native builds have no storage: saves succeed and loads find
//! nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::SessionSnapshot;

/// Current envelope format
pub const SAVE_VERSION: u32 = 1;

/// LocalStorage key (used only in wasm32)
#[allow(dead_code)]
const STORAGE_KEY: &str = "knockdown_save";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("save counters are inconsistent")]
    Inconsistent,
    #[error("storage unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    /// Unix timestamp (ms) when saved, 0 when unknown
    #[serde(default)]
    pub saved_at: f64,
    pub snapshot: SessionSnapshot,
}

/// Peek at the version before committing to the full layout
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

pub fn encode(snapshot: &SessionSnapshot, saved_at: f64) -> Result<String, PersistError> {
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        saved_at,
        snapshot: snapshot.clone(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode(json: &str) -> Result<SaveEnvelope, PersistError> {
    let probe: VersionProbe = serde_json::from_str(json)?;
    if probe.version != SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: probe.version,
        });
    }
    let envelope: SaveEnvelope = serde_json::from_str(json)?;
    if !envelope.snapshot.is_consistent() {
        return Err(PersistError::Inconsistent);
    }
    Ok(envelope)
}

#[cfg(target_arch = "wasm32")]
fn storage() -> Result<web_sys::Storage, PersistError> {
    crate::platform::local_storage()
        .ok_or_else(|| PersistError::Storage("LocalStorage not available".into()))
}

/// Write the save slot (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn save(snapshot: &SessionSnapshot) -> Result<(), PersistError> {
    let json = encode(snapshot, js_sys::Date::now())?;
    storage()?
        .set_item(STORAGE_KEY, &json)
        .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
    log::info!("Game saved ({} bytes)", json.len());
    Ok(())
}

/// Read the save slot; `Ok(None)` when there is none (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn load() -> Result<Option<SessionSnapshot>, PersistError> {
    let json = storage()?
        .get_item(STORAGE_KEY)
        .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
    match json {
        Some(json) => {
            let envelope = decode(&json)?;
            log::info!("Loaded save from room {}", envelope.snapshot.room_index);
            Ok(Some(envelope.snapshot))
        }
        None => Ok(None),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn delete() -> Result<(), PersistError> {
    storage()?
        .remove_item(STORAGE_KEY)
        .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
    log::info!("Save deleted");
    Ok(())
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn save(snapshot: &SessionSnapshot) -> Result<(), PersistError> {
    encode(snapshot, 0.0).map(|_| ())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Result<Option<SessionSnapshot>, PersistError> {
    Ok(None)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn delete() -> Result<(), PersistError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::scripted::ScriptedPhysics;
    use crate::sim::{GameSession, World, controller, history};

    fn snapshot() -> SessionSnapshot {
        let mut session = GameSession::new(21);
        let mut world = World::new(ScriptedPhysics::new());
        controller::start_session(&mut session, &mut world);
        let ball = world.collectible_positions()[2].0;
        controller::equip(&mut session, &mut world, ball);
        history::capture(&session, &world)
    }

    #[test]
    fn test_envelope_round_trip() {
        let snap = snapshot();
        let json = encode(&snap, 1234.0).unwrap();
        let envelope = decode(&json).unwrap();
        assert_eq!(envelope.version, SAVE_VERSION);
        assert_eq!(envelope.saved_at, 1234.0);
        assert_eq!(envelope.snapshot, snap);
        assert_eq!(envelope.snapshot.collectibles.len(), 7);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = encode(&snapshot(), 0.0)
            .unwrap()
            .replacen("\"version\":1", "\"version\":99", 1);
        match decode(&json) {
            Err(PersistError::UnsupportedVersion { found }) => assert_eq!(found, 99),
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(decode("{not json"), Err(PersistError::Json(_))));
        assert!(matches!(
            decode(r#"{"version":1,"snapshot":{}}"#),
            Err(PersistError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_inconsistent_counters() {
        let mut overflowing = snapshot();
        overflowing.balls_used = u32::MAX;
        let json = encode(&overflowing, 0.0).unwrap();
        assert!(matches!(decode(&json), Err(PersistError::Inconsistent)));

        let mut over_collected = snapshot();
        over_collected.balls_collected = over_collected.total_balls + 1;
        let json = encode(&over_collected, 0.0).unwrap();
        assert!(matches!(decode(&json), Err(PersistError::Inconsistent)));

        let mut unknown_room = snapshot();
        unknown_room.room_index = 9;
        let json = encode(&unknown_room, 0.0).unwrap();
        assert!(matches!(decode(&json), Err(PersistError::Inconsistent)));
    }

    #[test]
    fn test_loaded_snapshot_restores_world() {
        let snap = snapshot();
        let json = encode(&snap, 0.0).unwrap();
        let restored = decode(&json).unwrap().snapshot;

        let mut session = GameSession::new(0);
        let mut world = World::new(ScriptedPhysics::new());
        history::restore(&mut session, &mut world, &restored);

        assert_eq!(session.held_balls, 1);
        assert_eq!(session.seed, 21);
        assert_eq!(world.collectible_count(), 7);
        assert!(world.player().is_some());
        assert!(world.door().is_some());
    }
}
