//! Player preferences
//!
//! Persisted separately from game saves in LocalStorage.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Sphere tessellation (longitude segments; latitude is half)
    pub fn sphere_segments(&self) -> u32 {
        match self {
            QualityPreset::Low => 12,
            QualityPreset::Medium => 24,
            QualityPreset::High => 40,
        }
    }

    /// Upper bound on devicePixelRatio used for the backbuffer
    pub fn max_pixel_ratio(&self) -> f64 {
        match self {
            QualityPreset::Low => 1.0,
            QualityPreset::Medium => 1.5,
            QualityPreset::High => 2.0,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Camera ===
    /// Radians of orbit per pixel of right-drag
    pub orbit_sensitivity: f32,
    /// Drag up to look down
    pub invert_orbit_y: bool,

    // === HUD ===
    /// Show the controls line under the ball counter
    pub show_controls_hint: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            orbit_sensitivity: 0.005,
            invert_orbit_y: false,
            show_controls_hint: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Sphere tessellation for the current preset
    pub fn sphere_segments(&self) -> u32 {
        self.quality.sphere_segments()
    }

    /// Clamp the host's devicePixelRatio to the preset's cap
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        device_pixel_ratio.clamp(1.0, self.quality.max_pixel_ratio())
    }

    /// Orbit deltas (yaw, pitch) in radians for a drag of (dx, dy) pixels
    pub fn orbit_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        let dy = if self.invert_orbit_y { -dy } else { dy };
        (-dx * self.orbit_sensitivity, dy * self.orbit_sensitivity)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "knockdown_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        if let Some(storage) = crate::platform::local_storage() {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        if let Some(storage) = crate::platform::local_storage() {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.pixel_ratio(3.0), 1.0);
        let settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.pixel_ratio(1.5), 1.5);
        assert_eq!(settings.pixel_ratio(0.5), 1.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"quality":"High"}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.show_controls_hint);
        assert_eq!(settings.orbit_sensitivity, Settings::default().orbit_sensitivity);
    }

    #[test]
    fn test_invert_orbit_y() {
        let mut settings = Settings::default();
        let (_, pitch) = settings.orbit_delta(0.0, 10.0);
        settings.invert_orbit_y = true;
        let (_, inverted) = settings.orbit_delta(0.0, 10.0);
        assert_eq!(pitch, -inverted);
    }
}
