//! Game settings and preferences
//!
//! Read once at startup from an inline JSON block in the host page
//! (`<script id="settings" type="application/json">`). Nothing is written back.

use serde::{Deserialize, Serialize};

use crate::sim::MAX_PARTICLES;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
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

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 128,
            QualityPreset::Medium => 320,
            QualityPreset::High => MAX_PARTICLES,
        }
    }

    /// Device pixel ratio ceiling for the canvas
    pub fn max_pixel_ratio(&self) -> f64 {
        match self {
            QualityPreset::Low => 1.0,
            QualityPreset::Medium => 1.5,
            QualityPreset::High => 2.0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Super-hit ball trail
    pub trails: bool,
    /// Particle effects (sparks, chalk dust, confetti)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects and victory tune volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Crowd ambience volume (0.0 - 1.0)
    pub crowd_volume: f32,
    pub muted: bool,

    /// Vibrate on hits, goals and countdown
    pub haptics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            trails: true,
            particles: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            crowd_volume: 1.0,
            muted: false,

            haptics: true,
        }
    }
}

impl Settings {
    /// Parse the host page's JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
        settings.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        settings.crowd_volume = settings.crowd_volume.clamp(0.0, 1.0);
        Ok(settings)
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Element holding the inline settings JSON
    const ELEMENT_ID: &'static str = "settings";

    /// Load settings from the host page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        let Some(json) = json.filter(|j| !j.trim().is_empty()) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings ({} quality)", settings.quality.as_str());
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings JSON, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No #{} element on native, using defaults", Self::ELEMENT_ID);
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{ "quality": "high", "muted": true }"#).unwrap();
        assert_eq!(s.quality, QualityPreset::High);
        assert!(s.muted);
        assert!(s.particles);
        assert_eq!(s.master_volume, 0.8);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_volumes_clamped() {
        let s = Settings::from_json(r#"{ "master_volume": 3.0, "crowd_volume": -1 }"#).unwrap();
        assert_eq!(s.master_volume, 1.0);
        assert_eq!(s.crowd_volume, 0.0);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("{ quality: ").is_err());
        assert!(Settings::from_json(r#"{ "quality": "ultra" }"#).is_err());
    }

    #[test]
    fn test_particle_cap() {
        let mut s = Settings {
            quality: QualityPreset::Low,
            ..Settings::default()
        };
        assert_eq!(s.max_particles(), 128);
        s.quality = QualityPreset::High;
        assert_eq!(s.max_particles(), MAX_PARTICLES);
        s.particles = false;
        assert_eq!(s.max_particles(), 0);
    }

    #[test]
    fn test_preset_names() {
        let s = Settings::from_json(r#"{ "quality": "high" }"#).unwrap();
        assert_eq!(s.quality, QualityPreset::High);
        assert_eq!(s.quality.as_str(), "High");
    }
}
