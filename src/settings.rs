//! Player settings and preferences
//!
//! Stored as JSON next to the game. The simulation reads them at session
//! start and never writes them back; the host owns persistence.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_ARENA_RADIUS;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown quality preset '{0}'")]
    UnknownQuality(String),
}

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

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 400,
            QualityPreset::High => 1200,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            _ => Err(SettingsError::UnknownQuality(s.to_string())),
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
    /// Particle effects (death bursts, blasts)
    pub particles: bool,
    /// Screen shake on telegraphs and big hits
    pub screen_shake: bool,
    /// Floating damage numbers
    pub damage_numbers: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,

    // === Session ===
    /// World disc radius
    pub arena_radius: f32,
    /// Seed for the session RNG
    pub seed: u64,
    /// Role picked last time; used when a session starts without one
    pub last_role: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            // Visual effects - all on by default
            particles: true,
            screen_shake: true,
            damage_numbers: true,

            // Accessibility
            reduced_motion: false,

            arena_radius: DEFAULT_ARENA_RADIUS,
            seed: 0x5EED_A4E4A,
            last_role: None,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self { quality: preset, ..Self::default() }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from `path`, falling back to defaults when the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("{} not found, using default settings", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_str() {
        assert_eq!("LOW".parse::<QualityPreset>().unwrap(), QualityPreset::Low);
        assert_eq!("med".parse::<QualityPreset>().unwrap(), QualityPreset::Medium);
        assert!("ultra".parse::<QualityPreset>().is_err());
    }

    #[test]
    fn test_particle_cap_follows_preset_and_toggle() {
        let mut settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.max_particles(), 100);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "quality": "High", "last_role": "mage" }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.last_role.as_deref(), Some("mage"));
        assert!(settings.particles);
        assert_eq!(settings.arena_radius, DEFAULT_ARENA_RADIUS);

        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load("/definitely/not/here/settings.json").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Settings::from_json("{ quality: "), Err(SettingsError::Parse(_))));
    }
}
