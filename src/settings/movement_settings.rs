use crate::error::CharacterError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The raw sensitivity in the settings files is in "mouse units", the input component expects radians per unit.
pub const SENSITIVITY_SCALE: f32 = 0.0001;

/// Tunables for a single character. Copied into the capsule and the controller whenever they are (re)built.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementSettings {
    /// Length of the cylindrical part of the capsule (excluding the two half spheres)
    pub height: f32,
    pub radius: f32,
    pub step_height: f32,
    pub gravity_multiplier: f32,
    /// Units per second
    pub speed: f32,
    /// Already scaled by [`SENSITIVITY_SCALE`]
    pub sensitivity: f32,
    /// Maximum downwards velocity
    pub fall_speed: f32,
    pub jump_speed: f32,
}

#[derive(Deserialize, Debug)]
struct SettingsDocument {
    #[serde(rename = "PlayerCollisionHeight")]
    collision_height: f32,
    #[serde(rename = "PlayerCollisionRadius")]
    collision_radius: f32,
    #[serde(rename = "PlayerStepHeight")]
    step_height: f32,
    #[serde(rename = "PlayerGravityMultiplier")]
    gravity_multiplier: f32,
    #[serde(rename = "PlayerSpeed")]
    speed: f32,
    #[serde(rename = "PlayerSensitivity")]
    sensitivity: f32,
    #[serde(rename = "PlayerFallSpeed")]
    fall_speed: f32,
    #[serde(rename = "PlayerJumpSpeed")]
    jump_speed: f32,
    #[serde(rename = "PlayerHeight")]
    spawn_height: f32,
}

/// Result of a successful settings load. `spawn_height` is only used when the owner has no position yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedSettings {
    pub settings: MovementSettings,
    pub spawn_height: f32,
}

impl From<SettingsDocument> for LoadedSettings {
    fn from(doc: SettingsDocument) -> Self {
        Self {
            settings: MovementSettings {
                height: doc.collision_height,
                radius: doc.collision_radius,
                step_height: doc.step_height,
                gravity_multiplier: doc.gravity_multiplier,
                speed: doc.speed,
                sensitivity: SENSITIVITY_SCALE * doc.sensitivity,
                fall_speed: doc.fall_speed,
                jump_speed: doc.jump_speed,
            },
            spawn_height: doc.spawn_height,
        }
    }
}

impl LoadedSettings {
    pub fn load(path: &Path) -> Result<Self, CharacterError> {
        if !path.exists() {
            return Err(CharacterError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| CharacterError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| CharacterError::ConfigFieldInvalid {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let document: SettingsDocument = serde_json::from_str(content)?;
        Ok(document.into())
    }
}
