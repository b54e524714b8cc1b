use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const CONFIG_ENV_VAR: &str = "PIETREE_CONFIG";
pub(crate) const DEFAULT_CONFIG_FILE_NAME: &str = "gameplay.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read gameplay config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse gameplay config {path} at {field_path}: {source}")]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid gameplay config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameplayConfig {
    pub(crate) room_transition: RoomTransitionConfig,
    pub(crate) mood: MoodConfig,
    pub(crate) navigation: NavigationConfig,
    pub(crate) interaction: InteractionConfig,
    pub(crate) starting_room: String,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            room_transition: RoomTransitionConfig::default(),
            mood: MoodConfig::default(),
            navigation: NavigationConfig::default(),
            interaction: InteractionConfig::default(),
            starting_room: "garden".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RoomTransitionConfig {
    pub(crate) duration_seconds: f32,
    pub(crate) vignette_max: f32,
    pub(crate) vignette_rest: f32,
}

impl Default for RoomTransitionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.25,
            vignette_max: 0.8,
            vignette_rest: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GradientKeyConfig {
    pub(crate) position: f32,
    pub(crate) color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MoodConfig {
    pub(crate) initial: f32,
    pub(crate) stress_gain_moving: f32,
    pub(crate) gradient: Vec<GradientKeyConfig>,
    pub(crate) show_indicator: bool,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            initial: 0.5,
            stress_gain_moving: 0.1,
            gradient: vec![
                GradientKeyConfig {
                    position: 0.0,
                    color: [96, 186, 116, 255],
                },
                GradientKeyConfig {
                    position: 0.5,
                    color: [232, 198, 84, 255],
                },
                GradientKeyConfig {
                    position: 1.0,
                    color: [206, 72, 62, 255],
                },
            ],
            show_indicator: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct NavigationConfig {
    pub(crate) sample_radius: f32,
    pub(crate) move_speed: f32,
    pub(crate) arrival_threshold: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            sample_radius: 10_000.0,
            move_speed: 3.5,
            arrival_threshold: 0.05,
        }
    }
}

/// Mood deltas applied when an interactable of each kind commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct InteractionConfig {
    pub(crate) pickup_stress: f32,
    pub(crate) door_stress: f32,
    pub(crate) delivery_stress: f32,
}

impl GameplayConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let transition = &self.room_transition;
        non_negative("room_transition.duration_seconds", transition.duration_seconds)?;
        unit_interval("room_transition.vignette_max", transition.vignette_max)?;
        unit_interval("room_transition.vignette_rest", transition.vignette_rest)?;

        unit_interval("mood.initial", self.mood.initial)?;
        finite("mood.stress_gain_moving", self.mood.stress_gain_moving)?;
        if self.mood.gradient.is_empty() {
            return Err(invalid("mood.gradient", "must contain at least one key"));
        }
        for key in &self.mood.gradient {
            unit_interval("mood.gradient.position", key.position)?;
        }

        positive("navigation.sample_radius", self.navigation.sample_radius)?;
        positive("navigation.move_speed", self.navigation.move_speed)?;
        non_negative(
            "navigation.arrival_threshold",
            self.navigation.arrival_threshold,
        )?;

        finite("interaction.pickup_stress", self.interaction.pickup_stress)?;
        finite("interaction.door_stress", self.interaction.door_stress)?;
        finite("interaction.delivery_stress", self.interaction.delivery_stress)?;

        if self.starting_room.trim().is_empty() {
            return Err(invalid("starting_room", "must not be empty"));
        }
        Ok(())
    }
}

/// Picks the override path from `PIETREE_CONFIG` when set, otherwise the
/// default file inside `config_dir`.
pub(crate) fn resolve_config_path(config_dir: &Path, env_override: Option<String>) -> PathBuf {
    match env_override.filter(|value| !value.trim().is_empty()) {
        Some(path) => PathBuf::from(path),
        None => config_dir.join(DEFAULT_CONFIG_FILE_NAME),
    }
}

pub(crate) fn load_gameplay_config(config_dir: &Path) -> Result<GameplayConfig, ConfigError> {
    let path = resolve_config_path(config_dir, std::env::var(CONFIG_ENV_VAR).ok());
    load_gameplay_config_from(&path)
}

pub(crate) fn load_gameplay_config_from(path: &Path) -> Result<GameplayConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "gameplay_config_missing_using_defaults");
            return Ok(GameplayConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = parse_gameplay_config(path, &raw)?;
    info!(
        path = %path.display(),
        starting_room = %config.starting_room,
        "gameplay_config_loaded"
    );
    Ok(config)
}

fn parse_gameplay_config(path: &Path, raw: &str) -> Result<GameplayConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = serde_path_to_error::deserialize::<_, GameplayConfig>(&mut deserializer)
        .map_err(|error| {
            let field_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field_path,
                source: error.into_inner(),
            }
        })?;
    config.validate()?;
    Ok(config)
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(invalid(field, format!("must be > 0, got {value}")));
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("must be within [0, 1], got {value}")));
    }
    Ok(())
}
