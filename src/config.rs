//! # Configuration
//!
//! Tuning values for the studio. Every field has a default, so a configuration file only
//! needs to name the values it overrides:
//!
//! ```json
//! { "first_person": { "speed": 400.0 }, "scheme": "orbit" }
//! ```
//!
//! Native builds read the file named by the `STUDIO_CONFIG` environment variable, or
//! `studio.json` in the working directory when that variable is unset. WebAssembly builds
//! always use the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StudioError;

/// Which camera controller drives the camera.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    Orbit,
    #[default]
    FirstPerson,
}

/// First-person movement tuning.
///
/// Gravity is applied as `gravity * mass`, matching the way the sandbox has always
/// scaled it; the pair is kept separate so either can be tuned on its own.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FirstPersonTuning {
    pub gravity: f32,
    pub mass: f32,
    /// Horizontal velocity loses `damping * dt` of itself every tick.
    pub damping: f32,
    /// Horizontal acceleration from movement keys, in units per second squared.
    pub speed: f32,
    pub jump_velocity: f32,
    /// Half-extent of the square the camera may move in on the XZ plane.
    pub boundary: f32,
    /// Eye height the camera cannot fall below.
    pub ground_level: f32,
    /// Radians of look rotation per pixel of mouse motion.
    pub look_sensitivity: f32,
}

impl Default for FirstPersonTuning {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass: 80.0,
            damping: 10.0,
            speed: 250.0,
            jump_velocity: 100.0,
            boundary: 45.0,
            ground_level: 1.6,
            look_sensitivity: 0.002,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrbitTuning {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub target: [f32; 3],
    /// Where "Reset View" puts the camera.
    pub home: [f32; 3],
}

impl Default for OrbitTuning {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.2,
            pan_speed: 0.8,
            target: [0.0, 0.0, 0.0],
            home: [0.0, 0.0, 5.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub start: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            start: [0.0, 1.6, 5.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiTimings {
    pub info_message_ms: u64,
    pub loading_screen_ms: u64,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            info_message_ms: 3000,
            loading_screen_ms: 1500,
        }
    }
}

/// Top-level configuration for one studio session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub scheme: ControlScheme,
    pub first_person: FirstPersonTuning,
    pub orbit: OrbitTuning,
    pub camera: CameraSettings,
    pub ui: UiTimings,
    /// Distance below which a station becomes active.
    pub activation_radius: f32,
    /// Directory that holds the `textures/` folder.
    pub asset_root: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            scheme: ControlScheme::default(),
            first_person: FirstPersonTuning::default(),
            orbit: OrbitTuning::default(),
            camera: CameraSettings::default(),
            ui: UiTimings::default(),
            activation_radius: 5.0,
            asset_root: PathBuf::from("assets"),
        }
    }
}

impl StudioConfig {
    pub const ENV_VAR: &'static str = "STUDIO_CONFIG";
    pub const DEFAULT_FILE: &'static str = "studio.json";

    /// Parses and validates a configuration from JSON text.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, StudioError> {
        let config: Self = serde_json::from_str(text).map_err(|e| StudioError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Rejects values the controllers and camera cannot work with.
    pub fn validate(&self, path: &Path) -> Result<(), StudioError> {
        let fp = &self.first_person;
        let camera = &self.camera;
        let problem = if !(fp.boundary.is_finite() && fp.boundary > 0.0) {
            Some(format!("first_person.boundary must be positive, got {}", fp.boundary))
        } else if !(fp.damping >= 0.0) {
            Some(format!("first_person.damping must not be negative, got {}", fp.damping))
        } else if !(self.activation_radius > 0.0) {
            Some(format!("activation_radius must be positive, got {}", self.activation_radius))
        } else if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
            Some(format!(
                "camera.fov_y_degrees must lie in (0, 180), got {}",
                camera.fov_y_degrees
            ))
        } else if !(camera.near > 0.0 && camera.near < camera.far) {
            Some(format!(
                "camera.near must be positive and below camera.far, got {} and {}",
                camera.near, camera.far
            ))
        } else {
            None
        };

        match problem {
            Some(reason) => Err(StudioError::Config {
                path: path.to_path_buf(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Reads a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, StudioError> {
        let text = std::fs::read_to_string(path).map_err(|e| StudioError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(path, &text)
    }

    /// Loads the session configuration, falling back to defaults on any problem.
    pub fn load() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let (path, explicit) = match std::env::var_os(Self::ENV_VAR) {
                Some(path) => (PathBuf::from(path), true),
                None => (PathBuf::from(Self::DEFAULT_FILE), false),
            };

            if !explicit && !path.exists() {
                log::debug!("No {} found, using default configuration", Self::DEFAULT_FILE);
                return Self::default();
            }

            match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(error) => {
                    log::warn!("{error}; using default configuration");
                    Self::default()
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sandbox_tuning() {
        let config = StudioConfig::default();
        assert_eq!(config.scheme, ControlScheme::FirstPerson);
        assert_eq!(config.activation_radius, 5.0);
        assert_eq!(config.first_person.boundary, 45.0);
        assert_eq!(config.first_person.ground_level, 1.6);
        assert_eq!(config.ui.info_message_ms, 3000);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = StudioConfig::from_json(
            Path::new("inline.json"),
            r#"{ "scheme": "orbit", "first_person": { "speed": 400.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.scheme, ControlScheme::Orbit);
        assert_eq!(config.first_person.speed, 400.0);
        assert_eq!(config.first_person.damping, 10.0);
        assert_eq!(config.camera.fov_y_degrees, 75.0);
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        let err = StudioConfig::from_json(Path::new("bad.json"), "{ scheme: ").unwrap_err();
        assert!(matches!(err, StudioError::Config { .. }));
    }

    fn rejected(json: &str) -> bool {
        matches!(
            StudioConfig::from_json(Path::new("inline.json"), json),
            Err(StudioError::Config { .. })
        )
    }

    #[test]
    fn test_defaults_validate() {
        assert!(StudioConfig::default().validate(Path::new("defaults")).is_ok());
    }

    #[test]
    fn test_non_positive_boundary_is_rejected() {
        assert!(rejected(r#"{ "first_person": { "boundary": -1.0 } }"#));
        assert!(rejected(r#"{ "first_person": { "boundary": 0.0 } }"#));
    }

    #[test]
    fn test_non_finite_boundary_is_rejected() {
        let mut config = StudioConfig::default();
        config.first_person.boundary = f32::INFINITY;
        assert!(config.validate(Path::new("inline.json")).is_err());
        config.first_person.boundary = f32::NAN;
        assert!(config.validate(Path::new("inline.json")).is_err());
    }

    #[test]
    fn test_non_positive_activation_radius_is_rejected() {
        assert!(rejected(r#"{ "activation_radius": 0.0 }"#));
        assert!(rejected(r#"{ "activation_radius": -5.0 }"#));
    }

    #[test]
    fn test_field_of_view_out_of_range_is_rejected() {
        assert!(rejected(r#"{ "camera": { "fov_y_degrees": 0.0 } }"#));
        assert!(rejected(r#"{ "camera": { "fov_y_degrees": 180.0 } }"#));
        assert!(!rejected(r#"{ "camera": { "fov_y_degrees": 90.0 } }"#));
    }

    #[test]
    fn test_bad_clip_planes_are_rejected() {
        assert!(rejected(r#"{ "camera": { "near": 0.0 } }"#));
        assert!(rejected(r#"{ "camera": { "near": 10.0, "far": 10.0 } }"#));
        assert!(rejected(r#"{ "camera": { "near": 20.0, "far": 10.0 } }"#));
    }

    #[test]
    fn test_negative_damping_is_rejected() {
        assert!(rejected(r#"{ "first_person": { "damping": -1.0 } }"#));
        assert!(!rejected(r#"{ "first_person": { "damping": 0.0 } }"#));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = StudioConfig::from_file(Path::new("definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StudioError::Config { .. }));
    }
}
