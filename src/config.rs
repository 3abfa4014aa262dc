//! JSON configuration.
//!
//! Every section is optional; missing keys take the defaults below, so a file
//! containing only `{"physics": {"enableGravity": true}}` is valid.
//!
//! ```json
//! {
//!   "blackHole": { "mass": 8.54e36, "name": "Sagittarius A*" },
//!   "physics": { "enableGravity": true, "integrationMethod": "leapfrog" },
//!   "objects": [
//!     { "name": "Star", "kind": "star", "position": [4e11, 0, 0], "mass": 1.989e30, "radius": 4e10 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use glam::{DVec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::body::{Body, BodyKind};
use crate::constants::{DEFAULT_TRAIL_CAPACITY, G, SGR_A_STAR_MASS};
use crate::error::ConfigError;
use crate::integrator::IntegrationScheme;
use crate::snapshot::{DiskParams, Resolution};

/// Complete application configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub window: WindowConfig,
    pub black_hole: BlackHoleConfig,
    pub physics: PhysicsConfig,
    pub rendering: RenderingConfig,
    pub accretion_disk: AccretionDiskConfig,
    pub camera: CameraConfig,
    /// Initial bodies. Empty means the built-in star and planet.
    pub objects: Vec<ObjectConfig>,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load `path`, or fall back to defaults with a warning if it is missing
    /// or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            title: "Horizon".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlackHoleConfig {
    pub position: [f64; 3],
    /// Mass in kilograms.
    pub mass: f64,
    pub name: String,
}

impl Default for BlackHoleConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            mass: SGR_A_STAR_MASS,
            name: "Sagittarius A*".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsConfig {
    pub enable_gravity: bool,
    /// `"euler"`, `"leapfrog"` or `"rk4"`.
    pub integration_method: String,
    pub gravity_constant: f64,
    /// Fixed simulation step in seconds. Zero or negative uses the frame time.
    pub time_step: f64,
    /// Simulated seconds per wall-clock second.
    pub time_scale: f64,
    pub trail_length: usize,
}

impl PhysicsConfig {
    /// The configured scheme; unknown names become RK4.
    pub fn scheme(&self) -> IntegrationScheme {
        IntegrationScheme::parse_or_default(&self.integration_method)
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enable_gravity: false,
            integration_method: IntegrationScheme::Rk4.name().into(),
            gravity_constant: G,
            time_step: 0.016666,
            time_scale: 1.0,
            trail_length: DEFAULT_TRAIL_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderingConfig {
    /// Drop to the moving tier while the camera moves.
    pub adaptive_quality: bool,
    pub static_resolution: Resolution,
    pub moving_resolution: Resolution,
    /// Draw the spacetime curvature grid over the image.
    pub enable_grid: bool,
    /// Grid cells per side.
    pub grid_size: u32,
    /// Cell edge length in meters.
    pub grid_spacing: f64,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            adaptive_quality: true,
            static_resolution: Resolution::new(800, 600),
            moving_resolution: Resolution::new(400, 300),
            enable_grid: true,
            grid_size: 25,
            grid_spacing: 1.0e10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccretionDiskConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub temperature: f32,
    pub thickness: f32,
}

impl AccretionDiskConfig {
    pub fn params(&self) -> DiskParams {
        DiskParams {
            inner_radius: self.inner_radius,
            outer_radius: self.outer_radius,
            temperature: self.temperature,
            thickness: self.thickness,
        }
    }
}

impl Default for AccretionDiskConfig {
    fn default() -> Self {
        Self {
            inner_radius: 2.785e10,
            outer_radius: 6.595e10,
            temperature: 1.0e4,
            thickness: 1.0e9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    pub initial_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Radians per dragged pixel; key presses orbit twice as fast.
    pub orbit_speed: f32,
    /// Per-frame (at 60 FPS) fraction of the remaining distance kept.
    pub damping_factor: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_radius: 6.34194e10,
            min_radius: 1.0e10,
            max_radius: 1.0e12,
            orbit_speed: 0.015,
            damping_factor: 0.95,
            fov: 60.0,
        }
    }
}

/// One initial body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectConfig {
    pub name: String,
    pub kind: String,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    pub radius: f64,
    pub color: [f32; 4],
}

impl ObjectConfig {
    /// Build the body; an unknown `kind` becomes a planet with a warning.
    pub fn to_body(&self, trail_capacity: usize) -> Body {
        let kind = BodyKind::from_name(&self.kind).unwrap_or_else(|| {
            warn!(body = %self.name, "unknown body kind '{}', using planet", self.kind);
            BodyKind::Planet
        });
        Body::new(self.name.clone(), DVec3::from_array(self.position), self.mass, self.radius)
            .with_velocity(DVec3::from_array(self.velocity))
            .with_color(Vec4::from_array(self.color))
            .with_kind(kind)
            .with_trail_capacity(trail_capacity)
    }
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            name: "Object".into(),
            kind: "planet".into(),
            position: [0.0; 3],
            velocity: [0.0; 3],
            mass: 1.0,
            radius: 1.0e9,
            color: [1.0; 4],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Optional log file, written in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_all_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.physics.enable_gravity);
        assert_eq!(config.physics.scheme(), IntegrationScheme::Rk4);
        assert_eq!(config.rendering.static_resolution, Resolution::new(800, 600));
        assert_eq!(config.rendering.moving_resolution, Resolution::new(400, 300));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let json = r#"{
            "physics": { "enableGravity": true, "integrationMethod": "Leapfrog" },
            "blackHole": { "mass": 1e31 }
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert!(config.physics.enable_gravity);
        assert_eq!(config.physics.scheme(), IntegrationScheme::Leapfrog);
        assert_eq!(config.physics.gravity_constant, G);
        assert_eq!(config.black_hole.mass, 1e31);
        assert_eq!(config.black_hole.name, "Sagittarius A*");
    }

    #[test]
    fn test_grid_settings() {
        let defaults = RenderingConfig::default();
        assert!(defaults.enable_grid);
        assert_eq!(defaults.grid_size, 25);
        assert_eq!(defaults.grid_spacing, 1.0e10);

        let json = r#"{ "rendering": { "enableGrid": false, "gridSize": 10, "gridSpacing": 5e9 } }"#;
        let rendering = Config::from_json_str(json).unwrap().rendering;
        assert!(!rendering.enable_grid);
        assert_eq!(rendering.grid_size, 10);
        assert_eq!(rendering.grid_spacing, 5e9);
        assert!(rendering.adaptive_quality);
    }

    #[test]
    fn test_unknown_scheme_falls_back_to_rk4() {
        let config =
            Config::from_json_str(r#"{"physics": {"integrationMethod": "verlet"}}"#).unwrap();
        assert_eq!(config.physics.scheme(), IntegrationScheme::Rk4);
    }

    #[test]
    fn test_objects_become_bodies() {
        let json = r#"{"objects": [{
            "name": "Comet", "kind": "asteroid",
            "position": [1e11, 0, 0], "velocity": [0, 0, 3e4],
            "mass": 2e14, "radius": 5e3, "color": [0.5, 0.5, 1.0, 1.0]
        }]}"#;
        let config = Config::from_json_str(json).unwrap();
        let body = config.objects[0].to_body(10);
        assert_eq!(body.name(), "Comet");
        assert_eq!(body.kind(), BodyKind::Asteroid);
        assert_eq!(body.velocity(), DVec3::new(0.0, 0.0, 3e4));
        assert_eq!(body.trail_capacity(), 10);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Config::from_json_str("{ physics: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("horizon-config-does-not-exist.json");
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Io { .. })));
        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("horizon-config-{}.json", std::process::id()));
        let mut config = Config::default();
        config.physics.enable_gravity = true;
        config.objects.push(ObjectConfig::default());
        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
