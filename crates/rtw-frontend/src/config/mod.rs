//! Application configuration module
//!
//! This module handles render parameter defaults and constraints, the scene
//! catalog, and logging settings.

mod manager;

pub use manager::{ConfigError, ConfigManager};

use std::path::PathBuf;

use rtw_core::{FieldConstraints, ParamField, SceneCatalog, SceneCatalogEntry};
use serde::{Deserialize, Serialize};

/// Default value and constraints of one parameter field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    /// Initial field value
    pub value: u32,
    /// Native constraint check of the field
    pub constraints: FieldConstraints,
}

impl FieldConfig {
    fn integer(value: u32, min: u32, max: u32) -> Self {
        Self {
            value,
            constraints: FieldConstraints::integer(min, max),
        }
    }
}

/// Render parameter fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    pub width: FieldConfig,
    pub height: FieldConfig,
    pub samples_per_pixel: FieldConfig,
    pub max_bounces: FieldConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: FieldConfig::integer(400, 1, 3840),
            height: FieldConfig::integer(300, 1, 2160),
            samples_per_pixel: FieldConfig::integer(10, 1, 1000),
            max_bounces: FieldConfig::integer(5, 0, 50),
        }
    }
}

impl RenderConfig {
    /// Settings of a single field
    pub fn field(&self, field: ParamField) -> &FieldConfig {
        match field {
            ParamField::ImageWidth => &self.width,
            ParamField::ImageHeight => &self.height,
            ParamField::SamplesPerPixel => &self.samples_per_pixel,
            ParamField::MaxBounces => &self.max_bounces,
        }
    }
}

/// Scene sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneConfig {
    /// Scene loaded at startup
    pub default_scene: String,
    /// Directory relative scene URLs resolve against (native only)
    pub base_dir: PathBuf,
    /// Selectable scenes
    pub catalog: Vec<SceneCatalogEntry>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_scene: "scenes/materials.json".to_string(),
            base_dir: PathBuf::from("."),
            catalog: vec![SceneCatalogEntry::new("Materials", "scenes/materials.json")],
        }
    }
}

impl SceneConfig {
    /// Build the scene catalog
    pub fn catalog(&self) -> SceneCatalog {
        SceneCatalog::new(self.catalog.clone())
    }
}

/// Logging preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rtw=info,rtw_core=info,rtw_frontend=debug".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    /// Render parameter settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Scene settings
    #[serde(default)]
    pub scenes: SceneConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::new();
        assert_eq!(config.version, AppConfig::CURRENT_VERSION);
        assert_eq!(config.render.field(ParamField::ImageWidth).value, 400);
        assert_eq!(config.render.field(ParamField::MaxBounces).constraints.min, Some(0.0));
        assert_eq!(config.scenes.default_scene, "scenes/materials.json");
        assert_eq!(config.scenes.catalog().len(), 1);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = AppConfig::new();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: AppConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = ron::from_str("(version: 1)").unwrap();
        assert_eq!(parsed.render, RenderConfig::default());
        assert_eq!(parsed.logging, LoggingConfig::default());
    }
}
