use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{PinError, Result, Rgba, MIN_HEIGHT, MIN_WIDTH};

const APP_DIR: &str = "pinboard";
const CONFIG_FILE: &str = "config.yaml";
const INIT_FILE: &str = "init.yaml";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Colors a new note is picked from at random
    pub palette: Vec<Rgba>,

    /// Color note text is drawn with
    pub text_color: Rgba,

    /// Fill color of the board behind the notes
    pub canvas_background: Rgba,

    /// Font used to draw note text
    pub font_family: String,

    /// Font size in points
    pub font_size: u32,

    /// Width of a newly created note
    pub default_width: u32,

    /// Height of a newly created note
    pub default_height: u32,

    /// Gap between notes placed next to each other, and the offset of the first note
    pub padding: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: vec![
                Rgba::new(255, 255, 200, 255),
                Rgba::new(255, 214, 214, 255),
                Rgba::new(214, 240, 255, 255),
                Rgba::new(214, 255, 220, 255),
                Rgba::new(235, 220, 255, 255),
                Rgba::new(255, 230, 200, 255),
            ],
            text_color: Rgba::new(30, 30, 30, 255),
            canvas_background: Rgba::new(245, 245, 240, 255),
            font_family: "Sans".to_string(),
            font_size: 10,
            default_width: 180,
            default_height: 120,
            padding: 20,
        }
    }
}

impl Config {
    /// Loads a configuration file, falling back to defaults for every omitted option.
    ///
    /// A missing or empty file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            debug!("Config file {} is empty, using defaults", path.display());
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| PinError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads a configuration file that must exist and must name the palette and
    /// the canvas background explicitly.
    pub fn load_strict(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PinError::FileNotFound {
                file_path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| PinError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?;

        let mapping = match value {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => {
                return Err(PinError::ConfigError {
                    message: format!("Config file is empty: {}", path.display()),
                })
            }
            _ => {
                return Err(PinError::ConfigError {
                    message: format!("Config file must be a mapping: {}", path.display()),
                })
            }
        };

        for key in ["palette", "canvas_background"] {
            if !mapping.contains_key(key) {
                return Err(PinError::ConfigError {
                    message: format!("Config must contain '{}'", key),
                });
            }
        }

        let config: Config = serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
            .map_err(|e| PinError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the options describe a usable board.
    pub fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(PinError::ConfigError {
                message: "palette must contain at least one color".to_string(),
            });
        }
        if (self.default_width as f64) < MIN_WIDTH || (self.default_height as f64) < MIN_HEIGHT {
            return Err(PinError::ConfigError {
                message: format!(
                    "default note size {}x{} is below the minimum {}x{}",
                    self.default_width, self.default_height, MIN_WIDTH, MIN_HEIGHT
                ),
            });
        }
        if self.font_size == 0 {
            return Err(PinError::ConfigError {
                message: "font_size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Directory holding the user's configuration and init file.
    pub fn config_dir() -> PathBuf {
        // Prefer the platform config directory, then ~/.config, then the working directory
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_DIR);
        }
        match dirs::home_dir() {
            Some(home) => home.join(".config").join(APP_DIR),
            None => {
                warn!("Could not determine a home directory, using the working directory");
                PathBuf::from(".").join(APP_DIR)
            }
        }
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn init_file_path() -> PathBuf {
        Self::config_dir().join(INIT_FILE)
    }
}
