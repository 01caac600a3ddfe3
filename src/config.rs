//! Configuration persistence for snaptext settings

use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};

/// Application configuration persisted between sessions
///
/// CLI flags override these; the config only supplies defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmicConfigEntry)]
#[version = 1]
pub struct SnaptextConfig {
    /// Preferred OCR backend name (None = first available)
    pub default_backend: Option<String>,
    /// Language hints forwarded to the backend when --lang is not given
    #[serde(default)]
    pub default_languages: Vec<String>,
    /// Whether to write the cropped selection to shot.png before recognition
    #[serde(default)]
    pub save_debug_screenshot: bool,
}

impl SnaptextConfig {
    /// Configuration ID for cosmic-config
    pub const ID: &'static str = "io.github.cosmic-utils.snaptext";

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match cosmic_config::Config::new(Self::ID, Self::VERSION) {
            Ok(config) => match Self::get_entry(&config) {
                Ok(entry) => entry,
                Err((errs, entry)) => {
                    log::warn!("Error loading config, using defaults: {:?}", errs);
                    entry
                }
            },
            Err(err) => {
                log::warn!("Could not create config handler: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        match cosmic_config::Config::new(Self::ID, Self::VERSION) {
            Ok(config) => {
                if let Err(err) = self.write_entry(&config) {
                    log::error!("Failed to save config: {:?}", err);
                }
            }
            Err(err) => {
                log::error!("Could not create config handler for saving: {:?}", err);
            }
        }
    }
}

impl Default for SnaptextConfig {
    fn default() -> Self {
        Self {
            // First available backend wins (tesseract, then PP-OCR)
            default_backend: None,
            // Backends fall back to English when no hint is given
            default_languages: Vec::new(),
            save_debug_screenshot: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnaptextConfig::default();
        assert_eq!(config.default_backend, None);
        assert!(config.default_languages.is_empty());
        assert!(!config.save_debug_screenshot);
    }
}
