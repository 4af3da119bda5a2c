//! Application configuration and saved stream profiles.

use glance_frame_model::{BlobParams, EffectSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{GlanceError, GlanceResult};

/// Version written alongside saved profiles.
pub const PROFILES_VERSION: u32 = 1;

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Settings used when a stream starts.
    pub stream: StreamConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Named stream presets.
    pub profiles: ProfileStore,
}

/// Everything the render loop needs to start streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Target frames per second (>= 1).
    pub target_fps: u32,

    /// Try the pooled and low-latency backends first while the target
    /// window is in the foreground, even with software capture selected.
    pub foreground_fast_path: bool,

    /// Display settings.
    pub effects: EffectSettings,

    /// Motion-analysis settings.
    pub blob: BlobParams,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "glance=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

/// Saved profiles with a format version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStore {
    pub version: u32,
    pub profiles: BTreeMap<String, StreamConfig>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            foreground_fast_path: true,
            effects: EffectSettings::default(),
            blob: BlobParams::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self {
            version: PROFILES_VERSION,
            profiles: BTreeMap::new(),
        }
    }
}

impl StreamConfig {
    /// Copy with every field forced into its legal range.
    pub fn sanitized(&self) -> Self {
        Self {
            target_fps: self.target_fps.max(1),
            foreground_fast_path: self.foreground_fast_path,
            effects: self.effects.sanitized(),
            blob: self.blob.sanitized(),
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> GlanceResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> GlanceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Store the current stream settings under `name`, replacing any
    /// profile with the same name.
    pub fn save_profile(&mut self, name: &str) -> GlanceResult<()> {
        let name = profile_name(name)?;
        self.profiles
            .profiles
            .insert(name.to_string(), self.stream.sanitized());
        self.profiles.version = PROFILES_VERSION;
        tracing::info!(profile = name, "Profile saved");
        Ok(())
    }

    /// Replace the current stream settings with a saved profile.
    pub fn apply_profile(&mut self, name: &str) -> GlanceResult<()> {
        let name = profile_name(name)?;
        let profile = self
            .profiles
            .profiles
            .get(name)
            .ok_or_else(|| GlanceError::config(format!("no profile named '{name}'")))?;
        self.stream = profile.sanitized();
        tracing::info!(profile = name, "Profile applied");
        Ok(())
    }

    /// Delete a saved profile. Returns whether it existed.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        self.profiles.profiles.remove(name.trim()).is_some()
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.profiles.keys().map(String::as_str)
    }
}

fn profile_name(name: &str) -> GlanceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GlanceError::config("profile name must not be empty"));
    }
    Ok(name)
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("glance").join("config.json")
}
