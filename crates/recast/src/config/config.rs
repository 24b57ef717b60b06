//! Configuration management for recast.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, BehaviourConfig, OutputConfig, SessionConfig, VideoConfig},
};

use recast_core::{SessionSettings, overlay::OverlaySettings};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::{ProjectDirs, UserDirs};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output location.
    pub output: OutputConfig,
    /// Video source and encoding.
    #[serde(default)]
    pub video: VideoConfig,
    /// Microphone.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Delay and duration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Application behavior settings.
    #[serde(default)]
    pub behaviour: BehaviourConfig,
    /// Frame decorations.
    #[serde(default)]
    pub overlays: OverlaySettings,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            let config = Self::with_output_dir(Self::default_output_dir()?);
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to the platform config directory.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Defaults with recordings placed in `directory`.
    pub fn with_output_dir(directory: PathBuf) -> Self {
        Self {
            output: OutputConfig {
                directory,
                copy_path_to_clipboard: false,
                screenshot_to_clipboard: false,
            },
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            session: SessionConfig::default(),
            behaviour: BehaviourConfig::default(),
            overlays: OverlaySettings::default(),
        }
    }

    /// Read and parse a config file.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration using the atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Read-only snapshot handed to the orchestrator for one session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            output_dir: self.output.directory.clone(),
            frame_rate: self.video.frame_rate,
            duration_ms: self.session.duration_ms,
            start_delay_ms: self.session.start_delay_ms,
            video_quality: self.video.quality.clamp(1, 100),
            audio_quality: self.audio.quality.clamp(1, 100),
            include_cursor: self.video.include_cursor,
            audio_enabled: self.audio.enabled,
            minimize_on_start: self.behaviour.minimize_on_start,
            copy_path_to_clipboard: self.output.copy_path_to_clipboard,
            variable_frame_rate: self.video.variable_frame_rate,
            screenshot_to_clipboard: self.output.screenshot_to_clipboard,
            overlays: self.overlays.clone(),
        }
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "recast", "Recast").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    // The user's Videos folder, else the app data folder.
    #[track_caller]
    fn default_output_dir() -> AppResult<PathBuf> {
        if let Some(videos) = UserDirs::new().and_then(|u| u.video_dir().map(Path::to_path_buf)) {
            return Ok(videos.join("Recast"));
        }
        Ok(Self::project_dirs()?.data_dir().join("recordings"))
    }
}
