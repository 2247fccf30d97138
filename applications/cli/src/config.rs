/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_audio")]
    pub audio: AudioSettings,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub looping: bool,

    #[serde(default)]
    pub shuffle: bool,

    #[serde(default = "default_progress_interval")]
    pub progress_interval: u32,

    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioSettings {
    /// Discard samples instead of opening an output device
    #[serde(default)]
    pub null_output: bool,

    /// Decoded frames queued ahead of the device
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: usize,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `cadence.toml` is read if
    /// present. `CADENCE_`-prefixed variables override file values, with
    /// `__` between sections (`CADENCE_PLAYBACK__LOOPING=true`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(environment());

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.progress_interval == 0 {
            return Err(CliError::Config(
                "playback.progress_interval must be at least 1".to_string(),
            ));
        }

        if self.audio.buffer_frames == 0 {
            return Err(CliError::Config(
                "audio.buffer_frames must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            looping: self.playback.looping,
            shuffle: self.playback.shuffle,
            progress_interval: self.playback.progress_interval,
            seed: self.playback.seed,
        }
    }
}

// Default values
fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        looping: false,
        shuffle: false,
        progress_interval: default_progress_interval(),
        seed: None,
    }
}

fn default_progress_interval() -> u32 {
    40
}

fn default_audio() -> AudioSettings {
    AudioSettings {
        null_output: false,
        buffer_frames: default_buffer_frames(),
    }
}

fn default_buffer_frames() -> usize {
    cadence_desktop::DEFAULT_QUEUE_DEPTH
}

fn default_log_filter() -> String {
    "cadence=info,cadence_playback=info".to_string()
}

/// Source for `CADENCE_`-prefixed environment variables
fn environment() -> config::Environment {
    config::Environment::with_prefix("CADENCE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            audio: default_audio(),
            log_filter: default_log_filter(),
        }
    }
}
