//! Configuration loading for the director.
//!
//! Configuration is an on-disk JSON tree, loaded once at startup and
//! re-read only when `apply_calibration` rewrites it. Every default is
//! applied here, at load time, so the tick never consults a default
//! itself.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub audio_device: Option<String>,
    pub audio_channels: usize,
    pub automix: AutomixConfig,
    pub mics: Vec<MicConfig>,
    pub osc: OscConfig,
    pub wide: WideConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomixConfig {
    pub enabled: bool,
}

impl Default for AutomixConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// One microphone's configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MicConfig {
    pub id: String,
    pub input_channel: usize,
    pub camera: String,
    pub threshold_db: f32,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_weight() -> f32 {
    1.0
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OscConfig {
    pub host: String,
    pub port: u16,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

/// Wide-shot policy configuration; each rule is independently toggleable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WideConfig {
    #[serde(default = "default_cooldown_s")]
    pub cooldown_s: f64,
    #[serde(default = "default_min_duration_s")]
    pub min_duration_s: f64,
    #[serde(default)]
    pub multi_speaker: MultiSpeakerConfig,
    #[serde(default)]
    pub silence: SilenceConfig,
    #[serde(default)]
    pub interval: IntervalConfig,
}

fn default_cooldown_s() -> f64 {
    8.0
}

fn default_min_duration_s() -> f64 {
    3.0
}

impl Default for WideConfig {
    fn default() -> Self {
        Self {
            cooldown_s: default_cooldown_s(),
            min_duration_s: default_min_duration_s(),
            multi_speaker: MultiSpeakerConfig::default(),
            silence: SilenceConfig::default(),
            interval: IntervalConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiSpeakerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_multi_speaker_count")]
    pub count: usize,
}

fn default_multi_speaker_count() -> usize {
    2
}

impl Default for MultiSpeakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: default_multi_speaker_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SilenceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_silence_time_s")]
    pub time_s: f64,
}

fn default_silence_time_s() -> f64 {
    4.0
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time_s: default_silence_time_s(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntervalConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_every_s")]
    pub every_s: f64,
}

fn default_interval_every_s() -> f64 {
    30.0
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            every_s: default_interval_every_s(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio_device: None,
            audio_channels: 2,
            automix: AutomixConfig::default(),
            mics: Vec::new(),
            osc: OscConfig::default(),
            wide: WideConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults (with
    /// a logged warning) if the file is missing or malformed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Atomically rewrite this configuration to `path` (write to a temp
    /// file in the same directory, then rename), the single source of
    /// truth per the external interface contract.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Look up a mic's configuration by id.
    pub fn mic(&self, mic_id: &str) -> Option<&MicConfig> {
        self.mics.iter().find(|m| m.id == mic_id)
    }

    /// Look up a mic's configuration by id, mutably.
    pub fn mic_mut(&mut self, mic_id: &str) -> Option<&mut MicConfig> {
        self.mics.iter_mut().find(|m| m.id == mic_id)
    }
}
