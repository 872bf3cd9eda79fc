//! Configuration file management for the SpeakAI client.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Backend server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the SpeakAI backend, e.g. "https://api.speakai.app"
    /// Can be overridden with the SPEAKAI_SERVER_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for the health pre-flight probe, in seconds
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    /// Timeout for the speech analysis upload, in seconds
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_upload_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            health_timeout_secs: default_health_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Returns the effective base URL, preferring the SPEAKAI_SERVER_URL
    /// environment variable over the config file value.
    pub fn effective_base_url(&self) -> String {
        std::env::var("SPEAKAI_SERVER_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Audio recording and processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `speakai list-devices`
    /// - device name from `speakai list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Recording sample rate in Hz (16000 recommended for speech analysis)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Output audio format string: "codec [ffmpeg_options]".
    /// The backend expects audio/mp4, so the default encodes AAC in an m4a container.
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Speech rate passed to the system text-to-speech engine for read-aloud
    /// (words per minute; typical range 120-220)
    #[serde(default = "default_speech_rate")]
    pub speech_rate: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_output_format() -> String {
    "aac -b:a 32k".to_string()
}

fn default_speech_rate() -> u32 {
    160
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            output_format: default_output_format(),
            speech_rate: default_speech_rate(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakaiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

impl SpeakaiConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// If the config file does not exist yet, a default configuration is
    /// written first so the user has something to edit.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read or created
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            let config = SpeakaiConfig::default();
            config.save()?;
            return Ok(config);
        }
        let config_content = fs::read_to_string(&config_path)?;
        let config: SpeakaiConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the config directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_dir = config_dir.join(".config").join("speakai");

    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("speakai.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = SpeakaiConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SpeakaiConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.base_url, config.server.base_url);
        assert_eq!(parsed.audio.sample_rate, 16000);
        assert_eq!(parsed.audio.device, "default");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: SpeakaiConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.server.health_timeout_secs, 5);
        assert_eq!(parsed.server.upload_timeout_secs, 120);
        assert_eq!(parsed.audio.output_format, "aac -b:a 32k");
    }
}
