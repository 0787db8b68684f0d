use crate::audio::CaptureConfig;
use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub transcription: TranscriptionConfig,
    pub summarizer: SummarizerConfig,
    pub behavior: BehaviorConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Speech engine HTTP endpoint. Accepts a JSON body with base64 WAV content.
    pub endpoint: String,
    pub language: String,
    /// Maximum time to wait for one transcription request.
    pub timeout_seconds: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/inference".to_string(),
            language: "en".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Base URL of the local text-generation endpoint.
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Keep the captured WAV next to the transcript and summary artifacts.
    pub retain_audio: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            retain_audio: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6840, // MTG in numbers
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_recorder_settings() {
        let config = Config::default();
        assert_eq!(config.capture.sample_rate, 44_100);
        assert_eq!(config.capture.channels, 2);
        assert_eq!(config.capture.frames_per_chunk, 1024);
        assert_eq!(config.summarizer.model, "llama3.2:3b");
        assert!(!config.behavior.retain_audio);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.summarizer.endpoint, config.summarizer.endpoint);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[summarizer]\nmodel = \"llama3\"\n").unwrap();
        assert_eq!(parsed.summarizer.model, "llama3");
        assert_eq!(parsed.summarizer.timeout_seconds, 60);
        assert_eq!(parsed.capture.sample_rate, 44_100);
    }
}
