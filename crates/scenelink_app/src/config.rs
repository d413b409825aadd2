//! Demo configuration, read from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scenelink_consumer::ViewerConfig;
use scenelink_producer::ProducerConfig;
use scenelink_transport::ChannelConfig;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "SCENELINK_CONFIG";

/// Everything the demo needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The channel both sides share. Replaces `producer.channel`.
    pub channel: ChannelConfig,
    /// Producer settings.
    pub producer: ProducerConfig,
    /// Viewer settings.
    pub viewer: ViewerConfig,
    /// Frames to render; zero runs until the producer finishes.
    pub frames: u64,
    /// Edits the scripted author makes after the initial sync.
    pub animation_steps: u32,
    /// Optional texture file for the demo's textured material.
    pub texture: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            producer: ProducerConfig::default(),
            viewer: ViewerConfig::default().with_messages_per_frame(4),
            frames: 0,
            animation_steps: 30,
            texture: None,
        }
    }
}

impl AppConfig {
    /// Load from the file named by [`CONFIG_ENV`], or use defaults. Channel
    /// environment overrides apply either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override
    /// is invalid.
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON for
    /// this structure.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        self.channel = self.channel.with_env_overrides()?;
        self.channel.validate()?;
        Ok(self)
    }

    /// Producer settings with the shared channel applied.
    #[must_use]
    pub fn producer(&self) -> ProducerConfig {
        self.producer.clone().with_channel(self.channel.clone())
    }
}
