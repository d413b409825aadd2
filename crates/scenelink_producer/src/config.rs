//! Producer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use scenelink_transport::ChannelConfig;

/// Default minimum spacing between camera messages.
pub const DEFAULT_CAMERA_INTERVAL_MS: u64 = 15;

/// Configuration for the authoring-side producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Minimum spacing between camera messages, in milliseconds.
    pub camera_interval_ms: u64,
    /// Channel the producer writes to.
    pub channel: ChannelConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            camera_interval_ms: DEFAULT_CAMERA_INTERVAL_MS,
            channel: ChannelConfig::default(),
        }
    }
}

impl ProducerConfig {
    /// Set the camera throttle interval.
    #[must_use]
    pub fn with_camera_interval_ms(mut self, camera_interval_ms: u64) -> Self {
        self.camera_interval_ms = camera_interval_ms;
        self
    }

    /// Set the channel configuration.
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// The camera throttle interval.
    #[must_use]
    pub fn camera_interval(&self) -> Duration {
        Duration::from_millis(self.camera_interval_ms)
    }
}
