//! Channel configuration.

use serde::{Deserialize, Serialize};

use scenelink_wire::layout::ENVELOPE_SIZE;

use crate::error::TransportError;
use crate::ring::{RECORD_ALIGN, record_size};

/// Default channel name shared by both processes.
pub const DEFAULT_CHANNEL_NAME: &str = "MayaToRender";

/// Default ring storage: 8 MiB.
pub const DEFAULT_CAPACITY_BYTES: usize = 8 * 1024 * 1024;

/// Default ceiling for a single message: 5 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 5 * 1024 * 1024;

/// The environment variable used to override the channel name.
pub const CHANNEL_NAME_ENV: &str = "SCENELINK_CHANNEL";

/// The environment variable used to override the maximum message size.
pub const MAX_MESSAGE_ENV: &str = "SCENELINK_MAX_MESSAGE";

/// Parameters shared by both ends of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Name both processes use to find the channel.
    pub name: String,
    /// Ring storage in bytes. Must be a multiple of 4.
    pub capacity_bytes: usize,
    /// Hard ceiling for a single message.
    pub max_message_size: usize,
    /// How long a send waits for free space before failing. Zero never waits.
    pub send_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHANNEL_NAME.to_string(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            send_timeout_ms: 0,
        }
    }
}

impl ChannelConfig {
    /// Apply `SCENELINK_CHANNEL` and `SCENELINK_MAX_MESSAGE` if set.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if `SCENELINK_MAX_MESSAGE`
    /// is not an unsigned integer.
    pub fn with_env_overrides(mut self) -> Result<Self, TransportError> {
        if let Ok(name) = std::env::var(CHANNEL_NAME_ENV) {
            self.name = name;
        }
        if let Ok(raw) = std::env::var(MAX_MESSAGE_ENV) {
            self.max_message_size = raw.trim().parse().map_err(|_| {
                TransportError::InvalidConfig(format!("{MAX_MESSAGE_ENV}={raw:?} is not a size"))
            })?;
        }
        Ok(self)
    }

    /// Set the channel name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the ring storage size.
    #[must_use]
    pub fn with_capacity_bytes(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    /// Set the per-message ceiling.
    #[must_use]
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Set the send timeout in milliseconds.
    #[must_use]
    pub fn with_send_timeout_ms(mut self, send_timeout_ms: u64) -> Self {
        self.send_timeout_ms = send_timeout_ms;
        self
    }

    /// Check the values against each other.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if the ring capacity is not
    /// a positive multiple of 4, the message ceiling cannot hold an envelope,
    /// or a maximum-size message would not fit in the ring.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.capacity_bytes == 0 || self.capacity_bytes % RECORD_ALIGN != 0 {
            return Err(TransportError::InvalidConfig(format!(
                "capacity_bytes {} must be a non-zero multiple of {RECORD_ALIGN}",
                self.capacity_bytes
            )));
        }
        if self.max_message_size < ENVELOPE_SIZE {
            return Err(TransportError::InvalidConfig(format!(
                "max_message_size {} is smaller than an envelope ({ENVELOPE_SIZE} bytes)",
                self.max_message_size
            )));
        }
        if record_size(self.max_message_size) > self.capacity_bytes {
            return Err(TransportError::InvalidConfig(format!(
                "max_message_size {} does not fit a {} byte ring",
                self.max_message_size, self.capacity_bytes
            )));
        }
        Ok(())
    }
}
