//! Transport-layer error types.

/// Errors that can occur while moving messages through a channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The message exceeds the channel's maximum message size.
    #[error("message of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Size of the rejected message.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// The ring stayed full for the whole send timeout.
    #[error("channel full, dropped a {size} byte message")]
    Full {
        /// Size of the rejected message.
        size: usize,
    },

    /// The other end of the channel has been dropped.
    #[error("channel disconnected")]
    Disconnected,

    /// A record header in the ring was inconsistent.
    #[error("ring buffer corrupted at offset {offset}")]
    Corrupt {
        /// Ring offset of the bad record.
        offset: usize,
    },

    /// A channel configuration value was rejected.
    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),
}
