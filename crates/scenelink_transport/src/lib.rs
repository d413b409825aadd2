//! # scenelink_transport
//!
//! Carries complete scene messages from the producer to the consumer.
//!
//! The contract is deliberately small: [`MessageSender::send`] queues one
//! message no larger than the channel's ceiling, and
//! [`MessageReceiver::try_receive`] takes the oldest message without
//! blocking. Messages are delivered in FIFO order, never batched, split or
//! deduplicated.
//!
//! This crate provides:
//!
//! - [`ring`]: bounded byte ring of length-prefixed records.
//! - [`channel`]: the sender/receiver traits and a shared-ring channel.
//! - [`config`]: channel configuration and environment overrides.
//! - [`error`]: transport error types.

pub mod channel;
pub mod config;
pub mod error;
pub mod ring;

pub use channel::{MessageReceiver, MessageSender, RingReceiver, RingSender, shared_channel};
pub use config::ChannelConfig;
pub use error::TransportError;
pub use ring::ByteRing;
