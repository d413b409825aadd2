//! # scenelink_producer
//!
//! Authoring-side half of the scene link. Watches an authoring scene through
//! the [`SceneGraph`] trait and writes one scene message per relevant change
//! to a [`MessageSender`](scenelink_transport::MessageSender).
//!
//! This crate provides:
//!
//! - [`scene`]: the read-only authoring scene contract.
//! - [`notify`]: attribute-change notification flags.
//! - [`extract`]: snapshot extraction for each entity kind.
//! - [`context`]: pending set, observers and announced identities.
//! - [`emitter`]: encoding, sending and counting.
//! - [`reconciler`]: the [`Producer`] state machine.
//! - [`memory`]: an in-memory [`SceneGraph`] for tests and demos.
//! - [`config`]: producer configuration.

pub mod config;
pub mod context;
pub mod emitter;
pub mod extract;
pub mod memory;
pub mod notify;
pub mod reconciler;
pub mod scene;

pub use config::ProducerConfig;
pub use context::{Observer, ProducerContext};
pub use emitter::ProducerStats;
pub use memory::MemoryScene;
pub use notify::{AttributeChange, AttributeMessage};
pub use reconciler::Producer;
pub use scene::{CameraView, Face, FaceCorner, NodeCategory, NodeHandle, SceneGraph};
