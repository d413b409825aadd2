//! # scenelink_wire
//!
//! The binary message format exchanged between the authoring-side producer
//! and the rendering-side consumer.
//!
//! Every message is an [`Envelope`] (activity, kind, identity) followed by a
//! kind-specific [`Payload`]. Variable-length arrays are always preceded by a
//! count, so a message is self-describing and [`decode`] can reject any
//! buffer whose length disagrees with its own header.
//!
//! This crate provides:
//!
//! - [`identity`]: the UUID join key and its 37-byte field.
//! - [`envelope`]: activity and entity-kind enumerators.
//! - [`payload`]: mesh, material, transform, camera and light bodies.
//! - [`layout`]: byte sizes and offsets of every section.
//! - [`codec`]: [`encode`] and [`decode`].
//! - [`error`]: [`WireError`].

pub mod codec;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod layout;
pub mod payload;

pub use codec::{Message, decode, encode, encoded_len};
pub use envelope::{Activity, EntityKind, Envelope};
pub use error::WireError;
pub use identity::Identity;
pub use payload::{
    CameraPayload, LightPayload, MaterialPayload, MeshPayload, Payload, TransformPayload,
};
