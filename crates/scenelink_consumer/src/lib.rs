//! # scenelink_consumer
//!
//! Renderer-side half of the scene link. Takes scene messages off a
//! [`MessageReceiver`](scenelink_transport::MessageReceiver), keeps an owned
//! copy of every live entity, and hands the scene to a [`RenderSink`] each
//! frame.
//!
//! This crate provides:
//!
//! - [`store`]: mesh, material and transform stores with owned buffers.
//! - [`texture`]: texture decoding behind the [`TextureLoader`] trait.
//! - [`camera`]: the single viewer camera.
//! - [`reconciler`]: [`SceneState`] transitions and the [`Consumer`].
//! - [`render`]: the per-frame render pass.
//! - [`viewer`]: the paced frame loop.
//! - [`config`]: viewer configuration.

pub mod camera;
pub mod config;
pub mod reconciler;
pub mod render;
pub mod store;
pub mod texture;
pub mod viewer;

pub use camera::CameraState;
pub use config::ViewerConfig;
pub use reconciler::{Consumer, ConsumerStats, Outcome, SceneState};
pub use render::{DrawItem, MaterialView, RenderSink};
pub use store::{MaterialEntry, MaterialStore, MeshBuffers, MeshEntry, MeshStore, TransformStore};
pub use texture::{ImageTextureLoader, Texture, TextureError, TextureLoader};
pub use viewer::{FrameReport, Viewer};
