//! # scenelink_app: demo
//!
//! Streams a small scripted authoring scene to a renderer in the same process.
//!
//! ## Startup Sequence
//!
//! 1. Load [`AppConfig`](config::AppConfig) (`SCENELINK_CONFIG`, else defaults).
//! 2. Open the shared channel.
//! 3. Run the scripted author on a thread, writing through the producer.
//! 4. Run the viewer frame loop on the main thread with a logging sink.

mod config;
mod demo;

use std::thread;

use anyhow::{Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scenelink_consumer::{ImageTextureLoader, Viewer};
use scenelink_producer::{MemoryScene, Producer};
use scenelink_transport::shared_channel;

use config::AppConfig;
use demo::LogSink;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scenelink_app=info".parse()?))
        .init();

    let config = AppConfig::load()?;
    info!(channel = %config.channel.name, frames = config.frames, "scenelink demo starting");

    let (sender, receiver) = shared_channel(&config.channel)?;

    let producer_config = config.producer();
    let steps = config.animation_steps;
    let texture = config.texture.clone();
    let author = thread::Builder::new()
        .name("author".to_string())
        .spawn(move || {
            let mut scene = MemoryScene::new();
            let nodes = demo::build_scene(&mut scene, texture.as_deref());
            let mut producer = Producer::new(producer_config, sender);
            demo::author(&mut scene, nodes, &mut producer, steps)
        })?;

    let mut viewer = Viewer::new(config.viewer.clone(), receiver, ImageTextureLoader::new());
    let mut sink = LogSink::default();
    let frames = viewer.run(&mut sink, config.frames);

    let produced = author
        .join()
        .map_err(|_| anyhow!("author thread panicked"))?;

    let consumed = viewer.stats();
    info!(
        frames,
        draws = sink.draws(),
        emitted = produced.emitted,
        dropped = produced.dropped,
        applied = consumed.applied,
        rejected = consumed.rejected,
        released_meshes = consumed.released_meshes,
        texture_failures = consumed.texture_failures,
        "scenelink demo finished"
    );
    Ok(())
}
