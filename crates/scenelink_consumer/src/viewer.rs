//! Renderer frame loop.
//!
//! Each frame takes a bounded number of messages from the channel, applies
//! them, then renders the whole scene. A frame with nothing queued renders the
//! previous state.

use std::time::Instant;

use tracing::{debug, info, warn};

use scenelink_transport::MessageReceiver;

use crate::config::ViewerConfig;
use crate::reconciler::{Consumer, ConsumerStats, Outcome};
use crate::render::RenderSink;
use crate::texture::TextureLoader;

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Messages taken from the channel.
    pub received: usize,
    /// Of those, how many changed state.
    pub applied: usize,
    /// Meshes handed to the sink.
    pub drawn: usize,
}

/// Polls a channel and renders the resulting scene.
#[derive(Debug)]
pub struct Viewer<R, L> {
    receiver: R,
    consumer: Consumer<L>,
    config: ViewerConfig,
    frame_id: u64,
    transport_errors: u64,
}

impl<R: MessageReceiver, L: TextureLoader> Viewer<R, L> {
    /// Create a viewer reading from `receiver`.
    #[must_use]
    pub fn new(config: ViewerConfig, receiver: R, loader: L) -> Self {
        let consumer = Consumer::with_camera(loader, config.default_camera);
        Self {
            receiver,
            consumer,
            config,
            frame_id: 0,
            transport_errors: 0,
        }
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// The reconciler and its scene.
    #[must_use]
    pub fn consumer(&self) -> &Consumer<L> {
        &self.consumer
    }

    /// Reconciler counters.
    #[must_use]
    pub fn stats(&self) -> ConsumerStats {
        self.consumer.stats()
    }

    /// Times the channel reported damage and was reset.
    #[must_use]
    pub fn transport_errors(&self) -> u64 {
        self.transport_errors
    }

    /// Poll, apply, render.
    pub fn frame<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> FrameReport {
        self.frame_id += 1;
        let mut report = FrameReport::default();
        let budget = self.config.messages_per_frame;

        while budget == 0 || report.received < budget {
            match self.receiver.try_receive() {
                Ok(Some(bytes)) => {
                    report.received += 1;
                    if self.consumer.receive(&bytes) == Outcome::Applied {
                        report.applied += 1;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.transport_errors += 1;
                    warn!(frame_id = self.frame_id, error = %err, "channel reset");
                    break;
                }
            }
        }

        report.drawn = self.consumer.state().render(sink);
        debug!(
            frame_id = self.frame_id,
            received = report.received,
            drawn = report.drawn,
            "frame"
        );
        report
    }

    /// Run frames at the configured rate.
    ///
    /// Stops after `max_frames` frames, or, when `max_frames` is zero, on the
    /// first idle frame after the sender has gone. Returns the number of
    /// frames run.
    pub fn run<S: RenderSink + ?Sized>(&mut self, sink: &mut S, max_frames: u64) -> u64 {
        let budget = self.config.frame_budget();
        let mut frames = 0u64;

        info!(
            target_fps = self.config.target_fps,
            messages_per_frame = self.config.messages_per_frame,
            max_frames,
            "starting frame loop"
        );

        loop {
            let start = Instant::now();
            let report = self.frame(sink);
            frames += 1;

            if max_frames > 0 && frames >= max_frames {
                break;
            }
            if max_frames == 0 && report.received == 0 && !self.receiver.is_connected() {
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < budget {
                std::thread::sleep(budget - elapsed);
            } else if !budget.is_zero() {
                warn!(
                    frame_id = self.frame_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }

        info!(frames, stats = ?self.stats(), "frame loop complete");
        frames
    }
}
