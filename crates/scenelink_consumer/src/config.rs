//! Viewer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::CameraState;

/// Default number of messages applied per frame.
pub const DEFAULT_MESSAGES_PER_FRAME: usize = 1;

/// Default frame rate.
pub const DEFAULT_TARGET_FPS: f64 = 60.0;

/// Configuration for the renderer-side frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Messages taken from the channel each frame. Zero drains everything
    /// queued.
    pub messages_per_frame: usize,
    /// Target frames per second.
    pub target_fps: f64,
    /// Camera used until the first camera message arrives.
    pub default_camera: CameraState,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            messages_per_frame: DEFAULT_MESSAGES_PER_FRAME,
            target_fps: DEFAULT_TARGET_FPS,
            default_camera: CameraState::default(),
        }
    }
}

impl ViewerConfig {
    /// Set the per-frame message budget.
    #[must_use]
    pub fn with_messages_per_frame(mut self, messages_per_frame: usize) -> Self {
        self.messages_per_frame = messages_per_frame;
        self
    }

    /// Set the target frame rate.
    #[must_use]
    pub fn with_target_fps(mut self, target_fps: f64) -> Self {
        self.target_fps = target_fps;
        self
    }

    /// Set the initial camera.
    #[must_use]
    pub fn with_default_camera(mut self, camera: CameraState) -> Self {
        self.default_camera = camera;
        self
    }

    /// Time budget of one frame. A non-positive rate means no pacing.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        if self.target_fps > 0.0 && self.target_fps.is_finite() {
            Duration::from_secs_f64(1.0 / self.target_fps)
        } else {
            Duration::ZERO
        }
    }
}
