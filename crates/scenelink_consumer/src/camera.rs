//! The single viewer camera.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use scenelink_wire::CameraPayload;

const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 1000.0;

/// Pose and projection of the viewer camera.
///
/// Every camera message replaces the whole state; there is only ever one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraState {
    /// Eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees. For an orthographic camera this is
    /// the height of the view volume instead.
    pub fov_y_degrees: f32,
    /// `true` for an orthographic projection.
    pub orthographic: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::splat(10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            orthographic: false,
        }
    }
}

impl From<CameraPayload> for CameraState {
    fn from(payload: CameraPayload) -> Self {
        Self {
            position: payload.position,
            target: payload.target,
            up: payload.up,
            fov_y_degrees: payload.fov_y_degrees,
            orthographic: payload.orthographic,
        }
    }
}

impl CameraState {
    /// World-to-view matrix (right-handed).
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View-to-clip matrix for the given width/height ratio.
    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        if self.orthographic {
            let top = self.fov_y_degrees * 0.5;
            let right = top * aspect;
            Mat4::orthographic_rh(-right, right, -top, top, NEAR_PLANE, FAR_PLANE)
        } else {
            Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
        }
    }
}
