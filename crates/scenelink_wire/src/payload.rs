//! Kind-specific message bodies.

use glam::{Mat4, Vec3};

use crate::envelope::EntityKind;
use crate::error::WireError;
use crate::identity::Identity;
use crate::layout::{NORMAL_COMPONENTS, POSITION_COMPONENTS, UV_COMPONENTS};

/// A non-indexed triangle list.
///
/// Every triangle corner is its own vertex, so shared edges repeat their
/// vertices. The three arrays are parallel: vertex `i` uses
/// `positions[3i..3i+3]`, `uvs[2i..2i+2]` and `normals[3i..3i+3]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshPayload {
    /// Number of triangles; always `vertex_count / 3`.
    pub triangle_count: u32,
    /// The material feeding this mesh, or [`Identity::NIL`] if unresolved.
    pub material: Identity,
    /// Object-space XYZ per vertex; the consumer applies the bound transform.
    pub positions: Vec<f32>,
    /// UV per vertex, V already flipped for the renderer.
    pub uvs: Vec<f32>,
    /// XYZ normal per vertex.
    pub normals: Vec<f32>,
}

impl MeshPayload {
    /// Number of expanded vertices, derived from the position array.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    /// Check that counts and array lengths agree.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InconsistentMesh`] describing the mismatch.
    pub fn validate(&self) -> Result<(), WireError> {
        let vertices = self.vertex_count();
        let triangles = self.triangle_count as usize;
        let consistent = self.positions.len() == POSITION_COMPONENTS * vertices
            && self.uvs.len() == UV_COMPONENTS * vertices
            && self.normals.len() == NORMAL_COMPONENTS * vertices
            && vertices == 3 * triangles;
        if consistent {
            Ok(())
        } else {
            Err(WireError::InconsistentMesh {
                vertices,
                triangles,
                positions: self.positions.len(),
                uvs: self.uvs.len(),
                normals: self.normals.len(),
            })
        }
    }
}

/// Surface colour and optional texture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialPayload {
    /// RGB colour, already multiplied by the diffuse weight.
    pub color: Vec3,
    /// Path of a file texture feeding the colour, if any.
    pub texture: Option<String>,
}

/// An inclusive (parent-accumulated) world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPayload {
    /// The world matrix. Stored verbatim by the consumer.
    pub matrix: Mat4,
}

impl Default for TransformPayload {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }
}

/// Pose of the active viewport camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPayload {
    /// Eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// `true` for an orthographic projection.
    pub orthographic: bool,
}

/// Reserved light layout. Carried on the wire, ignored by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightPayload {
    /// World position.
    pub position: Vec3,
    /// Scalar intensity.
    pub intensity: f32,
    /// 8-bit RGB colour stored as integers.
    pub color: [i32; 3],
}

/// A kind-specific body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Mesh geometry.
    Mesh(MeshPayload),
    /// Material values.
    Material(MaterialPayload),
    /// World matrix.
    Transform(TransformPayload),
    /// Camera pose.
    Camera(CameraPayload),
    /// Light stub.
    Light(LightPayload),
}

impl Payload {
    /// The entity kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Payload::Mesh(_) => EntityKind::Mesh,
            Payload::Material(_) => EntityKind::Material,
            Payload::Transform(_) => EntityKind::Transform,
            Payload::Camera(_) => EntityKind::Camera,
            Payload::Light(_) => EntityKind::Light,
        }
    }
}

impl From<MeshPayload> for Payload {
    fn from(p: MeshPayload) -> Self {
        Payload::Mesh(p)
    }
}

impl From<MaterialPayload> for Payload {
    fn from(p: MaterialPayload) -> Self {
        Payload::Material(p)
    }
}

impl From<TransformPayload> for Payload {
    fn from(p: TransformPayload) -> Self {
        Payload::Transform(p)
    }
}

impl From<CameraPayload> for Payload {
    fn from(p: CameraPayload) -> Self {
        Payload::Camera(p)
    }
}

impl From<LightPayload> for Payload {
    fn from(p: LightPayload) -> Self {
        Payload::Light(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshPayload {
        MeshPayload {
            triangle_count: 1,
            material: Identity::NIL,
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            uvs: vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_valid_triangle() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_short_uv_array_is_inconsistent() {
        let mut mesh = triangle();
        mesh.uvs.pop();
        assert!(matches!(
            mesh.validate(),
            Err(WireError::InconsistentMesh { uvs: 5, .. })
        ));
    }

    #[test]
    fn test_triangle_count_must_match() {
        let mut mesh = triangle();
        mesh.triangle_count = 2;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_empty_mesh_is_valid() {
        assert!(MeshPayload::default().validate().is_ok());
    }
}
