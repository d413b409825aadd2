//! Snapshot extraction: authoring scene data to wire payloads.

use glam::{Vec2, Vec3};

use scenelink_wire::{CameraPayload, Identity, MaterialPayload, MeshPayload, TransformPayload};

use crate::scene::{Face, FaceCorner, NodeHandle, SceneGraph};

/// Colour used when a shader exposes no colour input.
pub const FALLBACK_COLOR: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// The shading group and shader feeding a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialLink {
    /// First downstream shading group with a surface shader.
    pub shading_group: NodeHandle,
    /// The shader on that group's surface-shader input.
    pub shader: NodeHandle,
}

/// Find the material feeding a mesh: the first downstream shading group, then
/// the shader on its surface-shader input.
#[must_use]
pub fn resolve_material<S: SceneGraph + ?Sized>(
    scene: &S,
    mesh: NodeHandle,
) -> Option<MaterialLink> {
    scene
        .downstream_shading_groups(mesh)
        .into_iter()
        .find_map(|shading_group| {
            scene.surface_shader(shading_group).map(|shader| MaterialLink {
                shading_group,
                shader,
            })
        })
}

/// Identity of the material feeding a mesh, or [`Identity::NIL`].
#[must_use]
pub fn material_identity<S: SceneGraph + ?Sized>(scene: &S, mesh: NodeHandle) -> Identity {
    resolve_material(scene, mesh)
        .and_then(|link| scene.identity(link.shader))
        .unwrap_or(Identity::NIL)
}

/// Expand a mesh into a non-indexed triangle list.
///
/// Each face is fan-triangulated from its first corner. Every triangle corner
/// becomes its own vertex carrying its position, its UV with V flipped, and
/// the face's averaged normal. Faces with fewer than three corners are
/// skipped.
#[must_use]
pub fn extract_mesh<S: SceneGraph + ?Sized>(scene: &S, mesh: NodeHandle) -> Option<MeshPayload> {
    let faces = scene.faces(mesh)?;
    let mut payload = triangulate(&faces);
    payload.material = material_identity(scene, mesh);
    Some(payload)
}

fn triangulate(faces: &[Face]) -> MeshPayload {
    let triangles: usize = faces.iter().map(Face::triangle_count).sum();
    let vertices = triangles * 3;
    let mut payload = MeshPayload {
        triangle_count: 0,
        material: Identity::NIL,
        positions: Vec::with_capacity(vertices * 3),
        uvs: Vec::with_capacity(vertices * 2),
        normals: Vec::with_capacity(vertices * 3),
    };

    for face in faces {
        let Some((first, rest)) = face.corners.split_first() else {
            continue;
        };
        let normal = face_normal(&face.corners);
        for pair in rest.windows(2) {
            for corner in [first, &pair[0], &pair[1]] {
                push_corner(&mut payload, corner, normal);
            }
            payload.triangle_count += 1;
        }
    }
    payload
}

fn push_corner(payload: &mut MeshPayload, corner: &FaceCorner, normal: Vec3) {
    payload.positions.extend_from_slice(&corner.position.to_array());
    let uv = Vec2::new(corner.uv.x, 1.0 - corner.uv.y);
    payload.uvs.extend_from_slice(&uv.to_array());
    payload.normals.extend_from_slice(&normal.to_array());
}

fn face_normal(corners: &[FaceCorner]) -> Vec3 {
    corners
        .iter()
        .map(|c| c.normal)
        .sum::<Vec3>()
        .normalize_or_zero()
}

/// Snapshot a shader's colour and texture.
///
/// The colour is multiplied by the diffuse weight when the shader has one.
/// A connected texture with an empty path counts as no texture.
#[must_use]
pub fn extract_material<S: SceneGraph + ?Sized>(scene: &S, shader: NodeHandle) -> MaterialPayload {
    let color = scene.shader_color(shader).unwrap_or(FALLBACK_COLOR);
    let weight = scene.diffuse_weight(shader).unwrap_or(1.0);
    let texture = scene.color_texture(shader).filter(|path| !path.is_empty());
    MaterialPayload {
        color: color * weight,
        texture,
    }
}

/// Snapshot a transform's inclusive world matrix.
#[must_use]
pub fn extract_transform<S: SceneGraph + ?Sized>(
    scene: &S,
    transform: NodeHandle,
) -> Option<TransformPayload> {
    scene
        .world_matrix(transform)
        .map(|matrix| TransformPayload { matrix })
}

/// Snapshot the active viewport camera. The field of view goes out in
/// degrees.
#[must_use]
pub fn extract_camera<S: SceneGraph + ?Sized>(scene: &S) -> Option<(Identity, CameraPayload)> {
    scene.active_camera().map(|view| {
        (
            view.identity,
            CameraPayload {
                position: view.eye,
                target: view.center_of_interest,
                up: view.up,
                fov_y_degrees: view.vertical_fov.to_degrees(),
                orthographic: view.orthographic,
            },
        )
    })
}
