//! The authoring application, as seen by the producer.
//!
//! [`SceneGraph`] is the only way the producer reads the authoring scene. Every
//! query takes a [`NodeHandle`] and answers `None` (or an empty list) for a
//! node that no longer exists or has the wrong category, so the producer never
//! needs to check existence first.

use glam::{Mat4, Vec2, Vec3};

use scenelink_wire::Identity;

/// Opaque handle to an authoring-side node. Only meaningful to the
/// [`SceneGraph`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// The node categories the producer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// A DAG transform.
    Transform,
    /// A polygon mesh shape.
    Mesh,
    /// A shading group joining meshes to a surface shader.
    ShadingGroup,
    /// A surface shader (the material values).
    Shader,
    /// A file texture node feeding a shader.
    FileTexture,
    /// A camera shape.
    Camera,
    /// A light shape.
    Light,
    /// Anything else.
    Other,
}

/// One polygon corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceCorner {
    /// Position in the mesh's object space.
    pub position: Vec3,
    /// UV in the authoring convention (V up).
    pub uv: Vec2,
    /// Vertex normal at this corner.
    pub normal: Vec3,
}

impl FaceCorner {
    /// Create a new corner.
    #[must_use]
    pub const fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

/// A polygon face, corners in winding order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Face {
    /// Corners in winding order.
    pub corners: Vec<FaceCorner>,
}

impl Face {
    /// Create a face from its corners.
    #[must_use]
    pub fn new(corners: Vec<FaceCorner>) -> Self {
        Self { corners }
    }

    /// Number of triangles this face splits into.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.corners.len().saturating_sub(2)
    }
}

/// Pose of the active viewport camera, in authoring units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Identity of the camera node.
    pub identity: Identity,
    /// Eye point in world space.
    pub eye: Vec3,
    /// Centre of interest in world space.
    pub center_of_interest: Vec3,
    /// Up direction in world space.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub vertical_fov: f32,
    /// `true` for an orthographic camera.
    pub orthographic: bool,
}

/// Read-only queries against the authoring scene.
pub trait SceneGraph {
    /// Every node that currently exists, in creation order.
    fn nodes(&self) -> Vec<NodeHandle>;

    /// The node's category, or `None` if it no longer exists.
    fn category(&self, node: NodeHandle) -> Option<NodeCategory>;

    /// The node's persistent identity.
    fn identity(&self, node: NodeHandle) -> Option<Identity>;

    /// Display name, used only for diagnostics.
    fn name(&self, node: NodeHandle) -> Option<String>;

    /// Returns `true` if a mesh shape sits anywhere below this DAG node.
    fn has_mesh_descendant(&self, node: NodeHandle) -> bool;

    /// Returns `true` for a construction-history mesh that is never drawn.
    fn is_intermediate(&self, node: NodeHandle) -> bool;

    /// Returns `true` while the node is being deleted.
    fn is_pending_deletion(&self, node: NodeHandle) -> bool;

    /// The inclusive world matrix of a DAG node.
    fn world_matrix(&self, node: NodeHandle) -> Option<Mat4>;

    /// Direct DAG children.
    fn children(&self, node: NodeHandle) -> Vec<NodeHandle>;

    /// The DAG parent, or `None` at the root.
    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// Polygon faces of a mesh shape.
    fn faces(&self, mesh: NodeHandle) -> Option<Vec<Face>>;

    /// Shading groups downstream of a mesh, shader or file texture, in
    /// connection order.
    fn downstream_shading_groups(&self, node: NodeHandle) -> Vec<NodeHandle>;

    /// The shader connected to a shading group's surface-shader input.
    fn surface_shader(&self, shading_group: NodeHandle) -> Option<NodeHandle>;

    /// Meshes upstream of (assigned to) a shading group.
    fn shading_group_meshes(&self, shading_group: NodeHandle) -> Vec<NodeHandle>;

    /// A shader's base colour.
    fn shader_color(&self, shader: NodeHandle) -> Option<Vec3>;

    /// A shader's scalar diffuse weight, if it has one.
    fn diffuse_weight(&self, shader: NodeHandle) -> Option<f32>;

    /// Path of a file texture upstream of the shader's colour input.
    fn color_texture(&self, shader: NodeHandle) -> Option<String>;

    /// The camera of the active viewport.
    fn active_camera(&self) -> Option<CameraView>;
}
