//! An in-memory authoring scene.
//!
//! [`MemoryScene`] implements [`SceneGraph`] over plain owned data. It backs
//! the tests and the demo binary, and documents by example what the producer
//! expects from a real authoring application.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};

use scenelink_wire::Identity;

use crate::scene::{CameraView, Face, NodeCategory, NodeHandle, SceneGraph};

#[derive(Debug, Clone)]
enum NodeData {
    Transform { local: Mat4 },
    Mesh {
        faces: Vec<Face>,
        intermediate: bool,
        shading_groups: Vec<NodeHandle>,
    },
    ShadingGroup { shader: Option<NodeHandle> },
    Shader {
        color: Vec3,
        diffuse: Option<f32>,
        texture: Option<NodeHandle>,
    },
    FileTexture { path: String },
    Light,
    Other,
}

impl NodeData {
    fn category(&self) -> NodeCategory {
        match self {
            NodeData::Transform { .. } => NodeCategory::Transform,
            NodeData::Mesh { .. } => NodeCategory::Mesh,
            NodeData::ShadingGroup { .. } => NodeCategory::ShadingGroup,
            NodeData::Shader { .. } => NodeCategory::Shader,
            NodeData::FileTexture { .. } => NodeCategory::FileTexture,
            NodeData::Light => NodeCategory::Light,
            NodeData::Other => NodeCategory::Other,
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryNode {
    identity: Identity,
    name: String,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    pending_deletion: bool,
    data: NodeData,
}

/// A scene graph held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<NodeHandle, MemoryNode>,
    next_handle: u64,
    camera: Option<CameraView>,
}

impl MemoryScene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the scene has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, name: &str, parent: Option<NodeHandle>, data: NodeData) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(handle);
        }
        self.nodes.insert(
            handle,
            MemoryNode {
                identity: Identity::new_v4(),
                name: name.to_string(),
                parent,
                children: Vec::new(),
                pending_deletion: false,
                data,
            },
        );
        handle
    }

    /// Add a transform under `parent` (or at the root).
    pub fn add_transform(
        &mut self,
        name: &str,
        parent: Option<NodeHandle>,
        local: Mat4,
    ) -> NodeHandle {
        self.insert(name, parent, NodeData::Transform { local })
    }

    /// Add a mesh shape under a transform.
    pub fn add_mesh(&mut self, name: &str, parent: NodeHandle, faces: Vec<Face>) -> NodeHandle {
        self.insert(
            name,
            Some(parent),
            NodeData::Mesh {
                faces,
                intermediate: false,
                shading_groups: Vec::new(),
            },
        )
    }

    /// Add a surface shader.
    pub fn add_shader(&mut self, name: &str, color: Vec3, diffuse: Option<f32>) -> NodeHandle {
        self.insert(
            name,
            None,
            NodeData::Shader {
                color,
                diffuse,
                texture: None,
            },
        )
    }

    /// Add a shading group, optionally with a surface shader connected.
    pub fn add_shading_group(&mut self, name: &str, shader: Option<NodeHandle>) -> NodeHandle {
        self.insert(name, None, NodeData::ShadingGroup { shader })
    }

    /// Add a file texture node.
    pub fn add_file_texture(&mut self, name: &str, path: &str) -> NodeHandle {
        self.insert(
            name,
            None,
            NodeData::FileTexture {
                path: path.to_string(),
            },
        )
    }

    /// Add a light shape under a transform.
    pub fn add_light(&mut self, name: &str, parent: NodeHandle) -> NodeHandle {
        self.insert(name, Some(parent), NodeData::Light)
    }

    /// Add a node the producer has no interest in.
    pub fn add_other(&mut self, name: &str) -> NodeHandle {
        self.insert(name, None, NodeData::Other)
    }

    /// Assign a mesh to a shading group. Assigning twice is a no-op.
    pub fn assign(&mut self, mesh: NodeHandle, shading_group: NodeHandle) {
        if let Some(NodeData::Mesh { shading_groups, .. }) = self.data_mut(mesh) {
            if !shading_groups.contains(&shading_group) {
                shading_groups.push(shading_group);
            }
        }
    }

    /// Remove every shading-group assignment of a mesh.
    pub fn unassign_all(&mut self, mesh: NodeHandle) {
        if let Some(NodeData::Mesh { shading_groups, .. }) = self.data_mut(mesh) {
            shading_groups.clear();
        }
    }

    /// Connect a shader to a shading group's surface-shader input.
    pub fn set_surface_shader(&mut self, shading_group: NodeHandle, shader: Option<NodeHandle>) {
        if let Some(NodeData::ShadingGroup { shader: slot }) = self.data_mut(shading_group) {
            *slot = shader;
        }
    }

    /// Connect a file texture to a shader's colour input.
    pub fn connect_texture(&mut self, texture: NodeHandle, shader: NodeHandle) {
        if let Some(NodeData::Shader { texture: slot, .. }) = self.data_mut(shader) {
            *slot = Some(texture);
        }
    }

    /// Change a file texture's path.
    pub fn set_texture_path(&mut self, texture: NodeHandle, new_path: &str) {
        if let Some(NodeData::FileTexture { path }) = self.data_mut(texture) {
            *path = new_path.to_string();
        }
    }

    /// Change a shader's colour.
    pub fn set_shader_color(&mut self, shader: NodeHandle, new_color: Vec3) {
        if let Some(NodeData::Shader { color, .. }) = self.data_mut(shader) {
            *color = new_color;
        }
    }

    /// Change a transform's local matrix.
    pub fn set_local_matrix(&mut self, transform: NodeHandle, matrix: Mat4) {
        if let Some(NodeData::Transform { local }) = self.data_mut(transform) {
            *local = matrix;
        }
    }

    /// Replace a mesh's faces.
    pub fn set_faces(&mut self, mesh: NodeHandle, new_faces: Vec<Face>) {
        if let Some(NodeData::Mesh { faces, .. }) = self.data_mut(mesh) {
            *faces = new_faces;
        }
    }

    /// Mark a mesh as construction history.
    pub fn set_intermediate(&mut self, mesh: NodeHandle, value: bool) {
        if let Some(NodeData::Mesh { intermediate, .. }) = self.data_mut(mesh) {
            *intermediate = value;
        }
    }

    /// Flag a node as being deleted. It stays queryable until
    /// [`remove_node`](Self::remove_node).
    pub fn mark_for_deletion(&mut self, node: NodeHandle) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.pending_deletion = true;
        }
    }

    /// Delete a node and every connection to it. DAG children are deleted
    /// with it.
    pub fn remove_node(&mut self, node: NodeHandle) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        for child in removed.children {
            self.remove_node(child);
        }
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
        for other in self.nodes.values_mut() {
            match &mut other.data {
                NodeData::Mesh { shading_groups, .. } => shading_groups.retain(|sg| *sg != node),
                NodeData::ShadingGroup { shader } if *shader == Some(node) => *shader = None,
                NodeData::Shader { texture, .. } if *texture == Some(node) => *texture = None,
                _ => {}
            }
        }
    }

    /// Set the active viewport camera.
    pub fn set_camera(&mut self, view: CameraView) {
        self.camera = Some(view);
    }

    /// The node with the given identity.
    #[must_use]
    pub fn find(&self, identity: Identity) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, n)| n.identity == identity)
            .map(|(h, _)| *h)
    }

    fn data(&self, node: NodeHandle) -> Option<&NodeData> {
        self.nodes.get(&node).map(|n| &n.data)
    }

    fn data_mut(&mut self, node: NodeHandle) -> Option<&mut NodeData> {
        self.nodes.get_mut(&node).map(|n| &mut n.data)
    }

    fn local_matrix(&self, node: NodeHandle) -> Mat4 {
        match self.data(node) {
            Some(NodeData::Transform { local }) => *local,
            _ => Mat4::IDENTITY,
        }
    }
}

impl SceneGraph for MemoryScene {
    fn nodes(&self) -> Vec<NodeHandle> {
        self.nodes.keys().copied().collect()
    }

    fn category(&self, node: NodeHandle) -> Option<NodeCategory> {
        self.data(node).map(NodeData::category)
    }

    fn identity(&self, node: NodeHandle) -> Option<Identity> {
        self.nodes.get(&node).map(|n| n.identity)
    }

    fn name(&self, node: NodeHandle) -> Option<String> {
        self.nodes.get(&node).map(|n| n.name.clone())
    }

    fn has_mesh_descendant(&self, node: NodeHandle) -> bool {
        self.children(node).into_iter().any(|child| {
            self.category(child) == Some(NodeCategory::Mesh) || self.has_mesh_descendant(child)
        })
    }

    fn is_intermediate(&self, node: NodeHandle) -> bool {
        matches!(
            self.data(node),
            Some(NodeData::Mesh {
                intermediate: true,
                ..
            })
        )
    }

    fn is_pending_deletion(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.pending_deletion)
    }

    fn world_matrix(&self, node: NodeHandle) -> Option<Mat4> {
        let mut current = self.nodes.get(&node)?;
        let mut matrix = self.local_matrix(node);
        while let Some(parent) = current.parent {
            matrix = self.local_matrix(parent) * matrix;
            current = self.nodes.get(&parent)?;
        }
        Some(matrix)
    }

    fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn faces(&self, mesh: NodeHandle) -> Option<Vec<Face>> {
        match self.data(mesh) {
            Some(NodeData::Mesh { faces, .. }) => Some(faces.clone()),
            _ => None,
        }
    }

    fn downstream_shading_groups(&self, node: NodeHandle) -> Vec<NodeHandle> {
        match self.data(node) {
            Some(NodeData::Mesh { shading_groups, .. }) => shading_groups
                .iter()
                .copied()
                .filter(|sg| self.nodes.contains_key(sg))
                .collect(),
            Some(NodeData::Shader { .. }) => self.groups_where(|shader| shader == node),
            Some(NodeData::FileTexture { .. }) => self.groups_where(|shader| {
                matches!(
                    self.data(shader),
                    Some(NodeData::Shader { texture: Some(t), .. }) if *t == node
                )
            }),
            _ => Vec::new(),
        }
    }

    fn surface_shader(&self, shading_group: NodeHandle) -> Option<NodeHandle> {
        match self.data(shading_group) {
            Some(NodeData::ShadingGroup { shader }) => *shader,
            _ => None,
        }
    }

    fn shading_group_meshes(&self, shading_group: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .filter(|(_, n)| match &n.data {
                NodeData::Mesh { shading_groups, .. } => shading_groups.contains(&shading_group),
                _ => false,
            })
            .map(|(h, _)| *h)
            .collect()
    }

    fn shader_color(&self, shader: NodeHandle) -> Option<Vec3> {
        match self.data(shader) {
            Some(NodeData::Shader { color, .. }) => Some(*color),
            _ => None,
        }
    }

    fn diffuse_weight(&self, shader: NodeHandle) -> Option<f32> {
        match self.data(shader) {
            Some(NodeData::Shader { diffuse, .. }) => *diffuse,
            _ => None,
        }
    }

    fn color_texture(&self, shader: NodeHandle) -> Option<String> {
        let Some(NodeData::Shader {
            texture: Some(texture),
            ..
        }) = self.data(shader)
        else {
            return None;
        };
        match self.data(*texture) {
            Some(NodeData::FileTexture { path }) => Some(path.clone()),
            _ => None,
        }
    }

    fn active_camera(&self) -> Option<CameraView> {
        self.camera
    }
}

impl MemoryScene {
    fn groups_where(&self, shader_matches: impl Fn(NodeHandle) -> bool) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .filter_map(|(h, n)| match n.data {
                NodeData::ShadingGroup { shader: Some(s) } if shader_matches(s) => Some(*h),
                _ => None,
            })
            .collect()
    }
}
