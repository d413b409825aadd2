//! Owned entity stores.
//!
//! Each store keeps its entries in arrival order next to an id index. Order
//! matters: material indices are positions in [`MaterialStore`], and
//! placement binding picks the newest unbound transform in
//! [`TransformStore`].
//!
//! Geometry lives in [`MeshBuffers`], owned by exactly one [`MeshEntry`].
//! Replacing or removing an entry hands the old buffers back to the caller,
//! so each buffer is released exactly once.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use scenelink_wire::{Identity, MeshPayload};

use crate::texture::Texture;

// ── Meshes ──────────────────────────────────────────────────────────────

/// Non-indexed triangle geometry owned by one mesh entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    positions: Box<[f32]>,
    uvs: Box<[f32]>,
    normals: Box<[f32]>,
}

impl MeshBuffers {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// XYZ per vertex.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// UV per vertex.
    #[must_use]
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// XYZ normal per vertex.
    #[must_use]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }
}

impl From<MeshPayload> for MeshBuffers {
    fn from(payload: MeshPayload) -> Self {
        Self {
            positions: payload.positions.into_boxed_slice(),
            uvs: payload.uvs.into_boxed_slice(),
            normals: payload.normals.into_boxed_slice(),
        }
    }
}

/// A live mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEntry {
    /// Mesh identity.
    pub id: Identity,
    /// Owned geometry.
    pub buffers: MeshBuffers,
    /// Identity of the material the producer resolved, possibly nil.
    pub material: Identity,
    /// Position of that material in the material store, or the store's
    /// length when it is not known yet.
    pub material_index: usize,
    /// Transform bound to this mesh, if any.
    pub placement: Option<Identity>,
}

impl MeshEntry {
    /// Install new geometry and material reference, returning the old
    /// buffers.
    pub fn replace(
        &mut self,
        buffers: MeshBuffers,
        material: Identity,
        material_index: usize,
    ) -> MeshBuffers {
        self.material = material;
        self.material_index = material_index;
        std::mem::replace(&mut self.buffers, buffers)
    }
}

/// Live meshes in arrival order.
#[derive(Debug, Default)]
pub struct MeshStore {
    entries: Vec<MeshEntry>,
    index: HashMap<Identity, usize>,
}

impl MeshStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no mesh is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `id` is live.
    #[must_use]
    pub fn contains(&self, id: Identity) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up a mesh.
    #[must_use]
    pub fn get(&self, id: Identity) -> Option<&MeshEntry> {
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Look up a mesh for modification.
    pub fn get_mut(&mut self, id: Identity) -> Option<&mut MeshEntry> {
        self.index.get(&id).map(|&slot| &mut self.entries[slot])
    }

    /// Append a new mesh. The caller must have checked that its id is not
    /// live; a duplicate replaces the existing entry and returns it.
    pub fn insert(&mut self, entry: MeshEntry) -> Option<MeshEntry> {
        if let Some(&slot) = self.index.get(&entry.id) {
            return Some(std::mem::replace(&mut self.entries[slot], entry));
        }
        self.index.insert(entry.id, self.entries.len());
        self.entries.push(entry);
        None
    }

    /// Remove a mesh, returning it so the caller releases its buffers.
    pub fn remove(&mut self, id: Identity) -> Option<MeshEntry> {
        let slot = self.index.remove(&id)?;
        let entry = self.entries.remove(slot);
        for later in &self.entries[slot..] {
            if let Some(s) = self.index.get_mut(&later.id) {
                *s -= 1;
            }
        }
        Some(entry)
    }

    /// Meshes in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &MeshEntry> {
        self.entries.iter()
    }

    /// Meshes in arrival order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MeshEntry> {
        self.entries.iter_mut()
    }
}

// ── Materials ───────────────────────────────────────────────────────────

/// A live material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    /// Material identity.
    pub id: Identity,
    /// Colour from the last payload.
    pub color: Vec3,
    /// Colour the renderer multiplies with: white when the last payload
    /// carried a texture path, otherwise [`color`](Self::color).
    pub tint: Vec3,
    /// Path of the texture currently held.
    pub texture_path: Option<String>,
    /// The decoded texture, if one loaded.
    pub texture: Option<Texture>,
}

/// Live materials in arrival order. Positions are material indices.
#[derive(Debug, Default)]
pub struct MaterialStore {
    entries: Vec<MaterialEntry>,
    index: HashMap<Identity, usize>,
}

impl MaterialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no material is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of a material, if live.
    #[must_use]
    pub fn index_of(&self, id: Identity) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Position of a material, or the sentinel [`len`](Self::len) when it is
    /// nil or not live.
    #[must_use]
    pub fn resolve(&self, id: Identity) -> usize {
        if id.is_nil() {
            return self.len();
        }
        self.index_of(id).unwrap_or(self.len())
    }

    /// Material at a position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&MaterialEntry> {
        self.entries.get(index)
    }

    /// Look up a material.
    #[must_use]
    pub fn get(&self, id: Identity) -> Option<&MaterialEntry> {
        self.index_of(id).map(|slot| &self.entries[slot])
    }

    /// Look up a material for modification.
    pub fn get_mut(&mut self, id: Identity) -> Option<&mut MaterialEntry> {
        self.index_of(id).map(|slot| &mut self.entries[slot])
    }

    /// Insert a material, or replace it in place if its id is live. Returns
    /// the replaced entry.
    pub fn upsert(&mut self, entry: MaterialEntry) -> Option<MaterialEntry> {
        if let Some(slot) = self.index_of(entry.id) {
            return Some(std::mem::replace(&mut self.entries[slot], entry));
        }
        self.index.insert(entry.id, self.entries.len());
        self.entries.push(entry);
        None
    }

    /// Remove a material. Later materials shift down one position.
    pub fn remove(&mut self, id: Identity) -> Option<MaterialEntry> {
        let slot = self.index.remove(&id)?;
        let entry = self.entries.remove(slot);
        for later in &self.entries[slot..] {
            if let Some(s) = self.index.get_mut(&later.id) {
                *s -= 1;
            }
        }
        Some(entry)
    }

    /// Materials in index order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.entries.iter()
    }
}

// ── Transforms ──────────────────────────────────────────────────────────

/// Live world matrices, remembering arrival order.
#[derive(Debug, Default)]
pub struct TransformStore {
    order: Vec<Identity>,
    matrices: HashMap<Identity, Mat4>,
}

impl TransformStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no transform is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `id` is live.
    #[must_use]
    pub fn contains(&self, id: Identity) -> bool {
        self.matrices.contains_key(&id)
    }

    /// The world matrix of a transform.
    #[must_use]
    pub fn get(&self, id: Identity) -> Option<Mat4> {
        self.matrices.get(&id).copied()
    }

    /// Insert a transform, or replace its matrix. Either way it becomes the
    /// newest in arrival order. Returns `true` if it was new.
    pub fn upsert(&mut self, id: Identity, matrix: Mat4) -> bool {
        let is_new = self.matrices.insert(id, matrix).is_none();
        if !is_new {
            self.order.retain(|&t| t != id);
        }
        self.order.push(id);
        is_new
    }

    /// Replace the matrix of a live transform. Returns `false` if unknown.
    pub fn set(&mut self, id: Identity, matrix: Mat4) -> bool {
        match self.matrices.get_mut(&id) {
            Some(slot) => {
                *slot = matrix;
                true
            }
            None => false,
        }
    }

    /// Remove a transform. Returns `false` if unknown.
    pub fn remove(&mut self, id: Identity) -> bool {
        if self.matrices.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|&t| t != id);
        true
    }

    /// Transform ids, oldest first.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = Identity> + '_ {
        self.order.iter().copied()
    }
}
