//! Applying scene messages to the entity stores.
//!
//! Transitions are keyed by activity and kind:
//!
//! | | Mesh | Transform | Material | Camera |
//! |---|---|---|---|---|
//! | Add | insert (upsert if live), bind newest unbound transform | insert or move to newest, bind an unplaced mesh | insert, load texture | replace |
//! | Update | swap buffers; unknown id ignored | replace matrix; unknown id ignored | replace colour, reload texture if a path is present; unknown id inserts | replace |
//! | Remove | erase, release buffers | erase, unbind meshes | erase | ignored |
//!
//! After every change to the material store each mesh's material index is
//! resolved again, so a mesh that arrived before its material picks it up as
//! soon as it lands. Light messages are accepted and ignored.

use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use scenelink_wire::{
    Activity, EntityKind, Identity, MaterialPayload, Message, MeshPayload, Payload, decode,
};

use crate::camera::CameraState;
use crate::store::{MaterialEntry, MaterialStore, MeshBuffers, MeshEntry, MeshStore, TransformStore};
use crate::texture::{Texture, TextureLoader};

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The stores changed.
    Applied,
    /// Well-formed, but nothing to do (unknown id, light, camera remove).
    Ignored,
    /// Malformed; no store changed.
    Rejected,
}

/// Running counters kept by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Messages that changed state.
    pub applied: u64,
    /// Well-formed messages with no effect.
    pub ignored: u64,
    /// Messages that failed to decode.
    pub rejected: u64,
    /// Geometry buffers released by Update, re-Add or Remove.
    pub released_meshes: u64,
    /// Textures that failed to load.
    pub texture_failures: u64,
}

/// Everything the renderer knows about the scene.
#[derive(Debug)]
pub struct SceneState {
    pub(crate) meshes: MeshStore,
    pub(crate) materials: MaterialStore,
    pub(crate) transforms: TransformStore,
    pub(crate) camera: CameraState,
    stats: ConsumerStats,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(CameraState::default())
    }
}

impl SceneState {
    /// An empty scene viewed through `camera`.
    #[must_use]
    pub fn new(camera: CameraState) -> Self {
        Self {
            meshes: MeshStore::new(),
            materials: MaterialStore::new(),
            transforms: TransformStore::new(),
            camera,
            stats: ConsumerStats::default(),
        }
    }

    /// Live meshes.
    #[must_use]
    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    /// Live materials.
    #[must_use]
    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    /// Live transforms.
    #[must_use]
    pub fn transforms(&self) -> &TransformStore {
        &self.transforms
    }

    /// The current camera.
    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Apply one decoded message. Texture paths are loaded with `loader`.
    pub fn apply<L: TextureLoader + ?Sized>(
        &mut self,
        message: Message,
        loader: &mut L,
    ) -> Outcome {
        let Message { envelope, payload } = message;
        let (activity, kind, id) = (envelope.activity, envelope.kind, envelope.id);

        let outcome = match (activity, payload) {
            (Activity::Remove, _) => self.remove(kind, id),
            (activity, Some(Payload::Mesh(mesh))) => self.apply_mesh(activity, id, mesh),
            (activity, Some(Payload::Material(material))) => {
                self.apply_material(activity, id, material, loader)
            }
            (activity, Some(Payload::Transform(transform))) => {
                self.apply_transform(activity, id, transform.matrix)
            }
            (_, Some(Payload::Camera(camera))) => {
                self.camera = CameraState::from(camera);
                Outcome::Applied
            }
            (_, Some(Payload::Light(_)) | None) => Outcome::Ignored,
        };

        match outcome {
            Outcome::Applied => {
                self.stats.applied += 1;
                debug!(%id, ?activity, ?kind, "applied message");
            }
            Outcome::Ignored => {
                self.stats.ignored += 1;
                debug!(%id, ?activity, ?kind, "ignored message");
            }
            Outcome::Rejected => self.stats.rejected += 1,
        }
        outcome
    }

    fn reject(&mut self) {
        self.stats.rejected += 1;
    }

    fn release(&mut self, id: Identity, buffers: MeshBuffers) {
        self.stats.released_meshes += 1;
        debug!(%id, vertices = buffers.vertex_count(), "released mesh buffers");
        drop(buffers);
    }

    // ── Meshes ──────────────────────────────────────────────────────────

    fn apply_mesh(&mut self, activity: Activity, id: Identity, payload: MeshPayload) -> Outcome {
        let material = payload.material;
        let material_index = self.materials.resolve(material);
        let buffers = MeshBuffers::from(payload);

        if let Some(entry) = self.meshes.get_mut(id) {
            let old = entry.replace(buffers, material, material_index);
            self.release(id, old);
            return Outcome::Applied;
        }
        if activity == Activity::Update {
            return Outcome::Ignored;
        }

        let placement = self.unbound_transform();
        self.meshes.insert(MeshEntry {
            id,
            buffers,
            material,
            material_index,
            placement,
        });
        Outcome::Applied
    }

    /// Most recently added transform no mesh is bound to. The producer sends
    /// a mesh's own transform last before the mesh, so ancestors added
    /// earlier are skipped.
    fn unbound_transform(&self) -> Option<Identity> {
        self.transforms
            .ids()
            .rev()
            .find(|&t| !self.meshes.iter().any(|m| m.placement == Some(t)))
    }

    // ── Transforms ──────────────────────────────────────────────────────

    fn apply_transform(&mut self, activity: Activity, id: Identity, matrix: Mat4) -> Outcome {
        if activity == Activity::Update {
            return if self.transforms.set(id, matrix) {
                Outcome::Applied
            } else {
                Outcome::Ignored
            };
        }

        if self.transforms.upsert(id, matrix) {
            if let Some(mesh) = self.meshes.iter_mut().find(|m| m.placement.is_none()) {
                mesh.placement = Some(id);
                debug!(mesh = %mesh.id, transform = %id, "bound waiting mesh to transform");
            }
        }
        Outcome::Applied
    }

    // ── Materials ───────────────────────────────────────────────────────

    fn apply_material<L: TextureLoader + ?Sized>(
        &mut self,
        activity: Activity,
        id: Identity,
        payload: MaterialPayload,
        loader: &mut L,
    ) -> Outcome {
        let MaterialPayload { color, texture: path } = payload;
        let tint = if path.is_some() { Vec3::ONE } else { color };
        let loaded = path
            .as_deref()
            .map(|path| self.load_texture(loader, id, path));

        match (activity, self.materials.get_mut(id)) {
            (Activity::Update, Some(entry)) => {
                entry.color = color;
                entry.tint = tint;
                if let Some(Some(texture)) = loaded {
                    entry.texture = Some(texture);
                    entry.texture_path = path;
                }
            }
            _ => {
                let (texture, texture_path) = match loaded {
                    Some(Some(texture)) => (Some(texture), path),
                    _ => (None, None),
                };
                self.materials.upsert(MaterialEntry {
                    id,
                    color,
                    tint,
                    texture_path,
                    texture,
                });
            }
        }
        self.resolve_material_indices();
        Outcome::Applied
    }

    fn load_texture<L: TextureLoader + ?Sized>(
        &mut self,
        loader: &mut L,
        id: Identity,
        path: &str,
    ) -> Option<Texture> {
        match loader.load(path) {
            Ok(texture) => Some(texture),
            Err(err) => {
                self.stats.texture_failures += 1;
                warn!(%id, path, error = %err, "texture failed to load");
                None
            }
        }
    }

    fn resolve_material_indices(&mut self) {
        let materials = &self.materials;
        for mesh in self.meshes.iter_mut() {
            mesh.material_index = materials.resolve(mesh.material);
        }
    }

    // ── Removal ─────────────────────────────────────────────────────────

    fn remove(&mut self, kind: EntityKind, id: Identity) -> Outcome {
        match kind {
            EntityKind::Mesh => match self.meshes.remove(id) {
                Some(entry) => {
                    self.release(id, entry.buffers);
                    Outcome::Applied
                }
                None => Outcome::Ignored,
            },
            EntityKind::Transform => {
                if !self.transforms.remove(id) {
                    return Outcome::Ignored;
                }
                for mesh in self.meshes.iter_mut().filter(|m| m.placement == Some(id)) {
                    mesh.placement = None;
                }
                Outcome::Applied
            }
            EntityKind::Material => {
                if self.materials.remove(id).is_none() {
                    return Outcome::Ignored;
                }
                self.resolve_material_indices();
                Outcome::Applied
            }
            EntityKind::Camera | EntityKind::Light => Outcome::Ignored,
        }
    }
}

/// Decodes raw messages and applies them to a [`SceneState`].
#[derive(Debug)]
pub struct Consumer<L> {
    state: SceneState,
    loader: L,
}

impl<L: TextureLoader> Consumer<L> {
    /// An empty scene using the default camera.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self::with_camera(loader, CameraState::default())
    }

    /// An empty scene starting from `camera`.
    #[must_use]
    pub fn with_camera(loader: L, camera: CameraState) -> Self {
        Self {
            state: SceneState::new(camera),
            loader,
        }
    }

    /// The current scene.
    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ConsumerStats {
        self.state.stats()
    }

    /// The texture loader.
    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Decode and apply one raw message. A message that fails to decode is
    /// logged and counted, and leaves every store untouched.
    pub fn receive(&mut self, bytes: &[u8]) -> Outcome {
        match decode(bytes) {
            Ok(message) => self.apply(message),
            Err(err) => {
                self.state.reject();
                warn!(len = bytes.len(), error = %err, "rejected malformed message");
                Outcome::Rejected
            }
        }
    }

    /// Apply one decoded message.
    pub fn apply(&mut self, message: Message) -> Outcome {
        self.state.apply(message, &mut self.loader)
    }
}
