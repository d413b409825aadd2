//! The producer reconciler.
//!
//! Turns authoring-side notifications into scene messages:
//!
//! 1. `on_node_added` only queues the node. A freshly created node may not be
//!    connected to its parent or material yet.
//! 2. `on_idle` classifies every queued node, attaches an observer to the
//!    relevant ones and emits their Add. A mesh's own transform is always the
//!    last transform Add before the mesh Add, since the consumer places a new
//!    mesh under the newest unbound transform.
//! 3. `on_attribute_changed` re-extracts a full snapshot and emits an Update,
//!    fanning out to descendants, meshes or materials as the node kind needs.
//!    A snapshot of an entity whose Add never reached the channel goes out as
//!    an Add instead.
//! 4. `on_node_removed` emits Removes, cascading to a material that is no
//!    longer used by any other mesh.
//!
//! Every entry point returns the number of messages the channel accepted.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info};

use scenelink_transport::MessageSender;
use scenelink_wire::{EntityKind, Identity, Message, Payload};

use crate::config::ProducerConfig;
use crate::context::{Observer, ProducerContext};
use crate::emitter::{Emitter, ProducerStats};
use crate::extract::{extract_camera, extract_material, extract_mesh, extract_transform};
use crate::notify::{AttributeChange, AttributeMessage};
use crate::scene::{NodeCategory, NodeHandle, SceneGraph};

/// Attribute carrying a mesh's evaluated geometry.
pub const MESH_OUTPUT_ATTRIBUTE: &str = "outMesh";

/// Attribute carrying a texture's sampled colour.
pub const TEXTURE_OUTPUT_ATTRIBUTE: &str = "outColor";

/// How a re-extracted snapshot is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Snapshot {
    Add,
    Update,
}

/// Authoring-side reconciler writing to a [`MessageSender`].
#[derive(Debug)]
pub struct Producer<T> {
    config: ProducerConfig,
    context: ProducerContext,
    emitter: Emitter<T>,
}

impl<T: MessageSender> Producer<T> {
    /// Create a producer writing to `sender`.
    #[must_use]
    pub fn new(config: ProducerConfig, sender: T) -> Self {
        Self {
            config,
            context: ProducerContext::new(),
            emitter: Emitter::new(sender),
        }
    }

    /// Returns the producer's configuration.
    #[must_use]
    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Returns the session state.
    #[must_use]
    pub fn context(&self) -> &ProducerContext {
        &self.context
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ProducerStats {
        self.emitter.stats()
    }

    /// The wrapped sender.
    #[must_use]
    pub fn sender(&self) -> &T {
        self.emitter.sender()
    }

    /// Mutable access to the wrapped sender.
    pub fn sender_mut(&mut self) -> &mut T {
        self.emitter.sender_mut()
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Begin a session: queue every existing node as if it had just been
    /// added, and send the initial camera.
    pub fn start<S: SceneGraph + ?Sized>(&mut self, scene: &S, now: Instant) -> usize {
        let nodes = scene.nodes();
        info!(nodes = nodes.len(), "producer starting");
        for node in nodes {
            self.context.defer(node);
        }
        self.context.camera_sent(now);
        self.emit_camera(scene)
    }

    /// End the session: detach every observer and forget all state.
    pub fn shutdown(&mut self) -> usize {
        info!(
            observers = self.context.observer_count(),
            emitted = self.stats().emitted,
            dropped = self.stats().dropped,
            "producer shutting down"
        );
        self.context.clear();
        0
    }

    // ── Notifications ──────────────────────────────────────────────

    /// A node was created. Classification waits for the next idle point.
    pub fn on_node_added<S: SceneGraph + ?Sized>(&mut self, scene: &S, node: NodeHandle) -> usize {
        debug!(
            node = ?node,
            name = scene.name(node).unwrap_or_default(),
            category = ?scene.category(node),
            "node added"
        );
        self.context.defer(node);
        0
    }

    /// The dependency graph is quiescent: classify every queued node.
    pub fn on_idle<S: SceneGraph + ?Sized>(&mut self, scene: &S) -> usize {
        let mut sent = 0;
        for node in self.context.drain_pending() {
            if self.context.observer(node).is_some() {
                continue;
            }
            sent += self.classify(scene, node);
        }
        sent
    }

    /// A node is being deleted. It must still be queryable.
    pub fn on_node_removed<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        node: NodeHandle,
    ) -> usize {
        debug!(
            node = ?node,
            name = scene.name(node).unwrap_or_default(),
            "node removed"
        );
        self.context.cancel(node);
        self.context.detach(node);

        let Some(id) = scene.identity(node) else {
            return 0;
        };
        match scene.category(node) {
            Some(NodeCategory::Transform) => self.emit_remove(EntityKind::Transform, id),
            Some(NodeCategory::Mesh) => {
                let mut sent = self.emit_remove(EntityKind::Mesh, id);
                sent += self.cascade_material_removal(scene, node);
                sent
            }
            Some(NodeCategory::Shader) => self.emit_remove(EntityKind::Material, id),
            _ => 0,
        }
    }

    /// An attribute on an observed node changed.
    pub fn on_attribute_changed<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        node: NodeHandle,
        change: &AttributeChange,
    ) -> usize {
        let Some(observer) = self.context.observer(node) else {
            return 0;
        };
        debug!(node = ?node, observer = ?observer, change = %change, "attribute changed");
        if change.message.is_internal_evaluation() {
            return 0;
        }

        match observer {
            Observer::Transform => {
                if change.message.contains(AttributeMessage::ATTRIBUTE_SET) {
                    self.update_transform_tree(scene, node)
                } else {
                    0
                }
            }
            Observer::Mesh => {
                let evaluated = AttributeMessage::ATTRIBUTE_EVAL | AttributeMessage::ATTRIBUTE_SET;
                let geometry_changed =
                    change.is(MESH_OUTPUT_ATTRIBUTE) && change.message.intersects(evaluated);
                if geometry_changed || change.message.is_connection_change() {
                    self.emit_mesh(scene, node, Snapshot::Update)
                } else {
                    0
                }
            }
            Observer::ShadingGroup => {
                let mut sent = self.emit_group_material(scene, node, Snapshot::Update);
                for mesh in scene.shading_group_meshes(node) {
                    if self.context.observer(mesh) == Some(Observer::Mesh) {
                        sent += self.emit_mesh(scene, mesh, Snapshot::Update);
                    }
                }
                sent
            }
            Observer::Shader => {
                let groups = scene
                    .downstream_shading_groups(node)
                    .into_iter()
                    .filter(|sg| !scene.shading_group_meshes(*sg).is_empty());
                self.update_group_materials(scene, groups)
            }
            Observer::FileTexture => {
                if change.is(TEXTURE_OUTPUT_ATTRIBUTE) {
                    let groups = scene.downstream_shading_groups(node).into_iter();
                    self.update_group_materials(scene, groups)
                } else {
                    0
                }
            }
        }
    }

    /// A viewport is about to redraw. Sends the camera at most once per
    /// configured interval.
    pub fn on_view_rendered<S: SceneGraph + ?Sized>(&mut self, scene: &S, now: Instant) -> usize {
        if !self.context.camera_due(now, self.config.camera_interval()) {
            return 0;
        }
        self.context.camera_sent(now);
        self.emit_camera(scene)
    }

    // ── Classification ─────────────────────────────────────────────

    fn classify<S: SceneGraph + ?Sized>(&mut self, scene: &S, node: NodeHandle) -> usize {
        match scene.category(node) {
            Some(NodeCategory::Transform) if scene.has_mesh_descendant(node) => {
                self.context.observe(node, Observer::Transform);
                self.emit_transform(scene, node, Snapshot::Add)
            }
            Some(NodeCategory::Mesh) if !scene.is_intermediate(node) => {
                self.context.observe(node, Observer::Mesh);
                let mut sent = self.place_under_parent(scene, node);
                for sg in scene.downstream_shading_groups(node) {
                    sent += self.emit_group_material(scene, sg, Snapshot::Add);
                }
                sent + self.emit_mesh(scene, node, Snapshot::Add)
            }
            Some(NodeCategory::ShadingGroup) if scene.surface_shader(node).is_some() => {
                self.context.observe(node, Observer::ShadingGroup);
                self.emit_group_material(scene, node, Snapshot::Add)
            }
            Some(NodeCategory::Shader) => {
                self.context.observe(node, Observer::Shader);
                0
            }
            Some(NodeCategory::FileTexture) => {
                self.context.observe(node, Observer::FileTexture);
                0
            }
            category => {
                debug!(node = ?node, category = ?category, "skipped irrelevant node");
                self.emitter.skipped();
                0
            }
        }
    }

    /// Make the mesh's parent transform the newest transform Add. A parent
    /// not classified yet is classified now; one announced before another
    /// transform is sent again as an Add.
    fn place_under_parent<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        mesh: NodeHandle,
    ) -> usize {
        let Some(parent) = scene.parent(mesh) else {
            return 0;
        };
        if scene.category(parent) != Some(NodeCategory::Transform) {
            return 0;
        }
        if self.context.observer(parent).is_none() {
            return self.classify(scene, parent);
        }
        let newest = self.context.newest_transform();
        if newest.is_some() && newest == scene.identity(parent) {
            return 0;
        }
        debug!(mesh = ?mesh, parent = ?parent, "re-adding parent transform");
        self.emit_transform(scene, parent, Snapshot::Add)
    }

    // ── Fan-out ────────────────────────────────────────────────────

    /// Update a transform, then every observed mesh-bearing transform below
    /// it.
    fn update_transform_tree<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        root: NodeHandle,
    ) -> usize {
        let mut sent = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            sent += self.emit_transform(scene, node, Snapshot::Update);
            let mut children: Vec<NodeHandle> = scene
                .children(node)
                .into_iter()
                .filter(|child| {
                    self.context.observer(*child) == Some(Observer::Transform)
                        && scene.has_mesh_descendant(*child)
                })
                .collect();
            // Depth-first, children in DAG order.
            children.reverse();
            stack.extend(children);
        }
        sent
    }

    /// Update the material of each group, once per distinct material.
    fn update_group_materials<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        groups: impl Iterator<Item = NodeHandle>,
    ) -> usize {
        let mut seen = HashSet::new();
        let mut sent = 0;
        for sg in groups {
            let Some(shader) = scene.surface_shader(sg) else {
                continue;
            };
            if seen.insert(shader) {
                sent += self.emit_group_material(scene, sg, Snapshot::Update);
            }
        }
        sent
    }

    /// On mesh removal, remove each material whose shading group is being
    /// deleted and that no other mesh still uses.
    fn cascade_material_removal<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        mesh: NodeHandle,
    ) -> usize {
        let mut sent = 0;
        for sg in scene.downstream_shading_groups(mesh) {
            if !scene.is_pending_deletion(sg) {
                continue;
            }
            let Some(shader) = scene.surface_shader(sg) else {
                continue;
            };
            let Some(material) = scene.identity(shader) else {
                continue;
            };
            if !self.context.is_announced(material, EntityKind::Material) {
                continue;
            }
            let still_used = scene
                .downstream_shading_groups(shader)
                .into_iter()
                .flat_map(|group| scene.shading_group_meshes(group))
                .any(|other| other != mesh);
            if still_used {
                debug!(material = %material, "material still in use, kept");
                continue;
            }
            sent += self.emit_remove(EntityKind::Material, material);
        }
        sent
    }

    // ── Emission ───────────────────────────────────────────────────

    fn emit_transform<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        node: NodeHandle,
        snapshot: Snapshot,
    ) -> usize {
        let Some(id) = scene.identity(node) else {
            return 0;
        };
        let Some(payload) = extract_transform(scene, node) else {
            return 0;
        };
        self.emit_snapshot(snapshot, id, payload.into())
    }

    fn emit_mesh<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        node: NodeHandle,
        snapshot: Snapshot,
    ) -> usize {
        let Some(id) = scene.identity(node) else {
            return 0;
        };
        let Some(payload) = extract_mesh(scene, node) else {
            return 0;
        };
        self.emit_snapshot(snapshot, id, payload.into())
    }

    /// Emit the material on a shading group's surface-shader input. An Add
    /// for a material the consumer already has goes out as an Update.
    fn emit_group_material<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        shading_group: NodeHandle,
        snapshot: Snapshot,
    ) -> usize {
        let Some(shader) = scene.surface_shader(shading_group) else {
            return 0;
        };
        let Some(id) = scene.identity(shader) else {
            return 0;
        };
        let snapshot = if self.context.is_announced(id, EntityKind::Material) {
            Snapshot::Update
        } else {
            snapshot
        };
        let payload = extract_material(scene, shader);
        self.emit_snapshot(snapshot, id, payload.into())
    }

    fn emit_camera<S: SceneGraph + ?Sized>(&mut self, scene: &S) -> usize {
        let Some((id, payload)) = extract_camera(scene) else {
            return 0;
        };
        usize::from(self.emitter.emit(&Message::update(id, payload)))
    }

    /// Send a snapshot. An Update for an identity the consumer was never
    /// told about goes out as an Add, so a dropped Add is recovered by the
    /// next change.
    fn emit_snapshot(&mut self, snapshot: Snapshot, id: Identity, payload: Payload) -> usize {
        let kind = payload.kind();
        let is_add = snapshot == Snapshot::Add || !self.context.is_announced(id, kind);
        let message = if is_add {
            Message::add(id, payload)
        } else {
            Message::update(id, payload)
        };
        let sent = self.emitter.emit(&message);
        if sent && is_add {
            self.context.announce(id, kind);
            info!(kind = ?kind, id = %id, "announced");
        }
        usize::from(sent)
    }

    fn emit_remove(&mut self, kind: EntityKind, id: Identity) -> usize {
        if !self.context.is_announced(id, kind) {
            return 0;
        }
        let sent = self.emitter.emit(&Message::remove(kind, id));
        if sent {
            self.context.retract(id);
            info!(kind = ?kind, id = %id, "retracted");
        }
        usize::from(sent)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::{Mat4, Vec2, Vec3};
    use scenelink_transport::TransportError;
    use scenelink_wire::{Activity, decode};

    use super::*;
    use crate::memory::MemoryScene;
    use crate::scene::{CameraView, Face, FaceCorner};

    #[derive(Default)]
    struct Recorder {
        sent: Vec<Message>,
        refuse: usize,
    }

    impl MessageSender for Recorder {
        fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
            if self.refuse > 0 {
                self.refuse -= 1;
                return Err(TransportError::Full {
                    size: message.len(),
                });
            }
            self.sent.push(decode(message).unwrap());
            Ok(())
        }

        fn max_message_size(&self) -> usize {
            usize::MAX
        }
    }

    impl Recorder {
        fn take(&mut self) -> Vec<(Activity, EntityKind)> {
            self.sent.drain(..).map(|m| (m.activity(), m.kind())).collect()
        }
    }

    fn triangle() -> Vec<Face> {
        vec![Face::new(vec![
            FaceCorner::new(Vec3::ZERO, Vec2::ZERO, Vec3::Z),
            FaceCorner::new(Vec3::X, Vec2::X, Vec3::Z),
            FaceCorner::new(Vec3::Y, Vec2::Y, Vec3::Z),
        ])]
    }

    fn producer() -> Producer<Recorder> {
        Producer::new(ProducerConfig::default(), Recorder::default())
    }

    struct Cube {
        transform: NodeHandle,
        mesh: NodeHandle,
        shader: NodeHandle,
        sg: NodeHandle,
    }

    fn cube(scene: &mut MemoryScene, parent: Option<NodeHandle>) -> Cube {
        let transform = scene.add_transform("pCube", parent, Mat4::IDENTITY);
        let mesh = scene.add_mesh("pCubeShape", transform, triangle());
        let shader = scene.add_shader("lambert", Vec3::ONE, Some(0.8));
        let sg = scene.add_shading_group("lambertSG", Some(shader));
        scene.assign(mesh, sg);
        Cube {
            transform,
            mesh,
            shader,
            sg,
        }
    }

    fn add_all(producer: &mut Producer<Recorder>, scene: &MemoryScene) {
        for node in scene.nodes() {
            producer.on_node_added(scene, node);
        }
        producer.on_idle(scene);
    }

    #[test]
    fn test_add_is_deferred_until_idle() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();

        assert_eq!(producer.on_node_added(&scene, c.transform), 0);
        assert_eq!(producer.on_node_added(&scene, c.mesh), 0);
        assert!(producer.sender().sent.is_empty());

        assert_eq!(producer.on_idle(&scene), 3);
        assert_eq!(
            producer.sender_mut().take(),
            vec![
                (Activity::Add, EntityKind::Transform),
                (Activity::Add, EntityKind::Material),
                (Activity::Add, EntityKind::Mesh),
            ]
        );
        assert_eq!(producer.on_idle(&scene), 0);
    }

    #[test]
    fn test_mesh_add_carries_material_id() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);

        let mesh = producer
            .sender()
            .sent
            .iter()
            .find_map(|m| match &m.payload {
                Some(Payload::Mesh(mesh)) => Some(mesh.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(Some(mesh.material), scene.identity(c.shader));
    }

    #[test]
    fn test_irrelevant_nodes_skipped() {
        let mut scene = MemoryScene::new();
        let empty = scene.add_transform("svgGroup", None, Mat4::IDENTITY);
        let c = cube(&mut scene, None);
        scene.set_intermediate(c.mesh, true);
        let unused_sg = scene.add_shading_group("initialParticleSE", None);
        scene.add_other("time1");
        let light = scene.add_light("pointLightShape1", empty);

        let mut producer = producer();
        add_all(&mut producer, &scene);
        let sent = producer.sender_mut().take();
        // Transform still has a mesh child, and the group has a shader.
        assert_eq!(
            sent,
            vec![
                (Activity::Add, EntityKind::Transform),
                (Activity::Add, EntityKind::Material),
            ]
        );
        assert_eq!(producer.context().observer(empty), None);
        assert_eq!(producer.context().observer(unused_sg), None);
        assert_eq!(producer.context().observer(c.mesh), None);
        assert_eq!(producer.context().observer(light), None);
        assert_eq!(producer.stats().skipped, 5);
    }

    #[test]
    fn test_mesh_add_follows_its_own_transform() {
        let mut scene = MemoryScene::new();
        let group = scene.add_transform("group1", None, Mat4::from_translation(Vec3::X));
        let first = scene.add_transform("pCube1", Some(group), Mat4::IDENTITY);
        let second = scene.add_transform("pCube2", Some(group), Mat4::IDENTITY);
        let first_shape = scene.add_mesh("pCubeShape1", first, triangle());
        let second_shape = scene.add_mesh("pCubeShape2", second, triangle());
        let mut producer = producer();
        add_all(&mut producer, &scene);

        let id = |node: NodeHandle| scene.identity(node).unwrap();
        let sent: Vec<(Activity, Identity)> = producer
            .sender()
            .sent
            .iter()
            .map(|m| (m.activity(), m.id()))
            .collect();
        assert_eq!(
            sent,
            vec![
                (Activity::Add, id(group)),
                (Activity::Add, id(first)),
                (Activity::Add, id(second)),
                (Activity::Add, id(first)),
                (Activity::Add, id(first_shape)),
                (Activity::Add, id(second)),
                (Activity::Add, id(second_shape)),
            ]
        );
        assert_eq!(producer.context().newest_transform(), Some(id(second)));
    }

    #[test]
    fn test_unclassified_parent_is_added_before_mesh() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        producer.on_node_added(&scene, c.mesh);
        producer.on_node_added(&scene, c.transform);

        assert_eq!(producer.on_idle(&scene), 3);
        assert_eq!(
            producer.sender_mut().take(),
            vec![
                (Activity::Add, EntityKind::Transform),
                (Activity::Add, EntityKind::Material),
                (Activity::Add, EntityKind::Mesh),
            ]
        );
        assert_eq!(producer.context().observer(c.transform), Some(Observer::Transform));
    }

    #[test]
    fn test_dropped_add_is_recovered_by_next_change() {
        let mut scene = MemoryScene::new();
        let transform = scene.add_transform("pCube", None, Mat4::IDENTITY);
        let mesh = scene.add_mesh("pCubeShape", transform, triangle());
        let mut producer = producer();
        producer.on_node_added(&scene, transform);
        producer.on_idle(&scene);

        producer.sender_mut().refuse = 1;
        producer.on_node_added(&scene, mesh);
        assert_eq!(producer.on_idle(&scene), 0);
        let id = scene.identity(mesh).unwrap();
        assert!(!producer.context().is_announced(id, EntityKind::Mesh));
        assert_eq!(producer.stats().dropped, 1);

        let set = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, MESH_OUTPUT_ATTRIBUTE);
        for _ in 0..3 {
            assert_eq!(producer.on_attribute_changed(&scene, mesh, &set), 1);
        }
        assert_eq!(
            producer.sender_mut().take(),
            vec![
                (Activity::Add, EntityKind::Transform),
                (Activity::Add, EntityKind::Mesh),
                (Activity::Update, EntityKind::Mesh),
                (Activity::Update, EntityKind::Mesh),
            ]
        );
        assert!(producer.context().is_announced(id, EntityKind::Mesh));
    }

    #[test]
    fn test_material_reassignment_follows_connections() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        let blinn = scene.add_shader("blinn1", Vec3::Y, None);
        let blinn_sg = scene.add_shading_group("blinn1SG", Some(blinn));
        producer.on_node_added(&scene, blinn);
        producer.on_node_added(&scene, blinn_sg);
        assert_eq!(producer.on_idle(&scene), 1);

        let mesh_material = |producer: &Producer<Recorder>| match producer.sender().sent.last() {
            Some(Message {
                payload: Some(Payload::Mesh(mesh)),
                ..
            }) => mesh.material,
            _ => panic!("expected mesh payload"),
        };

        scene.unassign_all(c.mesh);
        scene.assign(c.mesh, blinn_sg);
        let broken = AttributeChange::new(AttributeMessage::CONNECTION_BROKEN, "instObjGroups");
        assert_eq!(producer.on_attribute_changed(&scene, c.mesh, &broken), 1);
        assert_eq!(Some(mesh_material(&producer)), scene.identity(blinn));

        scene.set_surface_shader(blinn_sg, Some(c.shader));
        let made = AttributeChange::new(AttributeMessage::CONNECTION_MADE, "surfaceShader");
        assert_eq!(producer.on_attribute_changed(&scene, blinn_sg, &made), 2);
        assert_eq!(Some(mesh_material(&producer)), scene.identity(c.shader));
        let sent = producer.sender_mut().take();
        assert_eq!(
            sent[sent.len() - 2..],
            [
                (Activity::Update, EntityKind::Material),
                (Activity::Update, EntityKind::Mesh),
            ]
        );
    }

    #[test]
    fn test_transform_update_propagates_to_children() {
        let mut scene = MemoryScene::new();
        let parent = cube(&mut scene, None);
        let left = cube(&mut scene, Some(parent.transform));
        let right = cube(&mut scene, Some(parent.transform));
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        scene.set_local_matrix(parent.transform, Mat4::from_translation(Vec3::X));
        let change = AttributeChange::new(
            AttributeMessage::ATTRIBUTE_SET | AttributeMessage::INCOMING_DIRECTION,
            "translateX",
        );
        assert_eq!(producer.on_attribute_changed(&scene, parent.transform, &change), 3);

        let sent = &producer.sender().sent;
        let ids: Vec<Identity> = sent.iter().map(Message::id).collect();
        assert_eq!(
            ids,
            vec![
                scene.identity(parent.transform).unwrap(),
                scene.identity(left.transform).unwrap(),
                scene.identity(right.transform).unwrap(),
            ]
        );
        for message in sent {
            assert_eq!(message.activity(), Activity::Update);
            let Some(Payload::Transform(t)) = &message.payload else {
                panic!("expected transform payload");
            };
            assert_eq!(t.matrix.w_axis.x, 1.0);
        }
    }

    #[test]
    fn test_internal_evaluation_ignored() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        let eval = AttributeChange::new(AttributeMessage::ATTRIBUTE_EVAL, MESH_OUTPUT_ATTRIBUTE);
        assert_eq!(producer.on_attribute_changed(&scene, c.mesh, &eval), 0);

        let incoming = AttributeChange::new(
            AttributeMessage::ATTRIBUTE_EVAL | AttributeMessage::INCOMING_DIRECTION,
            MESH_OUTPUT_ATTRIBUTE,
        );
        assert_eq!(producer.on_attribute_changed(&scene, c.mesh, &incoming), 1);
        assert_eq!(
            producer.sender_mut().take(),
            vec![(Activity::Update, EntityKind::Mesh)]
        );
    }

    #[test]
    fn test_mesh_ignores_unrelated_attributes() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);

        let other = AttributeChange::new(
            AttributeMessage::ATTRIBUTE_SET | AttributeMessage::INCOMING_DIRECTION,
            "visibility",
        );
        assert_eq!(producer.on_attribute_changed(&scene, c.mesh, &other), 0);

        let connected = AttributeChange::new(AttributeMessage::CONNECTION_MADE, "instObjGroups");
        assert_eq!(producer.on_attribute_changed(&scene, c.mesh, &connected), 1);
    }

    #[test]
    fn test_unobserved_node_emits_nothing() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        let change = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "translateX");
        assert_eq!(producer.on_attribute_changed(&scene, c.transform, &change), 0);
    }

    #[test]
    fn test_shader_change_updates_material_once() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let other = scene.add_transform("pSphere", None, Mat4::IDENTITY);
        let other_mesh = scene.add_mesh("pSphereShape", other, triangle());
        scene.assign(other_mesh, c.sg);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        scene.set_shader_color(c.shader, Vec3::X);
        let change = AttributeChange::new(
            AttributeMessage::ATTRIBUTE_SET | AttributeMessage::INCOMING_DIRECTION,
            "color",
        );
        assert_eq!(producer.on_attribute_changed(&scene, c.shader, &change), 1);
        let Some(Payload::Material(material)) = &producer.sender().sent[0].payload else {
            panic!("expected material payload");
        };
        assert!((material.color - Vec3::new(0.8, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_texture_change_updates_material() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let file = scene.add_file_texture("file1", "a.png");
        scene.connect_texture(file, c.shader);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        scene.set_texture_path(file, "b.png");
        let unrelated = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "fileTextureName");
        assert_eq!(producer.on_attribute_changed(&scene, file, &unrelated), 0);

        let output = AttributeChange::new(
            AttributeMessage::ATTRIBUTE_EVAL | AttributeMessage::INCOMING_DIRECTION,
            TEXTURE_OUTPUT_ATTRIBUTE,
        );
        assert_eq!(producer.on_attribute_changed(&scene, file, &output), 1);
        let Some(Payload::Material(material)) = &producer.sender().sent[0].payload else {
            panic!("expected material payload");
        };
        assert_eq!(material.texture.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_shading_group_change_updates_material_and_meshes() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        let change = AttributeChange::new(AttributeMessage::CONNECTION_MADE, "dagSetMembers");
        assert_eq!(producer.on_attribute_changed(&scene, c.sg, &change), 2);
        assert_eq!(
            producer.sender_mut().take(),
            vec![
                (Activity::Update, EntityKind::Material),
                (Activity::Update, EntityKind::Mesh),
            ]
        );
    }

    #[test]
    fn test_removal_cascade_keeps_shared_material() {
        let mut scene = MemoryScene::new();
        let a = cube(&mut scene, None);
        let b_transform = scene.add_transform("pSphere", None, Mat4::IDENTITY);
        let b_mesh = scene.add_mesh("pSphereShape", b_transform, triangle());
        scene.assign(b_mesh, a.sg);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        scene.mark_for_deletion(a.sg);
        assert_eq!(producer.on_node_removed(&scene, a.mesh), 1);
        assert_eq!(
            producer.sender_mut().take(),
            vec![(Activity::Remove, EntityKind::Mesh)]
        );
    }

    #[test]
    fn test_removal_cascade_removes_unused_material() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        scene.mark_for_deletion(c.sg);
        assert_eq!(producer.on_node_removed(&scene, c.mesh), 2);
        let sent = &producer.sender().sent;
        assert_eq!(sent[0].kind(), EntityKind::Mesh);
        assert_eq!(sent[1].kind(), EntityKind::Material);
        assert_eq!(Some(sent[1].id()), scene.identity(c.shader));
        assert!(sent.iter().all(|m| m.payload.is_none()));
    }

    #[test]
    fn test_removal_without_group_deletion_keeps_material() {
        let mut scene = MemoryScene::new();
        let c = cube(&mut scene, None);
        let mut producer = producer();
        add_all(&mut producer, &scene);
        producer.sender_mut().take();

        assert_eq!(producer.on_node_removed(&scene, c.mesh), 1);
        assert_eq!(producer.on_node_removed(&scene, c.transform), 1);
        // Already retracted.
        assert_eq!(producer.on_node_removed(&scene, c.mesh), 0);
    }

    #[test]
    fn test_camera_throttled() {
        let mut scene = MemoryScene::new();
        scene.set_camera(CameraView {
            identity: Identity::new_v4(),
            eye: Vec3::splat(10.0),
            center_of_interest: Vec3::ZERO,
            up: Vec3::Y,
            vertical_fov: 0.9,
            orthographic: false,
        });
        let mut producer = producer();
        let t0 = Instant::now();
        assert_eq!(producer.start(&scene, t0), 1);
        assert_eq!(producer.on_view_rendered(&scene, t0 + Duration::from_millis(5)), 0);
        assert_eq!(producer.on_view_rendered(&scene, t0 + Duration::from_millis(16)), 1);
        assert_eq!(producer.on_view_rendered(&scene, t0 + Duration::from_millis(20)), 0);
        assert!(
            producer
                .sender()
                .sent
                .iter()
                .all(|m| m.activity() == Activity::Update && m.kind() == EntityKind::Camera)
        );
    }

    #[test]
    fn test_start_queues_existing_nodes_and_shutdown_detaches() {
        let mut scene = MemoryScene::new();
        cube(&mut scene, None);
        let mut producer = producer();
        assert_eq!(producer.start(&scene, Instant::now()), 0);
        assert_eq!(producer.context().pending_len(), scene.len());
        // Transform, material, mesh, then the shading group re-sends its
        // already-announced material as an Update.
        assert_eq!(producer.on_idle(&scene), 4);
        assert_eq!(producer.context().observer_count(), 4);

        producer.shutdown();
        assert_eq!(producer.context().observer_count(), 0);
    }
}
