use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use scenelink_consumer::{
    CameraState, DrawItem, ImageTextureLoader, RenderSink, Viewer, ViewerConfig,
};
use scenelink_producer::{
    AttributeChange, AttributeMessage, CameraView, Face, FaceCorner, MemoryScene, NodeHandle,
    Producer, ProducerConfig, SceneGraph,
};
use scenelink_transport::{
    ChannelConfig, MessageSender, RingReceiver, TransportError, shared_channel,
};
use scenelink_wire::Identity;

fn quad(y: f32) -> Face {
    Face::new(vec![
        FaceCorner::new(Vec3::new(0.0, y, 0.0), Vec2::new(0.0, 0.0), Vec3::Y),
        FaceCorner::new(Vec3::new(1.0, y, 0.0), Vec2::new(1.0, 0.0), Vec3::Y),
        FaceCorner::new(Vec3::new(1.0, y, 1.0), Vec2::new(1.0, 1.0), Vec3::Y),
        FaceCorner::new(Vec3::new(0.0, y, 1.0), Vec2::new(0.0, 1.0), Vec3::Y),
    ])
}

fn channel() -> ChannelConfig {
    ChannelConfig::default()
        .with_capacity_bytes(64 * 1024)
        .with_max_message_size(16 * 1024)
}

/// Drains everything queued on every frame.
fn viewer(rx: RingReceiver) -> Viewer<RingReceiver, ImageTextureLoader> {
    let config = ViewerConfig::default()
        .with_target_fps(0.0)
        .with_messages_per_frame(0);
    Viewer::new(config, rx, ImageTextureLoader::new())
}

/// Refuses the first `refuse` messages as if the ring were full.
struct Congested<T> {
    inner: T,
    refuse: usize,
}

impl<T: MessageSender> MessageSender for Congested<T> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if self.refuse > 0 {
            self.refuse -= 1;
            return Err(TransportError::Full {
                size: message.len(),
            });
        }
        self.inner.send(message)
    }

    fn max_message_size(&self) -> usize {
        self.inner.max_message_size()
    }
}

#[derive(Default)]
struct Snapshot {
    camera: Option<CameraState>,
    items: Vec<(Identity, Mat4, Vec3, usize)>,
}

impl RenderSink for Snapshot {
    fn begin_frame(&mut self, camera: &CameraState) {
        self.camera = Some(*camera);
        self.items.clear();
    }

    fn draw(&mut self, item: DrawItem<'_>) {
        self.items.push((
            item.id,
            item.transform,
            item.material.tint,
            item.mesh.triangle_count(),
        ));
    }

    fn end_frame(&mut self) {}
}

impl Snapshot {
    fn transform_of(&self, mesh: Identity) -> Option<Mat4> {
        self.items
            .iter()
            .find(|(id, ..)| *id == mesh)
            .map(|(_, transform, ..)| *transform)
    }
}

#[test]
fn test_authoring_changes_reach_the_render_pass() {
    let mut scene = MemoryScene::new();
    let placed = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let root = scene.add_transform("pPlane1", None, placed);
    let mesh = scene.add_mesh("pPlaneShape1", root, vec![quad(0.0)]);
    let shader = scene.add_shader("lambert2", Vec3::new(1.0, 0.5, 0.0), None);
    let sg = scene.add_shading_group("lambert2SG", Some(shader));
    scene.assign(mesh, sg);
    scene.set_camera(CameraView {
        identity: Identity::new_v4(),
        eye: Vec3::new(0.0, 4.0, 12.0),
        center_of_interest: Vec3::ZERO,
        up: Vec3::Y,
        vertical_fov: 40f32.to_radians(),
        orthographic: false,
    });

    let (tx, rx) = shared_channel(&channel()).unwrap();
    let mut producer = Producer::new(ProducerConfig::default().with_channel(channel()), tx);
    let mut viewer = viewer(rx);
    let mut frame = Snapshot::default();

    producer.start(&scene, Instant::now());
    producer.on_idle(&scene);
    viewer.frame(&mut frame);

    let mesh_id = scene.identity(mesh).unwrap();
    assert_eq!(frame.items.len(), 1);
    let (id, transform, tint, triangles) = frame.items[0];
    assert_eq!(id, mesh_id);
    assert_eq!(transform, Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));
    assert_eq!(tint, Vec3::new(1.0, 0.5, 0.0));
    assert_eq!(triangles, 2);
    let camera = frame.camera.unwrap();
    assert_eq!(camera.position, Vec3::new(0.0, 4.0, 12.0));
    assert!((camera.fov_y_degrees - 40.0).abs() < 1e-4);

    // Move the transform and recolour the shader.
    let moved = Mat4::from_translation(Vec3::new(-1.0, 3.0, 0.0));
    scene.set_local_matrix(root, moved);
    producer.on_attribute_changed(
        &scene,
        root,
        &AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "translateX"),
    );
    scene.set_shader_color(shader, Vec3::new(0.0, 0.0, 1.0));
    producer.on_attribute_changed(
        &scene,
        shader,
        &AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "color"),
    );
    viewer.frame(&mut frame);

    let (_, transform, tint, _) = frame.items[0];
    assert_eq!(transform, moved);
    assert_eq!(tint, Vec3::new(0.0, 0.0, 1.0));

    // Delete the object.
    producer.on_node_removed(&scene, mesh);
    producer.on_node_removed(&scene, root);
    scene.remove_node(root);
    viewer.frame(&mut frame);

    assert!(frame.items.is_empty());
    assert!(viewer.consumer().state().transforms().is_empty());
    assert_eq!(viewer.stats().rejected, 0);
    assert_eq!(producer.stats().dropped, 0);
}

#[test]
fn test_grouped_meshes_draw_at_their_own_transform() {
    let mut scene = MemoryScene::new();
    let group = scene.add_transform("group1", None, Mat4::from_translation(Vec3::X));
    let first = scene.add_transform("pCube1", Some(group), Mat4::from_translation(Vec3::Y));
    let second = scene.add_transform("pCube2", Some(group), Mat4::from_translation(Vec3::Z));
    let first_shape = scene.add_mesh("pCubeShape1", first, vec![quad(0.0)]);
    let second_shape = scene.add_mesh("pCubeShape2", second, vec![quad(1.0)]);

    let (tx, rx) = shared_channel(&channel()).unwrap();
    let mut producer = Producer::new(ProducerConfig::default(), tx);
    let mut viewer = viewer(rx);
    let mut frame = Snapshot::default();

    producer.start(&scene, Instant::now());
    producer.on_idle(&scene);
    viewer.frame(&mut frame);

    let [first_id, second_id] = [first_shape, second_shape].map(|shape: NodeHandle| {
        scene.identity(shape).unwrap()
    });
    assert_eq!(frame.items.len(), 2);
    assert_eq!(frame.transform_of(first_id), scene.world_matrix(first));
    assert_eq!(frame.transform_of(second_id), scene.world_matrix(second));
    assert_eq!(
        frame.transform_of(first_id).unwrap().w_axis.truncate(),
        Vec3::new(1.0, 1.0, 0.0)
    );

    // Moving the group moves both children.
    scene.set_local_matrix(group, Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
    let set = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "translateX");
    assert_eq!(producer.on_attribute_changed(&scene, group, &set), 3);
    viewer.frame(&mut frame);

    assert_eq!(frame.transform_of(first_id), scene.world_matrix(first));
    assert_eq!(
        frame.transform_of(second_id).unwrap().w_axis.truncate(),
        Vec3::new(5.0, 0.0, 1.0)
    );
}

#[test]
fn test_mesh_refused_by_full_channel_appears_after_next_edit() {
    let mut scene = MemoryScene::new();
    let root = scene.add_transform("pPlane1", None, Mat4::IDENTITY);
    let mesh = scene.add_mesh("pPlaneShape1", root, vec![quad(0.0)]);

    let (tx, rx) = shared_channel(&channel()).unwrap();
    let sender = Congested { inner: tx, refuse: 0 };
    let mut producer = Producer::new(ProducerConfig::default(), sender);
    let mut viewer = viewer(rx);
    let mut frame = Snapshot::default();

    producer.on_node_added(&scene, root);
    producer.on_idle(&scene);
    producer.sender_mut().refuse = 1;
    producer.on_node_added(&scene, mesh);
    producer.on_idle(&scene);
    viewer.frame(&mut frame);
    assert!(frame.items.is_empty());

    let set = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "outMesh");
    for y in 1..=3 {
        scene.set_faces(mesh, vec![quad(y as f32)]);
        producer.on_attribute_changed(&scene, mesh, &set);
    }
    viewer.frame(&mut frame);

    assert_eq!(producer.stats().dropped, 1);
    assert_eq!(producer.stats().emitted, 4);
    assert_eq!(viewer.stats().ignored, 0);
    assert_eq!(viewer.consumer().state().meshes().len(), 1);
    assert_eq!(frame.items.len(), 1);
    assert_eq!(frame.transform_of(scene.identity(mesh).unwrap()), Some(Mat4::IDENTITY));
    let drawn = viewer.consumer().state().meshes().iter().next().unwrap();
    assert_eq!(drawn.buffers.positions()[1], 3.0);
}
