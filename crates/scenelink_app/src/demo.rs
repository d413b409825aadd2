//! The scripted author and the logging renderer.

use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec2, Vec3};
use tracing::{debug, info};

use scenelink_consumer::{CameraState, DrawItem, RenderSink};
use scenelink_producer::{
    AttributeChange, AttributeMessage, CameraView, Face, FaceCorner, MemoryScene, NodeHandle,
    Producer, ProducerStats, SceneGraph,
};
use scenelink_transport::MessageSender;
use scenelink_wire::Identity;

/// Handles to the nodes the script edits.
#[derive(Debug, Clone, Copy)]
pub struct DemoNodes {
    /// Parent transform of both objects.
    pub root: NodeHandle,
    /// Transform of the child cube.
    pub child: NodeHandle,
    /// Shader of the root cube.
    pub shader: NodeHandle,
}

/// Six quads of a unit cube centred on the origin.
#[must_use]
pub fn cube() -> Vec<Face> {
    let uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
        .into_iter()
        .map(|normal| {
            let (tangent, bitangent) = normal.any_orthonormal_pair();
            let corners = [(-1.0_f32, -1.0_f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                .into_iter()
                .zip(uv)
                .map(|((s, t), uv)| {
                    let position = (normal + tangent * s + bitangent * t) * 0.5;
                    FaceCorner::new(position, uv, normal)
                })
                .collect();
            Face::new(corners)
        })
        .collect()
}

/// Build the demo scene: a textured-or-red cube with a blue child cube.
pub fn build_scene(scene: &mut MemoryScene, texture: Option<&str>) -> DemoNodes {
    let root = scene.add_transform("pCube1", None, Mat4::IDENTITY);
    let root_shape = scene.add_mesh("pCubeShape1", root, cube());
    let offset = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let child = scene.add_transform("pCube2", Some(root), offset);
    let child_shape = scene.add_mesh("pCubeShape2", child, cube());

    let shader = scene.add_shader("redLambert", Vec3::new(1.0, 0.1, 0.1), Some(0.8));
    let red_sg = scene.add_shading_group("redLambertSG", Some(shader));
    scene.assign(root_shape, red_sg);
    if let Some(path) = texture {
        let file = scene.add_file_texture("file1", path);
        scene.connect_texture(file, shader);
    }

    let blue = scene.add_shader("blueLambert", Vec3::new(0.1, 0.2, 1.0), None);
    let blue_sg = scene.add_shading_group("blueLambertSG", Some(blue));
    scene.assign(child_shape, blue_sg);

    scene.set_camera(CameraView {
        identity: Identity::new_v4(),
        eye: Vec3::new(6.0, 4.0, 8.0),
        center_of_interest: Vec3::ZERO,
        up: Vec3::Y,
        vertical_fov: 45f32.to_radians(),
        orthographic: false,
    });

    DemoNodes {
        root,
        child,
        shader,
    }
}

/// Drive the producer through an initial sync and `steps` edits, as an
/// author would.
pub fn author<T: MessageSender>(
    scene: &mut MemoryScene,
    nodes: DemoNodes,
    producer: &mut Producer<T>,
    steps: u32,
) -> ProducerStats {
    producer.start(scene, Instant::now());
    producer.on_idle(scene);

    let set = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "rotateY");
    for step in 0..steps {
        let angle = step as f32 * 0.1;
        scene.set_local_matrix(nodes.root, Mat4::from_quat(Quat::from_rotation_y(angle)));
        producer.on_attribute_changed(scene, nodes.root, &set);

        if step % 10 == 9 {
            let shade = (step / 10) as f32 * 0.3 % 1.0;
            scene.set_shader_color(nodes.shader, Vec3::new(1.0, shade, 0.1));
            let color = AttributeChange::new(AttributeMessage::ATTRIBUTE_SET, "color");
            producer.on_attribute_changed(scene, nodes.shader, &color);
        }

        producer.on_view_rendered(scene, Instant::now());
        std::thread::sleep(Duration::from_millis(16));
    }

    // Delete the child cube.
    if let Some(&shape) = scene.children(nodes.child).first() {
        producer.on_node_removed(scene, shape);
    }
    producer.on_node_removed(scene, nodes.child);
    scene.remove_node(nodes.child);

    producer.shutdown();
    producer.stats()
}

/// A [`RenderSink`] that logs what it would draw.
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
    draws: u64,
    textured: u64,
}

impl LogSink {
    /// Draw calls seen.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RenderSink for LogSink {
    fn begin_frame(&mut self, camera: &CameraState) {
        debug!(
            frame = self.frames,
            position = ?camera.position,
            target = ?camera.target,
            fov_y = camera.fov_y_degrees,
            "begin frame"
        );
    }

    fn draw(&mut self, item: DrawItem<'_>) {
        self.draws += 1;
        if item.material.texture.is_some() {
            self.textured += 1;
        }
        debug!(
            id = %item.id,
            triangles = item.mesh.triangle_count(),
            translation = ?item.transform.w_axis.truncate(),
            tint = ?item.material.tint,
            "draw"
        );
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        if self.frames % 60 == 0 {
            info!(
                frames = self.frames,
                draws = self.draws,
                textured = self.textured,
                "render progress"
            );
        }
    }
}
