//! The per-frame render pass.

use glam::{Mat4, Vec3};
use tracing::trace;

use scenelink_wire::Identity;

use crate::camera::CameraState;
use crate::reconciler::SceneState;
use crate::store::{MaterialEntry, MeshBuffers};
use crate::texture::Texture;

/// The material a mesh is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialView<'a> {
    /// Material identity, or `None` for the default material.
    pub id: Option<Identity>,
    /// Colour to multiply with.
    pub tint: Vec3,
    /// Texture, if one is loaded.
    pub texture: Option<&'a Texture>,
}

impl MaterialView<'static> {
    /// Plain white, untextured.
    pub const DEFAULT: Self = MaterialView {
        id: None,
        tint: Vec3::ONE,
        texture: None,
    };
}

impl<'a> From<&'a MaterialEntry> for MaterialView<'a> {
    fn from(entry: &'a MaterialEntry) -> Self {
        Self {
            id: Some(entry.id),
            tint: entry.tint,
            texture: entry.texture.as_ref(),
        }
    }
}

/// One mesh, ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    /// Mesh identity.
    pub id: Identity,
    /// Geometry in object space.
    pub mesh: &'a MeshBuffers,
    /// Object-to-world matrix.
    pub transform: Mat4,
    /// Surface appearance.
    pub material: MaterialView<'a>,
}

/// Receives the scene each frame. Read-only: nothing flows back.
pub trait RenderSink {
    /// Start a frame seen through `camera`.
    fn begin_frame(&mut self, camera: &CameraState);

    /// Draw one mesh.
    fn draw(&mut self, item: DrawItem<'_>);

    /// Finish the frame.
    fn end_frame(&mut self);
}

impl SceneState {
    /// Hand every live mesh to `sink`, returning how many were drawn.
    ///
    /// A mesh whose transform is missing is drawn at identity. A material
    /// index out of range draws with [`MaterialView::DEFAULT`].
    pub fn render<S: RenderSink + ?Sized>(&self, sink: &mut S) -> usize {
        sink.begin_frame(&self.camera);
        let mut drawn = 0;
        for entry in self.meshes.iter() {
            let transform = entry
                .placement
                .and_then(|id| self.transforms.get(id))
                .unwrap_or(Mat4::IDENTITY);
            let material = self
                .materials
                .at(entry.material_index)
                .map_or(MaterialView::DEFAULT, MaterialView::from);
            sink.draw(DrawItem {
                id: entry.id,
                mesh: &entry.buffers,
                transform,
                material,
            });
            drawn += 1;
        }
        sink.end_frame();
        trace!(drawn, "rendered frame");
        drawn
    }
}
