//! Message encoding and decoding.
//!
//! A message is the envelope, then the kind's fixed section, then its
//! variable sections. Every variable section is preceded by a count in the
//! fixed section, so [`decode`] computes the exact expected length before
//! copying any array and rejects a buffer of any other length.

use bytemuck::{cast_slice, pod_collect_to_vec, pod_read_unaligned};
use glam::{Mat4, Vec3};

use crate::envelope::{Activity, EntityKind, Envelope};
use crate::error::WireError;
use crate::identity::{IDENTITY_FIELD_LEN, Identity};
use crate::layout::{
    CAMERA_SIZE, ENVELOPE_SIZE, FLOAT_SIZE, LIGHT_SIZE, MATERIAL_FIXED_SIZE, MATERIAL_RESERVED,
    MESH_HEADER_SIZE, NORMAL_COMPONENTS, POSITION_COMPONENTS, TRANSFORM_SIZE, UV_COMPONENTS,
    mesh_message_len,
};
use crate::payload::{
    CameraPayload, LightPayload, MaterialPayload, MeshPayload, Payload, TransformPayload,
};

/// A complete scene message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Activity, kind and identity.
    pub envelope: Envelope,
    /// The body; `None` exactly when the activity is Remove.
    pub payload: Option<Payload>,
}

impl Message {
    /// An Add carrying a full snapshot. The kind is taken from the payload.
    #[must_use]
    pub fn add(id: Identity, payload: impl Into<Payload>) -> Self {
        Self::with_payload(Activity::Add, id, payload.into())
    }

    /// An Update carrying a full snapshot. The kind is taken from the payload.
    #[must_use]
    pub fn update(id: Identity, payload: impl Into<Payload>) -> Self {
        Self::with_payload(Activity::Update, id, payload.into())
    }

    /// A Remove, which carries only the envelope.
    #[must_use]
    pub fn remove(kind: EntityKind, id: Identity) -> Self {
        Self {
            envelope: Envelope::new(Activity::Remove, kind, id),
            payload: None,
        }
    }

    fn with_payload(activity: Activity, id: Identity, payload: Payload) -> Self {
        Self {
            envelope: Envelope::new(activity, payload.kind(), id),
            payload: Some(payload),
        }
    }

    /// Shorthand for `self.envelope.id`.
    #[must_use]
    pub fn id(&self) -> Identity {
        self.envelope.id
    }

    /// Shorthand for `self.envelope.kind`.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.envelope.kind
    }

    /// Shorthand for `self.envelope.activity`.
    #[must_use]
    pub fn activity(&self) -> Activity {
        self.envelope.activity
    }
}

/// Number of bytes [`encode`] produces for this message.
#[must_use]
pub fn encoded_len(message: &Message) -> usize {
    let body = match &message.payload {
        None => 0,
        Some(Payload::Mesh(mesh)) => mesh_message_len(mesh.vertex_count()) - ENVELOPE_SIZE,
        Some(Payload::Material(material)) => {
            let path = material.texture.as_deref().unwrap_or("");
            MATERIAL_FIXED_SIZE + if path.is_empty() { 0 } else { path.len() + 1 }
        }
        Some(Payload::Transform(_)) => TRANSFORM_SIZE,
        Some(Payload::Camera(_)) => CAMERA_SIZE,
        Some(Payload::Light(_)) => LIGHT_SIZE,
    };
    ENVELOPE_SIZE + body
}

/// Encode a message into its wire image.
///
/// # Errors
///
/// Returns [`WireError::KindMismatch`], [`WireError::MissingPayload`] or
/// [`WireError::UnexpectedPayload`] if the envelope and payload disagree,
/// [`WireError::InconsistentMesh`] if mesh arrays do not match their counts,
/// [`WireError::InvalidPath`] if a texture path contains a NUL, and
/// [`WireError::Oversized`] if a count does not fit its 32-bit field.
pub fn encode(message: &Message) -> Result<Vec<u8>, WireError> {
    let envelope = &message.envelope;
    match (&message.payload, envelope.activity) {
        (Some(_), Activity::Remove) => {
            return Err(WireError::UnexpectedPayload(envelope.kind));
        }
        (None, Activity::Add | Activity::Update) => {
            return Err(WireError::MissingPayload(envelope.kind));
        }
        (Some(payload), _) if payload.kind() != envelope.kind => {
            return Err(WireError::KindMismatch {
                envelope: envelope.kind,
                payload: payload.kind(),
            });
        }
        _ => {}
    }

    let mut out = Vec::with_capacity(encoded_len(message));
    push_i32(&mut out, envelope.activity.to_raw());
    push_i32(&mut out, envelope.kind.to_raw());
    out.extend_from_slice(&envelope.id.to_field());
    pad_to(&mut out, ENVELOPE_SIZE);

    match &message.payload {
        None => {}
        Some(Payload::Mesh(mesh)) => encode_mesh(mesh, &mut out)?,
        Some(Payload::Material(material)) => encode_material(material, &mut out)?,
        Some(Payload::Transform(transform)) => {
            // Row-major element order is the renderer's m0, m4, m8, m12, ...
            out.extend_from_slice(cast_slice(&transform.matrix.transpose().to_cols_array()));
        }
        Some(Payload::Camera(camera)) => {
            let start = out.len();
            push_vec3(&mut out, camera.position);
            push_vec3(&mut out, camera.target);
            push_vec3(&mut out, camera.up);
            out.extend_from_slice(&camera.fov_y_degrees.to_ne_bytes());
            out.push(u8::from(camera.orthographic));
            pad_to(&mut out, start + CAMERA_SIZE);
        }
        Some(Payload::Light(light)) => {
            push_vec3(&mut out, light.position);
            out.extend_from_slice(&light.intensity.to_ne_bytes());
            for channel in light.color {
                push_i32(&mut out, channel);
            }
        }
    }

    debug_assert_eq!(out.len(), encoded_len(message));
    Ok(out)
}

fn encode_mesh(mesh: &MeshPayload, out: &mut Vec<u8>) -> Result<(), WireError> {
    mesh.validate()?;
    let vertices = i32::try_from(mesh.vertex_count()).map_err(|_| WireError::Oversized("mesh"))?;
    let triangles =
        i32::try_from(mesh.triangle_count).map_err(|_| WireError::Oversized("mesh"))?;

    let start = out.len();
    push_i32(out, vertices);
    push_i32(out, triangles);
    out.extend_from_slice(&mesh.material.to_field());
    pad_to(out, start + MESH_HEADER_SIZE);

    out.extend_from_slice(cast_slice(&mesh.positions));
    out.extend_from_slice(cast_slice(&mesh.uvs));
    out.extend_from_slice(cast_slice(&mesh.normals));
    Ok(())
}

fn encode_material(material: &MaterialPayload, out: &mut Vec<u8>) -> Result<(), WireError> {
    let path = material.texture.as_deref().unwrap_or("");
    if path.contains('\0') {
        return Err(WireError::InvalidPath);
    }
    let path_size = if path.is_empty() { 0 } else { path.len() + 1 };
    let path_size = i32::try_from(path_size).map_err(|_| WireError::Oversized("texture path"))?;

    push_vec3(out, material.color);
    push_i32(out, path_size);
    out.extend_from_slice(&[0u8; MATERIAL_RESERVED]);
    if path_size > 0 {
        out.extend_from_slice(path.as_bytes());
        out.push(0);
    }
    Ok(())
}

/// Decode a wire image into a message.
///
/// Nothing is allocated for an array until the total length has been checked
/// against the counts in the fixed section.
///
/// # Errors
///
/// Returns a [`WireError`] describing the first violation found. The message
/// is rejected as a whole.
pub fn decode(bytes: &[u8]) -> Result<Message, WireError> {
    let mut r = Reader::new(bytes);

    let activity = Activity::from_raw(r.read_i32()?)?;
    let kind = EntityKind::from_raw(r.read_i32()?)?;
    let id = Identity::from_field(r.read_bytes(IDENTITY_FIELD_LEN)?)?;
    r.skip_to(ENVELOPE_SIZE)?;
    let envelope = Envelope::new(activity, kind, id);

    let payload = if activity == Activity::Remove {
        None
    } else {
        Some(match kind {
            EntityKind::Mesh => Payload::Mesh(decode_mesh(&mut r)?),
            EntityKind::Material => Payload::Material(decode_material(&mut r)?),
            EntityKind::Transform => {
                let cols: [f32; 16] = pod_read_unaligned(r.read_bytes(TRANSFORM_SIZE)?);
                Payload::Transform(TransformPayload {
                    matrix: Mat4::from_cols_array(&cols).transpose(),
                })
            }
            EntityKind::Camera => Payload::Camera(decode_camera(&mut r)?),
            EntityKind::Light => {
                let position = r.read_vec3()?;
                let intensity = r.read_f32()?;
                let color = [r.read_i32()?, r.read_i32()?, r.read_i32()?];
                Payload::Light(LightPayload {
                    position,
                    intensity,
                    color,
                })
            }
        })
    };

    r.finish()?;
    Ok(Message { envelope, payload })
}

fn decode_mesh(r: &mut Reader<'_>) -> Result<MeshPayload, WireError> {
    let header_start = r.position();
    let vertex_count = r.read_count("vertexCount")?;
    let triangle_count = r.read_count("triangleCount")?;
    let material = Identity::from_field(r.read_bytes(IDENTITY_FIELD_LEN)?)?;
    r.skip_to(header_start + MESH_HEADER_SIZE)?;

    if triangle_count.checked_mul(3) != Some(vertex_count) {
        return Err(WireError::InconsistentMesh {
            vertices: vertex_count,
            triangles: triangle_count,
            positions: POSITION_COMPONENTS * vertex_count,
            uvs: UV_COMPONENTS * vertex_count,
            normals: NORMAL_COMPONENTS * vertex_count,
        });
    }

    // The declared arrays must account for every remaining byte.
    let expected = mesh_message_len(vertex_count) - r.position();
    if r.remaining() != expected {
        return Err(if r.remaining() < expected {
            WireError::Truncated {
                offset: r.position(),
                needed: expected,
                available: r.remaining(),
            }
        } else {
            WireError::TrailingBytes(r.remaining() - expected)
        });
    }

    let positions = r.read_floats(POSITION_COMPONENTS * vertex_count)?;
    let uvs = r.read_floats(UV_COMPONENTS * vertex_count)?;
    let normals = r.read_floats(NORMAL_COMPONENTS * vertex_count)?;

    Ok(MeshPayload {
        triangle_count: triangle_count as u32,
        material,
        positions,
        uvs,
        normals,
    })
}

fn decode_material(r: &mut Reader<'_>) -> Result<MaterialPayload, WireError> {
    let color = r.read_vec3()?;
    let path_size = r.read_count("pathSize")?;
    r.read_bytes(MATERIAL_RESERVED)?;

    let texture = if path_size == 0 {
        None
    } else {
        let raw = r.read_bytes(path_size)?;
        let (nul, text) = raw.split_last().ok_or(WireError::InvalidPath)?;
        if *nul != 0 || text.contains(&0) {
            return Err(WireError::InvalidPath);
        }
        let text = std::str::from_utf8(text).map_err(|_| WireError::InvalidPath)?;
        (!text.is_empty()).then(|| text.to_owned())
    };

    Ok(MaterialPayload { color, texture })
}

fn decode_camera(r: &mut Reader<'_>) -> Result<CameraPayload, WireError> {
    let start = r.position();
    let position = r.read_vec3()?;
    let target = r.read_vec3()?;
    let up = r.read_vec3()?;
    let fov_y_degrees = r.read_f32()?;
    let orthographic = match r.read_u8()? {
        0 => false,
        1 => true,
        other => return Err(WireError::InvalidBool(other)),
    };
    r.skip_to(start + CAMERA_SIZE)?;
    Ok(CameraPayload {
        position,
        target,
        up,
        fov_y_degrees,
        orthographic,
    })
}

fn push_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_ne_bytes());
}

fn push_vec3(out: &mut Vec<u8>, v: Vec3) {
    out.extend_from_slice(cast_slice(&v.to_array()));
}

fn pad_to(out: &mut Vec<u8>, len: usize) {
    out.resize(len, 0);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < len {
            return Err(WireError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..start + len])
    }

    /// Skip padding up to an absolute offset.
    fn skip_to(&mut self, offset: usize) -> Result<(), WireError> {
        let len = offset.saturating_sub(self.pos);
        self.read_bytes(len).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(pod_read_unaligned(self.read_bytes(4)?))
    }

    fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(pod_read_unaligned(self.read_bytes(FLOAT_SIZE)?))
    }

    fn read_vec3(&mut self) -> Result<Vec3, WireError> {
        let xyz: [f32; 3] = pod_read_unaligned(self.read_bytes(3 * FLOAT_SIZE)?);
        Ok(Vec3::from_array(xyz))
    }

    fn read_count(&mut self, field: &'static str) -> Result<usize, WireError> {
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| WireError::NegativeCount { field, value })
    }

    fn read_floats(&mut self, count: usize) -> Result<Vec<f32>, WireError> {
        let len = count
            .checked_mul(FLOAT_SIZE)
            .ok_or(WireError::Oversized("float array"))?;
        Ok(pod_collect_to_vec(self.read_bytes(len)?))
    }

    fn finish(&self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }
}
