//! Byte layout of every fixed section.
//!
//! Both processes run on the same host and exchange the in-memory image of
//! the authoring plugin's C structs, so sizes include the compiler's padding
//! and scalars use native byte order.
//!
//! ```text
//! Envelope        0  i32 activity
//!                 4  i32 kind
//!                 8  u8[37] id
//!                45  u8[3] padding                        = 48
//! MeshHeader      0  i32 vertexCount
//!                 4  i32 triangleCount
//!                 8  u8[37] connected material id
//!                45  u8[3] padding                        = 48
//!                    f32[3 * vertexCount] positions
//!                    f32[2 * vertexCount] uvs
//!                    f32[3 * vertexCount] normals
//! Material        0  f32[3] colour
//!                12  i32 pathSize (including NUL, 0 = none)
//!                16  u8[8] reserved (pointer slot)        = 24
//!                    u8[pathSize] path
//! Transform       0  f32[16] m0 m4 m8 m12 m1 m5 ... m15   = 64
//! Camera          0  f32[3] position
//!                12  f32[3] target
//!                24  f32[3] up
//!                36  f32 fovy (degrees)
//!                40  u8 orthographic
//!                41  u8[3] padding                        = 44
//! Light           0  f32[3] position
//!                12  f32 intensity
//!                16  i32[3] colour                        = 28
//! ```

use crate::identity::IDENTITY_FIELD_LEN;

/// Size of one `f32` on the wire.
pub const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Offset of the identity inside the envelope.
pub const ENVELOPE_ID_OFFSET: usize = 8;

/// Size of the envelope.
pub const ENVELOPE_SIZE: usize = 48;

/// Offset of the material identity inside the mesh header.
pub const MESH_MATERIAL_OFFSET: usize = 8;

/// Size of the mesh header preceding the vertex arrays.
pub const MESH_HEADER_SIZE: usize = 48;

/// Floats per vertex in the position array.
pub const POSITION_COMPONENTS: usize = 3;

/// Floats per vertex in the UV array.
pub const UV_COMPONENTS: usize = 2;

/// Floats per vertex in the normal array.
pub const NORMAL_COMPONENTS: usize = 3;

/// Bytes used by one vertex across all three arrays.
pub const VERTEX_STRIDE: usize =
    (POSITION_COMPONENTS + UV_COMPONENTS + NORMAL_COMPONENTS) * FLOAT_SIZE;

/// Size of the material section preceding the texture path.
pub const MATERIAL_FIXED_SIZE: usize = 24;

/// Reserved bytes at the end of the material section.
pub const MATERIAL_RESERVED: usize = 8;

/// Size of the transform section.
pub const TRANSFORM_SIZE: usize = 16 * FLOAT_SIZE;

/// Size of the camera section.
pub const CAMERA_SIZE: usize = 44;

/// Size of the light section.
pub const LIGHT_SIZE: usize = 28;

/// Round `n` up to a multiple of `align`.
#[must_use]
pub const fn padded(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

// The padded sizes above must agree with the raw field sums.
const _: () = assert!(ENVELOPE_SIZE == padded(ENVELOPE_ID_OFFSET + IDENTITY_FIELD_LEN, 4));
const _: () = assert!(MESH_HEADER_SIZE == padded(MESH_MATERIAL_OFFSET + IDENTITY_FIELD_LEN, 4));
const _: () = assert!(MATERIAL_FIXED_SIZE == 3 * FLOAT_SIZE + 4 + MATERIAL_RESERVED);
const _: () = assert!(CAMERA_SIZE == padded(10 * FLOAT_SIZE + 1, 4));
const _: () = assert!(LIGHT_SIZE == 4 * FLOAT_SIZE + 3 * 4);

/// Exact message length for a mesh with `vertex_count` expanded vertices.
#[must_use]
pub const fn mesh_message_len(vertex_count: usize) -> usize {
    ENVELOPE_SIZE + MESH_HEADER_SIZE + vertex_count * VERTEX_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(VERTEX_STRIDE, 32);
    }

    #[test]
    fn test_mesh_message_len() {
        assert_eq!(mesh_message_len(0), 96);
        assert_eq!(mesh_message_len(3), 96 + 96);
    }
}
