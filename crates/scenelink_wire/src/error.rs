//! Wire-format error types.

use crate::envelope::EntityKind;

/// Errors produced while encoding or decoding a scene message.
///
/// A decode error always means the whole message was rejected; no partial
/// message is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer ended before a declared field or section.
    #[error("message truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Offset where the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The buffer is longer than the declared fields and sections.
    #[error("message has {0} trailing bytes")]
    TrailingBytes(usize),

    /// The activity enumerator is not one of Add/Update/Remove.
    #[error("unknown activity value {0}")]
    UnknownActivity(i32),

    /// The entity kind enumerator is not a known kind.
    #[error("unknown entity kind value {0}")]
    UnknownKind(i32),

    /// An identity field is not a NUL-terminated UUID (or empty).
    #[error("invalid identity field")]
    InvalidIdentity,

    /// A declared count is negative.
    #[error("negative count {value} for {field}")]
    NegativeCount {
        /// The header field holding the count.
        field: &'static str,
        /// The value that was read.
        value: i32,
    },

    /// Mesh counts and array lengths disagree.
    #[error(
        "inconsistent mesh: {vertices} vertices, {triangles} triangles, \
         {positions} positions, {uvs} uvs, {normals} normals"
    )]
    InconsistentMesh {
        /// Declared or derived vertex count.
        vertices: usize,
        /// Declared triangle count.
        triangles: usize,
        /// Number of position floats.
        positions: usize,
        /// Number of UV floats.
        uvs: usize,
        /// Number of normal floats.
        normals: usize,
    },

    /// A boolean byte held something other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// The texture path is missing its NUL terminator or is not UTF-8.
    #[error("invalid texture path")]
    InvalidPath,

    /// A section is too large to describe with the header's 32-bit count.
    #[error("{0} section too large for the wire format")]
    Oversized(&'static str),

    /// The payload variant does not match the envelope kind.
    #[error("payload for {payload:?} attached to a {envelope:?} envelope")]
    KindMismatch {
        /// Kind named in the envelope.
        envelope: EntityKind,
        /// Kind implied by the payload.
        payload: EntityKind,
    },

    /// A non-Remove message has no payload.
    #[error("{0:?} message has no payload")]
    MissingPayload(EntityKind),

    /// A Remove message carries a payload.
    #[error("remove message for {0:?} carries a payload")]
    UnexpectedPayload(EntityKind),
}
