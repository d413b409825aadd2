//! Cross-process entity identity.
//!
//! An [`Identity`] is the UUID the authoring application assigns to a node.
//! It is the only join key between producer and consumer: the consumer never
//! infers identity from ordering or position.
//!
//! On the wire an identity occupies [`IDENTITY_FIELD_LEN`] bytes: the 36
//! character hyphenated text followed by a NUL. The nil identity (used for
//! "no material resolved") is written as an all-zero field, which reads back
//! as an empty string on the authoring side.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::WireError;

/// Length of the textual UUID, without terminator.
pub const IDENTITY_TEXT_LEN: usize = 36;

/// Length of an identity field on the wire (`uuid[36] + '\0'`).
pub const IDENTITY_FIELD_LEN: usize = IDENTITY_TEXT_LEN + 1;

/// A stable entity identifier shared by both processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity(Uuid);

impl Identity {
    /// The nil identity, meaning "unresolved".
    pub const NIL: Identity = Identity(Uuid::nil());

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random identity.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }

    /// Returns `true` for the nil identity.
    #[must_use]
    pub fn is_nil(self) -> bool {
        self.0.is_nil()
    }

    /// Encode into a fixed wire field.
    #[must_use]
    pub fn to_field(self) -> [u8; IDENTITY_FIELD_LEN] {
        let mut field = [0u8; IDENTITY_FIELD_LEN];
        if !self.is_nil() {
            self.0
                .hyphenated()
                .encode_upper(&mut field[..IDENTITY_TEXT_LEN]);
        }
        field
    }

    /// Decode a fixed wire field.
    ///
    /// An empty string (leading NUL) decodes to [`Identity::NIL`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidIdentity`] if the field is not exactly
    /// [`IDENTITY_FIELD_LEN`] bytes, is not NUL-terminated, or does not hold
    /// a hyphenated UUID.
    pub fn from_field(field: &[u8]) -> Result<Self, WireError> {
        if field.len() != IDENTITY_FIELD_LEN {
            return Err(WireError::InvalidIdentity);
        }
        if field[0] == 0 {
            return Ok(Self::NIL);
        }
        if field[IDENTITY_TEXT_LEN] != 0 {
            return Err(WireError::InvalidIdentity);
        }
        let text = std::str::from_utf8(&field[..IDENTITY_TEXT_LEN])
            .map_err(|_| WireError::InvalidIdentity)?;
        text.parse()
    }
}

impl FromStr for Identity {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != IDENTITY_TEXT_LEN {
            return Err(WireError::InvalidIdentity);
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| WireError::InvalidIdentity)
    }
}

impl From<Uuid> for Identity {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        f.write_str(self.0.hyphenated().encode_upper(&mut buf))
    }
}
