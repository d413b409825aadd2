//! The fixed-size prefix every message starts with.

use crate::error::WireError;
use crate::identity::Identity;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// The entity was created (or is being re-synced in full).
    Add,
    /// The entity changed; the payload is a full snapshot, not a delta.
    Update,
    /// The entity was destroyed. Carries no payload.
    Remove,
}

impl Activity {
    /// The enumerator written on the wire.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Activity::Add => 0,
            Activity::Update => 1,
            Activity::Remove => 2,
        }
    }

    /// Parse a wire enumerator.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnknownActivity`] for any other value.
    pub const fn from_raw(raw: i32) -> Result<Self, WireError> {
        match raw {
            0 => Ok(Activity::Add),
            1 => Ok(Activity::Update),
            2 => Ok(Activity::Remove),
            other => Err(WireError::UnknownActivity(other)),
        }
    }
}

/// The kind of entity a message describes. Determines the payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Triangle geometry.
    Mesh,
    /// Surface colour and optional texture.
    Material,
    /// The single active viewport camera.
    Camera,
    /// An accumulated world matrix.
    Transform,
    /// Reserved; carried through but not reconciled.
    Light,
}

impl EntityKind {
    /// The enumerator written on the wire.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            EntityKind::Mesh => 0,
            EntityKind::Material => 1,
            EntityKind::Camera => 2,
            EntityKind::Transform => 3,
            EntityKind::Light => 4,
        }
    }

    /// Parse a wire enumerator.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnknownKind`] for any other value.
    pub const fn from_raw(raw: i32) -> Result<Self, WireError> {
        match raw {
            0 => Ok(EntityKind::Mesh),
            1 => Ok(EntityKind::Material),
            2 => Ok(EntityKind::Camera),
            3 => Ok(EntityKind::Transform),
            4 => Ok(EntityKind::Light),
            other => Err(WireError::UnknownKind(other)),
        }
    }
}

/// Activity, kind and identity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Envelope {
    /// Add, Update or Remove.
    pub activity: Activity,
    /// Which payload layout follows.
    pub kind: EntityKind,
    /// The entity this message is about.
    pub id: Identity,
}

impl Envelope {
    /// Create a new envelope.
    #[must_use]
    pub const fn new(activity: Activity, kind: EntityKind, id: Identity) -> Self {
        Self { activity, kind, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerator_values_are_stable() {
        assert_eq!(Activity::Add.to_raw(), 0);
        assert_eq!(Activity::Update.to_raw(), 1);
        assert_eq!(Activity::Remove.to_raw(), 2);
        assert_eq!(EntityKind::Mesh.to_raw(), 0);
        assert_eq!(EntityKind::Material.to_raw(), 1);
        assert_eq!(EntityKind::Camera.to_raw(), 2);
        assert_eq!(EntityKind::Transform.to_raw(), 3);
        assert_eq!(EntityKind::Light.to_raw(), 4);
    }

    #[test]
    fn test_unknown_enumerators_rejected() {
        assert_eq!(Activity::from_raw(3), Err(WireError::UnknownActivity(3)));
        assert_eq!(EntityKind::from_raw(-1), Err(WireError::UnknownKind(-1)));
    }
}
