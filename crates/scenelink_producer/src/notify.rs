//! Attribute-change notifications delivered by the authoring application.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// What happened to an attribute. Several bits are usually set at once.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct AttributeMessage: u32 {
        const CONNECTION_MADE = 1 << 0;
        const CONNECTION_BROKEN = 1 << 1;
        const ATTRIBUTE_EVAL = 1 << 2;
        const ATTRIBUTE_SET = 1 << 3;
        const ATTRIBUTE_LOCKED = 1 << 4;
        const ATTRIBUTE_UNLOCKED = 1 << 5;
        const ATTRIBUTE_ADDED = 1 << 6;
        const ATTRIBUTE_REMOVED = 1 << 7;
        const ATTRIBUTE_RENAMED = 1 << 8;
        const ATTRIBUTE_KEYABLE = 1 << 9;
        const ATTRIBUTE_UNKEYABLE = 1 << 10;
        const INCOMING_DIRECTION = 1 << 11;
        const ATTRIBUTE_ARRAY_ADDED = 1 << 12;
        const ATTRIBUTE_ARRAY_REMOVED = 1 << 13;
        const OTHER_PLUG_SET = 1 << 14;
    }
}

impl AttributeMessage {
    /// An evaluation the application performed for itself, with no input
    /// driving it. These fire on every internal re-evaluation and never
    /// trigger a message.
    #[must_use]
    pub fn is_internal_evaluation(self) -> bool {
        self.contains(Self::ATTRIBUTE_EVAL) && !self.contains(Self::INCOMING_DIRECTION)
    }

    /// A connection was made or broken.
    #[must_use]
    pub fn is_connection_change(self) -> bool {
        self.intersects(Self::CONNECTION_MADE | Self::CONNECTION_BROKEN)
    }
}

/// One attribute-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// Message bits.
    pub message: AttributeMessage,
    /// Short name of the attribute that changed, e.g. `outMesh`.
    pub attribute: String,
}

impl AttributeChange {
    /// Create a new notification.
    #[must_use]
    pub fn new(message: AttributeMessage, attribute: impl Into<String>) -> Self {
        Self {
            message,
            attribute: attribute.into(),
        }
    }

    /// Returns `true` if the attribute has the given short name.
    #[must_use]
    pub fn is(&self, attribute: &str) -> bool {
        self.attribute == attribute
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -", self.attribute)?;
        for (name, _) in self.message.iter_names() {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}
