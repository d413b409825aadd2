//! Per-session producer state.
//!
//! Everything the reconciler remembers between notifications lives in one
//! [`ProducerContext`], created at start and cleared at shutdown.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use scenelink_wire::{EntityKind, Identity};

use crate::scene::NodeHandle;

/// Which change handler is attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observer {
    /// Re-emits the world matrix of the node and its descendants.
    Transform,
    /// Re-emits the mesh snapshot.
    Mesh,
    /// Re-emits the material and every mesh assigned to the group.
    ShadingGroup,
    /// Re-emits the material for every shading group with geometry.
    Shader,
    /// Re-emits the material for every downstream shading group.
    FileTexture,
}

/// Explicit producer state: the pending set, attached observers, the
/// identities the consumer has been told about, and the camera clock.
#[derive(Debug, Default)]
pub struct ProducerContext {
    pending: VecDeque<NodeHandle>,
    pending_set: HashSet<NodeHandle>,
    observers: HashMap<NodeHandle, Observer>,
    announced: HashMap<Identity, EntityKind>,
    newest_transform: Option<Identity>,
    last_camera: Option<Instant>,
}

impl ProducerContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Pending set ────────────────────────────────────────────────

    /// Queue a node for classification. Returns `false` if it was already
    /// queued.
    pub fn defer(&mut self, node: NodeHandle) -> bool {
        if self.pending_set.insert(node) {
            self.pending.push_back(node);
            true
        } else {
            false
        }
    }

    /// Take every queued node, oldest first.
    pub fn drain_pending(&mut self) -> Vec<NodeHandle> {
        self.pending_set.clear();
        self.pending.drain(..).collect()
    }

    /// Drop a node from the pending set.
    pub fn cancel(&mut self, node: NodeHandle) {
        if self.pending_set.remove(&node) {
            self.pending.retain(|n| *n != node);
        }
    }

    /// Number of queued nodes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Observers ──────────────────────────────────────────────────

    /// Attach an observer to a node, replacing any previous one.
    pub fn observe(&mut self, node: NodeHandle, observer: Observer) {
        self.observers.insert(node, observer);
    }

    /// The observer attached to a node.
    #[must_use]
    pub fn observer(&self, node: NodeHandle) -> Option<Observer> {
        self.observers.get(&node).copied()
    }

    /// Detach a node's observer.
    pub fn detach(&mut self, node: NodeHandle) -> Option<Observer> {
        self.observers.remove(&node)
    }

    /// Number of attached observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ── Announced identities ───────────────────────────────────────

    /// Record that an Add for this identity reached the channel.
    pub fn announce(&mut self, id: Identity, kind: EntityKind) {
        self.announced.insert(id, kind);
        if kind == EntityKind::Transform {
            self.newest_transform = Some(id);
        }
    }

    /// The transform whose Add reached the channel most recently, if it is
    /// still live. A mesh Add binds to it on the consumer side.
    #[must_use]
    pub fn newest_transform(&self) -> Option<Identity> {
        self.newest_transform
    }

    /// Returns `true` if an Add for this identity of this kind was sent and
    /// not yet removed.
    #[must_use]
    pub fn is_announced(&self, id: Identity, kind: EntityKind) -> bool {
        self.announced.get(&id) == Some(&kind)
    }

    /// Forget an identity after its Remove was sent.
    pub fn retract(&mut self, id: Identity) {
        self.announced.remove(&id);
        if self.newest_transform == Some(id) {
            self.newest_transform = None;
        }
    }

    // ── Camera clock ───────────────────────────────────────────────

    /// Returns `true` if at least `interval` has passed since the last
    /// camera message, or none was sent yet.
    #[must_use]
    pub fn camera_due(&self, now: Instant, interval: std::time::Duration) -> bool {
        self.last_camera
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Restart the camera clock.
    pub fn camera_sent(&mut self, now: Instant) {
        self.last_camera = Some(now);
    }

    /// Forget everything. Used at shutdown.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
