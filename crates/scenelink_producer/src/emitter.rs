//! Encodes messages and hands them to the channel.

use tracing::{debug, warn};

use scenelink_transport::{MessageSender, TransportError};
use scenelink_wire::{Message, encode};

/// Running counters for one producer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProducerStats {
    /// Messages accepted by the channel.
    pub emitted: u64,
    /// Messages dropped because the channel refused them.
    pub dropped: u64,
    /// Messages that failed to encode.
    pub invalid: u64,
    /// Pending nodes skipped at classification.
    pub skipped: u64,
}

/// Wraps a [`MessageSender`] with encoding, logging and counting.
#[derive(Debug)]
pub struct Emitter<T> {
    sender: T,
    stats: ProducerStats,
}

impl<T: MessageSender> Emitter<T> {
    /// Wrap a sender.
    #[must_use]
    pub fn new(sender: T) -> Self {
        Self {
            sender,
            stats: ProducerStats::default(),
        }
    }

    /// Encode and send a message. Returns `true` if the channel accepted it.
    ///
    /// Failures are logged and counted, never returned: a dropped change
    /// leaves the consumer on its previous state.
    pub fn emit(&mut self, message: &Message) -> bool {
        let envelope = message.envelope;
        let bytes = match encode(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.invalid += 1;
                warn!(id = %envelope.id, kind = ?envelope.kind, %err, "failed to encode message");
                return false;
            }
        };

        match self.sender.send(&bytes) {
            Ok(()) => {
                self.stats.emitted += 1;
                debug!(
                    activity = ?envelope.activity,
                    kind = ?envelope.kind,
                    id = %envelope.id,
                    size = bytes.len(),
                    "sent"
                );
                true
            }
            Err(err) => {
                self.stats.dropped += 1;
                match err {
                    TransportError::TooLarge { .. } => warn!(
                        kind = ?envelope.kind,
                        id = %envelope.id,
                        %err,
                        "message exceeds channel ceiling, dropped"
                    ),
                    _ => warn!(kind = ?envelope.kind, id = %envelope.id, %err, "dropped message"),
                }
                false
            }
        }
    }

    /// Count a classification miss.
    pub fn skipped(&mut self) {
        self.stats.skipped += 1;
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ProducerStats {
        self.stats
    }

    /// The wrapped sender.
    #[must_use]
    pub fn sender(&self) -> &T {
        &self.sender
    }

    /// Mutable access to the wrapped sender.
    pub fn sender_mut(&mut self) -> &mut T {
        &mut self.sender
    }
}
