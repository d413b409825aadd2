//! Sender and receiver ends of a shared ring.
//!
//! Both ends hold the same [`ByteRing`] behind a mutex. The receiver never
//! blocks. The sender waits on a condition variable for the receiver to drain
//! when the ring is full, for at most the configured send timeout.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::ChannelConfig;
use crate::error::TransportError;
use crate::ring::{ByteRing, PopError, PushError};

/// The producing side of a message channel.
pub trait MessageSender {
    /// Queue one complete message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::TooLarge`] if the message exceeds
    /// [`max_message_size`](Self::max_message_size),
    /// [`TransportError::Full`] if there is no room, or
    /// [`TransportError::Disconnected`] if the receiver is gone.
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// The hard ceiling for a single message.
    fn max_message_size(&self) -> usize;
}

/// The consuming side of a message channel.
pub trait MessageReceiver {
    /// Take the oldest queued message without blocking.
    ///
    /// Returns `Ok(None)` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Corrupt`] if the queue state was damaged. The
    /// queue is reset, so the next call starts clean.
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Returns `false` once the sending side is gone for good.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<S: MessageSender + ?Sized> MessageSender for Box<S> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn max_message_size(&self) -> usize {
        (**self).max_message_size()
    }
}

impl<R: MessageReceiver + ?Sized> MessageReceiver for Box<R> {
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).try_receive()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

#[derive(Debug)]
struct RingState {
    ring: ByteRing,
    sender_alive: bool,
    receiver_alive: bool,
}

#[derive(Debug)]
struct Shared {
    name: String,
    state: Mutex<RingState>,
    drained: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RingState> {
        // Every ring operation leaves it consistent; poisoning is ignored.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected sender/receiver pair over a fresh ring.
///
/// # Errors
///
/// Returns [`TransportError::InvalidConfig`] if the configuration does not
/// validate.
pub fn shared_channel(
    config: &ChannelConfig,
) -> Result<(RingSender, RingReceiver), TransportError> {
    config.validate()?;
    let shared = Arc::new(Shared {
        name: config.name.clone(),
        state: Mutex::new(RingState {
            ring: ByteRing::new(config.capacity_bytes)?,
            sender_alive: true,
            receiver_alive: true,
        }),
        drained: Condvar::new(),
    });
    info!(
        channel = %config.name,
        capacity_bytes = config.capacity_bytes,
        max_message_size = config.max_message_size,
        "opened channel"
    );
    let sender = RingSender {
        shared: Arc::clone(&shared),
        max_message_size: config.max_message_size,
        send_timeout: Duration::from_millis(config.send_timeout_ms),
    };
    Ok((sender, RingReceiver { shared }))
}

/// Sending end returned by [`shared_channel`].
#[derive(Debug)]
pub struct RingSender {
    shared: Arc<Shared>,
    max_message_size: usize,
    send_timeout: Duration,
}

impl RingSender {
    /// The channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of messages waiting to be received.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.lock().ring.len()
    }
}

impl MessageSender for RingSender {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if message.len() > self.max_message_size {
            return Err(TransportError::TooLarge {
                size: message.len(),
                max: self.max_message_size,
            });
        }

        let deadline = Instant::now() + self.send_timeout;
        let mut state = self.shared.lock();
        loop {
            if !state.receiver_alive {
                return Err(TransportError::Disconnected);
            }
            match state.ring.try_push(message) {
                Ok(()) => return Ok(()),
                Err(PushError::TooLarge) => {
                    return Err(TransportError::TooLarge {
                        size: message.len(),
                        max: state.ring.max_payload(),
                    });
                }
                Err(PushError::Full) => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TransportError::Full {
                    size: message.len(),
                });
            }
            state = self
                .shared
                .drained
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl Drop for RingSender {
    fn drop(&mut self) {
        self.shared.lock().sender_alive = false;
        debug!(channel = %self.shared.name, "sender closed");
    }
}

/// Receiving end returned by [`shared_channel`].
#[derive(Debug)]
pub struct RingReceiver {
    shared: Arc<Shared>,
}

impl RingReceiver {
    /// The channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl MessageReceiver for RingReceiver {
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut state = self.shared.lock();
        match state.ring.try_pop() {
            Ok(message) => {
                drop(state);
                self.shared.drained.notify_all();
                Ok(Some(message))
            }
            Err(PopError::Empty) => Ok(None),
            Err(PopError::Corrupt { offset }) => {
                state.ring.clear();
                drop(state);
                self.shared.drained.notify_all();
                Err(TransportError::Corrupt { offset })
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.shared.lock().sender_alive
    }
}

impl Drop for RingReceiver {
    fn drop(&mut self) {
        self.shared.lock().receiver_alive = false;
        self.shared.drained.notify_all();
        debug!(channel = %self.shared.name, "receiver closed");
    }
}
