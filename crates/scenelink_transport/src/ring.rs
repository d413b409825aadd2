//! Bounded ring buffer for variable-length records.
//!
//! Each record is a 4-byte little-endian length followed by the payload,
//! padded so the next record starts on a 4-byte boundary. A record never
//! straddles the end of the storage: when it would, the writer leaves a
//! [`WRAP_MARKER`] in place of the length and restarts at offset zero. If
//! fewer than 4 bytes remain at the end, they are skipped implicitly.
//!
//! `head` and `tail` are monotonically increasing byte counters; the storage
//! index is the counter modulo the capacity.

use crate::error::TransportError;

/// Records start on multiples of this many bytes.
pub const RECORD_ALIGN: usize = 4;

/// Length value marking "skip to the start of the storage".
pub const WRAP_MARKER: u32 = u32::MAX;

const LEN_SIZE: usize = 4;

/// Round `n` up to a multiple of `align`.
#[must_use]
pub const fn align_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

/// Bytes a payload of `len` bytes occupies in the ring, excluding any wrap.
#[must_use]
pub const fn record_size(len: usize) -> usize {
    align_up(LEN_SIZE + len, RECORD_ALIGN)
}

/// Why a push was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// Not enough free space right now.
    Full,
    /// The record could never fit in this ring.
    TooLarge,
}

/// Why a pop returned nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// The ring is empty.
    Empty,
    /// A record header points outside the committed region.
    Corrupt {
        /// Storage index of the bad header.
        offset: usize,
    },
}

/// A single-producer, single-consumer byte ring.
#[derive(Debug)]
pub struct ByteRing {
    storage: Box<[u8]>,
    head: usize,
    tail: usize,
    records: usize,
}

impl ByteRing {
    /// Create a ring with `capacity_bytes` of storage.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if the capacity is zero, not
    /// a multiple of [`RECORD_ALIGN`], or too large for a 32-bit length.
    pub fn new(capacity_bytes: usize) -> Result<Self, TransportError> {
        if capacity_bytes == 0 || capacity_bytes % RECORD_ALIGN != 0 {
            return Err(TransportError::InvalidConfig(format!(
                "ring capacity {capacity_bytes} must be a non-zero multiple of {RECORD_ALIGN}"
            )));
        }
        if capacity_bytes >= WRAP_MARKER as usize {
            return Err(TransportError::InvalidConfig(format!(
                "ring capacity {capacity_bytes} does not fit a 32-bit length"
            )));
        }
        Ok(Self {
            storage: vec![0u8; capacity_bytes].into_boxed_slice(),
            head: 0,
            tail: 0,
            records: 0,
        })
    }

    /// Total storage in bytes.
    #[must_use]
    pub fn capacity_bytes(&self) -> usize {
        self.storage.len()
    }

    /// Bytes currently reserved by queued records and wrap padding.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.tail.wrapping_sub(self.head)
    }

    /// Number of queued records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
    }

    /// Returns `true` if no record is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Largest payload that can ever be pushed into this ring.
    #[must_use]
    pub fn max_payload(&self) -> usize {
        self.capacity_bytes() - LEN_SIZE
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::TooLarge`] if the record exceeds the capacity, or
    /// [`PushError::Full`] if it does not fit in the free space right now.
    pub fn try_push(&mut self, payload: &[u8]) -> Result<(), PushError> {
        let cap = self.capacity_bytes();
        let size = record_size(payload.len());
        if payload.len() >= WRAP_MARKER as usize || size > cap {
            return Err(PushError::TooLarge);
        }

        let free = cap - self.used_bytes();
        let tail_index = self.tail % cap;
        let remaining = cap - tail_index;

        let (padding, write_wrap_marker) = if remaining < LEN_SIZE {
            (remaining, false)
        } else if remaining < size {
            (remaining, true)
        } else {
            (0, false)
        };

        if padding + size > free {
            return Err(PushError::Full);
        }

        if write_wrap_marker {
            self.write_len(tail_index, WRAP_MARKER);
        }
        let start = (tail_index + padding) % cap;
        // Bounded by the capacity, which is below `WRAP_MARKER`.
        self.write_len(start, payload.len() as u32);
        self.storage[start + LEN_SIZE..start + LEN_SIZE + payload.len()].copy_from_slice(payload);

        self.tail = self.tail.wrapping_add(padding + size);
        self.records += 1;
        Ok(())
    }

    /// Remove and return the oldest record.
    ///
    /// # Errors
    ///
    /// Returns [`PopError::Empty`] if nothing is queued, or
    /// [`PopError::Corrupt`] if the record header is inconsistent.
    pub fn try_pop(&mut self) -> Result<Vec<u8>, PopError> {
        let cap = self.capacity_bytes();
        loop {
            if self.records == 0 {
                return Err(PopError::Empty);
            }

            let head_index = self.head % cap;
            let remaining = cap - head_index;
            if remaining < LEN_SIZE {
                // Implicit padding.
                self.head = self.head.wrapping_add(remaining);
                continue;
            }

            let len = self.read_len(head_index);
            if len == WRAP_MARKER {
                self.head = self.head.wrapping_add(remaining);
                continue;
            }

            let len = len as usize;
            let total = record_size(len);
            if total > remaining || total > self.used_bytes() {
                return Err(PopError::Corrupt { offset: head_index });
            }

            let start = head_index + LEN_SIZE;
            let out = self.storage[start..start + len].to_vec();
            self.head = self.head.wrapping_add(total);
            self.records -= 1;
            return Ok(out);
        }
    }

    /// Drop every queued record.
    pub fn clear(&mut self) {
        self.head = self.tail;
        self.records = 0;
    }

    fn write_len(&mut self, index: usize, len: u32) {
        self.storage[index..index + LEN_SIZE].copy_from_slice(&len.to_le_bytes());
    }

    fn read_len(&self, index: usize) -> u32 {
        let mut raw = [0u8; LEN_SIZE];
        raw.copy_from_slice(&self.storage[index..index + LEN_SIZE]);
        u32::from_le_bytes(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_misaligned_capacity() {
        assert!(ByteRing::new(0).is_err());
        assert!(ByteRing::new(10).is_err());
        assert!(ByteRing::new(64).is_ok());
    }

    #[test]
    fn test_fifo_order() {
        let mut ring = ByteRing::new(64).unwrap();
        ring.try_push(b"one").unwrap();
        ring.try_push(b"two").unwrap();
        ring.try_push(b"").unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.try_pop().unwrap(), b"one");
        assert_eq!(ring.try_pop().unwrap(), b"two");
        assert_eq!(ring.try_pop().unwrap(), b"");
        assert_eq!(ring.try_pop(), Err(PopError::Empty));
    }

    #[test]
    fn test_full_and_too_large() {
        let mut ring = ByteRing::new(16).unwrap();
        assert_eq!(ring.try_push(&[0u8; 13]), Err(PushError::TooLarge));
        ring.try_push(&[1u8; 8]).unwrap();
        assert_eq!(ring.try_push(&[2u8; 8]), Err(PushError::Full));
        ring.try_pop().unwrap();
        ring.try_push(&[2u8; 8]).unwrap();
    }

    #[test]
    fn test_wrap_marker_used_at_end() {
        let mut ring = ByteRing::new(32).unwrap();
        ring.try_push(&[1u8; 12]).unwrap(); // 16 bytes
        ring.try_push(&[2u8; 4]).unwrap(); // 8 bytes, tail at 24
        assert_eq!(ring.try_pop().unwrap(), vec![1u8; 12]);

        // 8 bytes remain at the end, the record needs 12: wrap to zero.
        ring.try_push(&[3u8; 8]).unwrap();
        assert_eq!(ring.read_len(24), WRAP_MARKER);
        assert_eq!(ring.try_pop().unwrap(), vec![2u8; 4]);
        assert_eq!(ring.try_pop().unwrap(), vec![3u8; 8]);
        assert!(ring.is_empty());
        assert_eq!(ring.used_bytes(), 0);
    }

    #[test]
    fn test_wrap_counts_padding_against_free_space() {
        let mut ring = ByteRing::new(32).unwrap();
        ring.try_push(&[1u8; 20]).unwrap(); // 24 bytes
        ring.try_pop().unwrap();
        ring.try_push(&[2u8; 4]).unwrap(); // 8 bytes at 24, tail at 32
        // Head is at 24: 24 bytes free, record of 24 fits at offset 0.
        ring.try_push(&[3u8; 20]).unwrap();
        assert_eq!(ring.try_push(&[4u8; 0]), Err(PushError::Full));
        assert_eq!(ring.try_pop().unwrap(), vec![2u8; 4]);
        assert_eq!(ring.try_pop().unwrap(), vec![3u8; 20]);
    }

    #[test]
    fn test_many_cycles_preserve_contents() {
        let mut ring = ByteRing::new(100).unwrap();
        for i in 0..1000u32 {
            let payload: Vec<u8> = (0..(i % 23) as u8).map(|b| b ^ i as u8).collect();
            ring.try_push(&payload).unwrap();
            assert_eq!(ring.try_pop().unwrap(), payload);
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_corrupt_length_detected() {
        let mut ring = ByteRing::new(32).unwrap();
        ring.try_push(&[1u8; 4]).unwrap();
        ring.write_len(0, 200);
        assert_eq!(ring.try_pop(), Err(PopError::Corrupt { offset: 0 }));
    }
}
