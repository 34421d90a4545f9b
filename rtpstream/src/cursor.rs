//! Sequence/timestamp state shared by every delivery on one stream.

use parking_lot::Mutex;

/// A point in the stream's sequence/timestamp space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Sequence number of the next packet.
    pub sequence: u16,
    /// RTP timestamp of the next packet.
    pub timestamp: u32,
}

impl Position {
    /// Creates a position.
    pub const fn new(sequence: u16, timestamp: u32) -> Self {
        Self { sequence, timestamp }
    }

    /// Returns the position `packets` packets later, wrapping both fields.
    pub fn advance(self, packets: usize, samples_per_frame: u32) -> Self {
        Self {
            sequence: self.sequence.wrapping_add(packets as u16),
            timestamp: self
                .timestamp
                .wrapping_add(samples_per_frame.wrapping_mul(packets as u32)),
        }
    }

    /// Returns the position one packet later.
    pub fn next(self, samples_per_frame: u32) -> Self {
        self.advance(1, samples_per_frame)
    }
}

/// Persistent cursor of one logical outbound stream.
///
/// The lock is only ever held to copy the position in or out; callers
/// work on a local [`Position`] in between.
#[derive(Debug, Default)]
pub struct StreamCursor {
    position: Mutex<Position>,
}

impl StreamCursor {
    /// Creates a cursor at sequence 0, timestamp 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cursor at the given position.
    pub fn starting_at(position: Position) -> Self {
        Self {
            position: Mutex::new(position),
        }
    }

    /// Copies out the current position.
    pub fn snapshot(&self) -> Position {
        *self.position.lock()
    }

    /// Stores `position` as the current position.
    pub fn commit(&self, position: Position) {
        *self.position.lock() = position;
    }
}
