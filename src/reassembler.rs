//! Reassembly of fixed-size frames from an arbitrarily chunked byte stream

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::types::{FRAME_SIZE, RawFrame};

/// Accumulates transport bytes and cuts them into whole [`RawFrame`]s.
///
/// Frames are taken from the front of the buffer by advancing a read cursor,
/// so extracting a frame never shifts the bytes that follow it.
///
/// There is no resynchronization. If the sender ever drops or inserts a byte,
/// every later frame is cut at the wrong offset.
#[derive(Debug, Default)]
pub struct StreamReassembler {
    buffer: BytesMut,
}

impl StreamReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty reassembler with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(capacity) }
    }

    /// Append bytes to the tail of the buffer without extracting anything.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        trace!(appended = bytes.len(), buffered = self.buffer.len(), "Bytes buffered");
    }

    /// Take the next complete frame off the front of the buffer.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        if self.buffer.len() < FRAME_SIZE {
            return None;
        }

        let mut bytes = [0u8; FRAME_SIZE];
        bytes.copy_from_slice(&self.buffer[..FRAME_SIZE]);
        self.buffer.advance(FRAME_SIZE);
        Some(RawFrame::new(bytes))
    }

    /// Iterate over every complete frame currently buffered.
    ///
    /// When the iterator is exhausted fewer than [`FRAME_SIZE`] bytes remain.
    pub fn frames(&mut self) -> impl Iterator<Item = RawFrame> + '_ {
        std::iter::from_fn(move || self.next_frame())
    }

    /// Append bytes and return every frame they complete, in arrival order.
    pub fn append(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        self.push(bytes);
        self.frames().collect()
    }

    /// Bytes currently held, including any whole frames not yet taken.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes of the trailing incomplete frame.
    pub fn partial_len(&self) -> usize {
        self.buffer.len() % FRAME_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
