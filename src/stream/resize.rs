//! Owned-buffer streams with growth disciplines
//!
//! Two variants over the same core as the fixed stream:
//!
//! - [`ResizeBitStream`] grows with headroom: call [`validate`] before a
//!   burst of writes and the buffer is guaranteed to hold at least
//!   `min_space` more bytes.
//! - [`InfiniteBitStream`] is an unbounded append buffer: callers advise the
//!   upcoming byte count, and [`compact`] trims accumulated headroom back
//!   down after a burst.
//!
//! [`validate`]: ResizeBitStream::validate
//! [`compact`]: InfiniteBitStream::compact

use crate::error::Result;
use crate::stream::bit_stream::BitStream;
use crate::stream::packet::MAX_PACKET_DATA_SIZE;
use std::io::Write;
use std::ops::{Deref, DerefMut};

/// A stream over an owned buffer that grows with headroom on demand
///
/// Dereferences to [`BitStream`], so the full codec surface is available.
/// Growth is explicit: interleave [`validate`](ResizeBitStream::validate)
/// with writes; the stream never grows behind the caller's back.
pub struct ResizeBitStream {
    stream: BitStream<Vec<u8>>,
    min_space: usize,
}

impl ResizeBitStream {
    /// Create a stream guaranteeing `min_space` bytes of headroom per
    /// validate, with the default initial allocation of `2 * min_space`
    pub fn new(min_space: usize) -> Self {
        Self::with_initial_size(min_space, min_space * 2)
    }

    /// Create a stream with an explicit initial allocation
    pub fn with_initial_size(min_space: usize, initial_size: usize) -> Self {
        debug_assert!(min_space > 0);
        Self {
            stream: BitStream::new(vec![0u8; initial_size]),
            min_space,
        }
    }

    /// Ensure at least `min_space` bytes remain past the current position,
    /// growing to `position + 2 * min_space` when they do not
    pub fn validate(&mut self) {
        if self.stream.position() + self.min_space > self.stream.stream_size() {
            let new_size = self.stream.position() + self.min_space * 2;
            log::debug!(
                "resize stream growing {} -> {} bytes",
                self.stream.stream_size(),
                new_size
            );
            self.stream.grow_to(new_size);
        }
    }

    /// Consume the stream and return the owned buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.stream.into_inner()
    }
}

impl Deref for ResizeBitStream {
    type Target = BitStream<Vec<u8>>;

    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl DerefMut for ResizeBitStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}

/// An unbounded append stream with advised growth and explicit compaction
pub struct InfiniteBitStream {
    stream: BitStream<Vec<u8>>,
    min_space: usize,
}

impl InfiniteBitStream {
    /// Create an append stream with the default packet-sized headroom
    pub fn new() -> Self {
        Self::with_min_space(MAX_PACKET_DATA_SIZE)
    }

    /// Create an append stream guaranteeing `min_space` bytes of headroom
    /// per validate
    pub fn with_min_space(min_space: usize) -> Self {
        debug_assert!(min_space > 0);
        Self {
            stream: BitStream::new(vec![0u8; min_space * 2]),
            min_space,
        }
    }

    /// Rewind to the beginning for reuse; contents and capacity are kept
    pub fn reset(&mut self) {
        self.stream.set_position(0);
    }

    /// Ensure room for `upcoming_bytes` plus the headroom floor, growing to
    /// exactly `position + upcoming_bytes + min_space` when needed
    pub fn validate(&mut self, upcoming_bytes: usize) {
        let needed = self.stream.position() + upcoming_bytes + self.min_space;
        if needed > self.stream.stream_size() {
            log::debug!(
                "append stream growing {} -> {} bytes",
                self.stream.stream_size(),
                needed
            );
            self.stream.grow_to(needed);
        }
    }

    /// Shrink accumulated headroom back to `position + 2 * min_space`,
    /// copying the live prefix into a fresh allocation
    pub fn compact(&mut self) {
        let new_size = self.stream.position() + self.min_space * 2;
        self.stream.replace_buf(vec![0u8; new_size]);
    }

    /// Write the accumulated prefix `[0, position)` to `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.stream.written())?;
        Ok(())
    }

    /// Consume the stream and return the owned buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.stream.into_inner()
    }
}

impl Default for InfiniteBitStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for InfiniteBitStream {
    type Target = BitStream<Vec<u8>>;

    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl DerefMut for InfiniteBitStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_stream_grows_with_headroom() {
        let mut stream = ResizeBitStream::new(16);
        assert_eq!(stream.stream_size(), 32);

        // fill past the headroom threshold, validating between bursts
        for chunk in 0..8 {
            stream.validate();
            for _ in 0..16 {
                stream.write_u8(chunk);
            }
            assert!(!stream.has_error(), "chunk {}", chunk);
        }
        assert_eq!(stream.position(), 128);
        assert!(stream.stream_size() >= 128);
    }

    #[test]
    fn test_resize_growth_preserves_contents_and_cursor() {
        let mut stream = ResizeBitStream::with_initial_size(8, 8);
        stream.write_u32(0xCAFEBABE);
        stream.write_flag(true);
        let bit_pos = stream.bit_position();

        stream.validate();
        assert!(stream.stream_size() > 8);
        assert_eq!(stream.bit_position(), bit_pos);

        stream.set_position(0);
        assert_eq!(stream.read_u32(), 0xCAFEBABE);
        assert!(stream.read_flag());
    }

    #[test]
    fn test_resize_growth_amount() {
        let mut stream = ResizeBitStream::with_initial_size(10, 4);
        stream.write_u32(0);
        stream.validate();
        // position 4 + 2 * min_space
        assert_eq!(stream.stream_size(), 24);
    }

    #[test]
    fn test_infinite_stream_advised_growth() {
        let mut stream = InfiniteBitStream::with_min_space(8);
        assert_eq!(stream.stream_size(), 16);

        stream.validate(100);
        assert_eq!(stream.stream_size(), 108);
        for i in 0..100 {
            stream.write_u8(i);
        }
        assert!(!stream.has_error());
    }

    #[test]
    fn test_infinite_stream_compact() {
        let mut stream = InfiniteBitStream::with_min_space(8);
        stream.validate(1000);
        for i in 0..1000u32 {
            stream.write_u8(i as u8);
        }
        assert!(stream.stream_size() >= 1000);

        stream.compact();
        assert_eq!(stream.stream_size(), 1000 + 16);

        stream.set_position(0);
        for i in 0..1000u32 {
            assert_eq!(stream.read_u8(), i as u8);
        }
        assert!(!stream.has_error());
    }

    #[test]
    fn test_infinite_stream_reset_and_write_to() {
        let mut stream = InfiniteBitStream::with_min_space(32);
        stream.write_bytes(b"payload");
        let mut out = Vec::new();
        stream.write_to(&mut out).unwrap();
        assert_eq!(out, b"payload");

        stream.reset();
        assert_eq!(stream.position(), 0);
        stream.write_bytes(b"next");
        let mut out = Vec::new();
        stream.write_to(&mut out).unwrap();
        assert_eq!(out, b"next");
    }
}
