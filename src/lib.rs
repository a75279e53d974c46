//! # Bitpacket: Bit-Packed Network Serialization Streams
//!
//! This crate provides the packet-payload layer of a game network protocol:
//! a sequential reader/writer addressing its byte buffer at single-bit
//! granularity, with quantized codecs for the geometric state that dominates
//! per-tick bandwidth.
//!
//! ## Key Features
//!
//! - **Bit-granular streams**: LSB-first bit splicing with correct behavior
//!   across byte boundaries, aligned fast paths, and a sticky-error
//!   discipline checked once per packet
//! - **Quantized codecs**: normalized floats, signed ints, unit normals in
//!   two angular forms, bounded-magnitude vectors, and affine transforms as
//!   translation plus three-component quaternion
//! - **Anchored positions**: delta-encoded points with four precision tiers
//!   against a movable compression anchor
//! - **Static-Huffman strings**: short ASCII transport over a frozen
//!   frequency table shared by both peers, with a differential-prefix
//!   shortcut for successive similar strings
//! - **Growth disciplines**: fixed external buffers, headroom-validated
//!   resizing, and unbounded append with explicit compaction
//! - **Zero-allocation packets**: a thread-local packet stream handed to the
//!   transport seam without copies
//!
//! ## Quick Start
//!
//! ```rust
//! use bitpacket::{BitStream, Vec3};
//!
//! // writer side
//! let mut buf = [0u8; 64];
//! let mut stream = BitStream::new(&mut buf[..]);
//! if stream.write_flag(true) {
//!     stream.write_int(42, 7);
//! }
//! stream.write_normal(Vec3::new(0.0, 0.6, 0.8), 8);
//! stream.write_string("hello");
//! assert!(stream.check().is_ok());
//! let wire = stream.written().to_vec();
//!
//! // reader side mirrors the exact call order; there is no framing
//! let mut stream = BitStream::new(&wire[..]);
//! if stream.read_flag() {
//!     assert_eq!(stream.read_int(7), 42);
//! }
//! let normal = stream.read_normal(8);
//! assert!((normal.len() - 1.0).abs() < 1e-2);
//! assert_eq!(stream.read_string(), "hello");
//! assert!(stream.check().is_ok());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod entropy;
pub mod error;
pub mod math;
pub mod stream;

// Re-export core types
pub use error::{BitPacketError, Result};
pub use math::{Mat4, Quat, Vec3};
pub use stream::{
    send_packet_stream, with_packet_stream, BitStream, InfiniteBitStream, ResizeBitStream,
    StringScratch, Transport, MAX_PACKET_DATA_SIZE, MAX_STRING_LEN,
};

pub use entropy::HuffmanTable;
pub use stream::spatial::quantize_normal;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library: forces the shared Huffman table build so no
/// packet pays the one-time cost
pub fn init() {
    log::debug!("initializing bitpacket v{}", VERSION);
    let _ = HuffmanTable::shared();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_multiple_init_calls() {
        init();
        init();
    }

    #[test]
    fn test_re_exports() {
        let mut buf = [0u8; 8];
        let _stream = BitStream::new(&mut buf[..]);
        let _v = Vec3::ZERO;
        let _err = BitPacketError::overrun(64);
        assert!(std::any::type_name::<Result<()>>().contains("BitPacketError"));
    }
}
