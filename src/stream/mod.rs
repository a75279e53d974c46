//! Bit-granular serialization streams
//!
//! This module provides the packet-payload layer of the network protocol: a
//! sequential reader/writer that treats its byte buffer as an addressable
//! sequence of bits. There is no framing inside a stream — the call order is
//! the schema, and readers must mirror the writer's calls exactly.
//!
//! Three storage disciplines share the same core:
//!
//! - [`BitStream`] over a borrowed slice — fixed capacity, no growth
//! - [`ResizeBitStream`] — owned buffer that grows with headroom on demand
//! - [`InfiniteBitStream`] — owned append buffer with advised growth and
//!   explicit compaction

pub mod bit_stream;
pub mod packet;
pub mod resize;
pub mod spatial;

pub use bit_stream::{BitStream, StringScratch, MAX_STRING_LEN};
pub use packet::{send_packet_stream, with_packet_stream, Transport, MAX_PACKET_DATA_SIZE};
pub use resize::{InfiniteBitStream, ResizeBitStream};
