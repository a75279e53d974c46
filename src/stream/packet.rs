//! Thread-local outbound packet stream
//!
//! Packet construction is zero-allocation: one packet-sized buffer per
//! thread is reused for every outbound packet. All network writes for a
//! peer must happen on one designated thread; the thread-local makes that
//! contract structural instead of advisory.

use crate::error::Result;
use crate::stream::bit_stream::BitStream;
use std::cell::RefCell;
use std::net::SocketAddr;

/// Largest payload the packet stream will hand to the transport, in bytes
pub const MAX_PACKET_DATA_SIZE: usize = 1500;

/// The seam to the datagram transport; the core never touches sockets
/// itself
pub trait Transport {
    /// Send `payload` to `addr`
    fn send_to(&mut self, addr: SocketAddr, payload: &[u8]) -> Result<()>;
}

thread_local! {
    static PACKET_STREAM: RefCell<BitStream<Vec<u8>>> =
        RefCell::new(BitStream::new(vec![0u8; MAX_PACKET_DATA_SIZE]));
}

/// Run `f` against this thread's packet stream, rewound to the start with
/// its ceilings set to `write_size` bytes (the maximum packet size when 0)
///
/// The stream's cursor survives until the next `with_packet_stream` call,
/// so a follow-up [`send_packet_stream`] picks up exactly the bytes written
/// by `f`.
pub fn with_packet_stream<R>(write_size: usize, f: impl FnOnce(&mut BitStream<Vec<u8>>) -> R) -> R {
    let write_size = if write_size == 0 {
        MAX_PACKET_DATA_SIZE
    } else {
        write_size.min(MAX_PACKET_DATA_SIZE)
    };
    PACKET_STREAM.with(|cell| {
        let mut stream = cell.borrow_mut();
        stream.rebind(write_size);
        f(&mut stream)
    })
}

/// Hand this thread's packet stream contents `[0, position)` to the
/// transport
pub fn send_packet_stream<T: Transport>(transport: &mut T, addr: SocketAddr) -> Result<()> {
    PACKET_STREAM.with(|cell| {
        let stream = cell.borrow();
        transport.send_to(addr, stream.written())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingTransport {
        sent: Vec<(SocketAddr, Vec<u8>)>,
    }

    impl Transport for RecordingTransport {
        fn send_to(&mut self, addr: SocketAddr, payload: &[u8]) -> Result<()> {
            self.sent.push((addr, payload.to_vec()));
            Ok(())
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:28000".parse().unwrap()
    }

    #[test]
    fn test_packet_stream_build_and_send() {
        let mut transport = RecordingTransport { sent: Vec::new() };

        with_packet_stream(64, |stream| {
            stream.write_flag(true);
            stream.write_int(0x1234, 16);
            assert!(stream.check().is_ok());
        });
        send_packet_stream(&mut transport, test_addr()).unwrap();

        assert_eq!(transport.sent.len(), 1);
        let (addr, payload) = &transport.sent[0];
        assert_eq!(*addr, test_addr());
        // 17 bits -> 3 bytes
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn test_packet_stream_resets_between_packets() {
        with_packet_stream(32, |stream| {
            stream.write_u32(0xAAAAAAAA);
            assert_eq!(stream.position(), 4);
        });
        with_packet_stream(32, |stream| {
            assert_eq!(stream.position(), 0);
            assert!(!stream.has_error());
        });
    }

    #[test]
    fn test_packet_stream_write_ceiling() {
        with_packet_stream(2, |stream| {
            stream.write_u16(0xFFFF);
            assert!(!stream.has_error());
            stream.write_flag(true);
            assert!(stream.has_error());
        });
        // a fresh rebind clears the poisoned flag
        with_packet_stream(2, |stream| {
            assert!(!stream.has_error());
        });
    }

    #[test]
    fn test_zero_write_size_means_max() {
        with_packet_stream(0, |stream| {
            assert_eq!(stream.stream_size(), MAX_PACKET_DATA_SIZE);
        });
    }
}
