//! Error handling for the bitpacket library
//!
//! Stream operations themselves never return `Result` — over-runs latch the
//! stream's sticky error flag and become no-ops, so composed codecs stay
//! cheap to call. This module provides the typed error surfaced when callers
//! inspect that flag at packet boundaries, plus the errors of the few
//! fallible edges (transport hand-off, buffer flush).

use thiserror::Error;

/// Main error type for the bitpacket library
#[derive(Error, Debug)]
pub enum BitPacketError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read or write ran past one of the stream's bit ceilings
    #[error("stream overrun: operation exceeded the {limit_bits}-bit ceiling")]
    Overrun {
        /// The bit ceiling that was exceeded
        limit_bits: usize,
    },

    /// Invalid data format or corruption
    #[error("invalid data: {message}")]
    InvalidData {
        /// Error message describing the issue
        message: String,
    },
}

impl BitPacketError {
    /// Create an overrun error for the given bit ceiling
    pub fn overrun(limit_bits: usize) -> Self {
        Self::Overrun { limit_bits }
    }

    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Overrun { .. } => "overrun",
            Self::InvalidData { .. } => "data",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BitPacketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BitPacketError::overrun(256);
        assert_eq!(err.category(), "overrun");

        let err = BitPacketError::invalid_data("bad prefix offset");
        assert_eq!(err.category(), "data");
    }

    #[test]
    fn test_error_display() {
        let err = BitPacketError::overrun(96);
        let display = format!("{}", err);
        assert!(display.contains("overrun"));
        assert!(display.contains("96"));

        let err = BitPacketError::invalid_data("truncated payload");
        assert!(format!("{}", err).contains("truncated payload"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::WriteZero, "short write");
        let err: BitPacketError = io_error.into();
        assert_eq!(err.category(), "io");
        assert!(format!("{}", err).contains("I/O error"));
    }
}
