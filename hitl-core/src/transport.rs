//! Byte transport trait and error types.

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Read or write failed at the OS level.
    Io,
    /// The transport was used after being closed.
    Closed,
    /// A write did not complete in time.
    Timeout,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Closed => write!(f, "transport closed"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

/// Byte-oriented link to the HITL device.
///
/// All calls are non-blocking from the caller's point of view: the bridge
/// only reads as many bytes as [`Transport::available`] reports.
pub trait Transport {
    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> Result<usize, TransportError>;

    /// Read one byte. Only called after `available` reported data.
    fn read_byte(&mut self) -> Result<u8, TransportError>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// Close the link. Further calls return [`TransportError::Closed`].
    fn close(&mut self);
}
