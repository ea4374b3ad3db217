//! Frame serialization for HITL messages.
//!
//! This module provides the [`WireFormat`] trait for packed payload blocks and
//! the [`Serialize`] trait that wraps a payload into a complete frame.
//!
//! # Frame Format
//!
//! ```text
//! +--------+----------+-----------------+----------------+-------+
//! | "HITL" | type i32 | payload (fixed) | length i32     | "END" |
//! +--------+----------+-----------------+----------------+-------+
//!   4 bytes  4 bytes    per type          header+payload   3 bytes
//! ```
//!
//! # Example
//!
//! ```
//! use hitl_proto::{PlaneControl, Serialize, PREAMBLE};
//!
//! let control = PlaneControl::default();
//! let mut buf = [0u8; 32];
//! let len = control.serialize(&mut buf).unwrap();
//!
//! assert_eq!(len, 23);
//! assert!(buf.starts_with(&PREAMBLE));
//! assert!(buf[..len].ends_with(b"END"));
//! ```

use crate::parser::ParseError;
use crate::types::{Message, MessageType, TelemetryBundle};
use crate::wire::{WireReader, WireWriter};

/// Literal bytes that open every frame.
pub const PREAMBLE: [u8; 4] = *b"HITL";

/// Preamble plus the `i32` type tag.
pub const HEADER_SIZE: usize = PREAMBLE.len() + 4;

/// Literal bytes that close every frame.
pub const FOOTER_MARKER: [u8; 3] = *b"END";

/// Declared length (`i32`) plus the marker.
pub const FOOTER_SIZE: usize = 4 + FOOTER_MARKER.len();

/// Largest frame on the link (the telemetry bundle).
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + TelemetryBundle::SIZE + FOOTER_SIZE;

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the frame.
    BufferTooSmall,
    /// A write operation failed.
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Packed, fixed-size layout of one payload block.
pub trait WireFormat: Sized {
    /// Exact encoded size in bytes.
    const SIZE: usize;

    /// Write the block. The writer must have at least [`Self::SIZE`] bytes left.
    fn write_to(&self, w: &mut WireWriter<'_>);

    /// Read the block. The reader must have at least [`Self::SIZE`] bytes left.
    fn read_from(r: &mut WireReader<'_>) -> Self;
}

/// Extension trait for serializing a payload as a complete frame.
pub trait Serialize: WireFormat {
    /// Type tag written into the frame header.
    const TYPE_TAG: i32;

    /// Full frame size for this payload.
    const FRAME_SIZE: usize = HEADER_SIZE + Self::SIZE + FOOTER_SIZE;

    /// Serialize header, payload and footer to the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < Self::FRAME_SIZE {
            return Err(SerializeError::BufferTooSmall);
        }
        let declared =
            i32::try_from(HEADER_SIZE + Self::SIZE).map_err(|_| SerializeError::WriteError)?;

        let mut w = WireWriter::new(buf);
        w.put_bytes(&PREAMBLE);
        w.put_i32(Self::TYPE_TAG);
        self.write_to(&mut w);
        w.put_i32(declared);
        w.put_bytes(&FOOTER_MARKER);
        Ok(w.position())
    }

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    #[cfg(feature = "heapless")]
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }
}

impl Message {
    /// Serialize the message as a complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        match self {
            Self::Ping => crate::types::Ping.serialize(buf),
            Self::State(s) => s.serialize(buf),
            Self::PlaneControl(c) => c.serialize(buf),
            Self::HeliControl(c) => c.serialize(buf),
        }
    }
}

/// Validate a complete frame and decode its payload as `P`.
///
/// The frame must be exactly `P::FRAME_SIZE` bytes with the matching tag.
///
/// # Errors
///
/// Returns the [`ParseError`] describing the first check that failed.
pub fn decode_frame<P: Serialize>(bytes: &[u8]) -> Result<P, ParseError> {
    if bytes.len() != P::FRAME_SIZE {
        return Err(ParseError::Length);
    }
    let mut r = WireReader::new(bytes);
    let mut preamble = [0u8; 4];
    for b in preamble.iter_mut() {
        *b = r.get_u8();
    }
    if preamble != PREAMBLE {
        return Err(ParseError::Preamble);
    }
    let tag = r.get_i32();
    if tag != P::TYPE_TAG {
        return Err(ParseError::UnknownType(tag));
    }
    let payload = P::read_from(&mut r);
    check_footer(&bytes[HEADER_SIZE + P::SIZE..], HEADER_SIZE + P::SIZE)?;
    Ok(payload)
}

/// Check a footer against the number of header and payload bytes it follows.
pub(crate) fn check_footer(footer: &[u8], consumed: usize) -> Result<(), ParseError> {
    if footer.len() != FOOTER_SIZE {
        return Err(ParseError::Length);
    }
    let mut r = WireReader::new(footer);
    let declared = r.get_i32();
    if usize::try_from(declared).ok() != Some(consumed) {
        return Err(ParseError::Length);
    }
    if footer[4..] != FOOTER_MARKER {
        return Err(ParseError::Footer);
    }
    Ok(())
}

/// Complete frame size for a message type.
#[inline]
#[must_use]
pub const fn frame_size(message_type: MessageType) -> usize {
    HEADER_SIZE + message_type.payload_size() + FOOTER_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArmState, HeliControl, PlaneControl, StarterStatus, StateReport};

    #[test]
    fn test_serialize_state_frame_layout() {
        let report = StateReport {
            arm: ArmState::Armed,
            ahrs_count: 250,
            starter: StarterStatus::Idle,
        };
        let mut buf = [0u8; 32];
        let len = report.serialize(&mut buf).unwrap();

        assert_eq!(len, 21);
        assert_eq!(&buf[..4], b"HITL");
        assert_eq!(&buf[4..8], &1i32.to_le_bytes());
        assert_eq!(&buf[8..14], &[1, 250, 0, 0, 0, 0]);
        assert_eq!(&buf[14..18], &14i32.to_le_bytes());
        assert_eq!(&buf[18..21], b"END");
    }

    #[test]
    fn test_serialize_buffer_too_small() {
        let mut buf = [0u8; 10];
        assert_eq!(
            HeliControl::default().serialize(&mut buf),
            Err(SerializeError::BufferTooSmall)
        );
    }

    #[test]
    fn test_telemetry_frame_size() {
        assert_eq!(MAX_FRAME_SIZE, 157);
        assert_eq!(TelemetryBundle::FRAME_SIZE, MAX_FRAME_SIZE);
        assert_eq!(frame_size(MessageType::Ping), 15);
    }

    #[test]
    fn test_decode_frame_checks() {
        let control = PlaneControl {
            roll: 1200,
            pitch: 1300,
            yaw: 1400,
            throttle: 1700,
        };
        let mut buf = [0u8; 32];
        let len = control.serialize(&mut buf).unwrap();
        assert_eq!(decode_frame::<PlaneControl>(&buf[..len]), Ok(control));

        // Wrong payload type for this tag
        assert!(matches!(
            decode_frame::<HeliControl>(&buf[..len]),
            Err(ParseError::Length)
        ));

        let mut bad = buf;
        bad[len - 1] = b'X';
        assert_eq!(decode_frame::<PlaneControl>(&bad[..len]), Err(ParseError::Footer));

        let mut bad = buf;
        bad[len - 7] = 99;
        assert_eq!(decode_frame::<PlaneControl>(&bad[..len]), Err(ParseError::Length));

        let mut bad = buf;
        bad[0] = b'X';
        assert_eq!(decode_frame::<PlaneControl>(&bad[..len]), Err(ParseError::Preamble));
    }

    #[test]
    fn test_message_serialize_dispatches_by_variant() {
        let mut buf = [0u8; 32];
        let len = Message::Ping.serialize(&mut buf).unwrap();
        assert_eq!(len, 15);
        assert_eq!(&buf[4..8], &0i32.to_le_bytes());
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_serialize_to_vec() {
        let vec = TelemetryBundle::default()
            .serialize_to_vec::<MAX_FRAME_SIZE>()
            .unwrap();
        assert_eq!(vec.len(), MAX_FRAME_SIZE);
        assert!(TelemetryBundle::default().serialize_to_vec::<64>().is_err());
    }
}
