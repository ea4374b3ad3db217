//! Byte-stream frame parser for inbound HITL messages.
//!
//! The parser is fed one byte at a time from the serial link and yields a
//! decoded [`Message`] whenever a complete, validated frame has been seen.
//! Malformed frames never surface as errors: the accumulated bytes are
//! discarded and framing restarts with the next byte.

use crate::serialize::{
    check_footer, WireFormat, FOOTER_SIZE, HEADER_SIZE, MAX_FRAME_SIZE, PREAMBLE,
};
use crate::types::{HeliControl, Message, MessageType, PlaneControl, StateReport};
use crate::wire::WireReader;

/// Error type for frame validation and payload decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The header carries a tag outside the known message types.
    UnknownType(i32),
    /// Payload or declared frame length does not match the message type.
    Length,
    /// Preamble bytes do not match.
    Preamble,
    /// Footer marker does not match.
    Footer,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownType(tag) => write!(f, "unknown message type {tag}"),
            Self::Length => write!(f, "length mismatch"),
            Self::Preamble => write!(f, "bad preamble"),
            Self::Footer => write!(f, "bad footer marker"),
        }
    }
}

impl Message {
    /// Decode a payload for the given message type.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Length`] if `payload` is not exactly the size of
    /// the type's layout.
    pub fn decode(message_type: MessageType, payload: &[u8]) -> Result<Self, ParseError> {
        if payload.len() != message_type.payload_size() {
            return Err(ParseError::Length);
        }
        let mut r = WireReader::new(payload);
        Ok(match message_type {
            MessageType::Ping => Self::Ping,
            MessageType::State => Self::State(StateReport::read_from(&mut r)),
            MessageType::PlaneControl => Self::PlaneControl(PlaneControl::read_from(&mut r)),
            MessageType::HeliControl => Self::HeliControl(HeliControl::read_from(&mut r)),
        })
    }
}

/// Frame counters kept by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Frames decoded and delivered.
    pub frames: u32,
    /// Frames rejected after a complete preamble (bad tag, length or marker).
    pub dropped: u32,
}

/// HITL frame parser.
///
/// Holds a fixed receive buffer and a cursor that always points at the next
/// free slot. Any validation failure resets the cursor to zero, discarding
/// everything accumulated so far; the offending byte is not re-examined as a
/// possible frame start.
pub struct FrameParser {
    buffer: [u8; MAX_FRAME_SIZE],
    pos: usize,
    msg_type: Option<MessageType>,
    stats: FrameStats,
}

impl FrameParser {
    /// Create a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_FRAME_SIZE],
            pos: 0,
            msg_type: None,
            stats: FrameStats {
                frames: 0,
                dropped: 0,
            },
        }
    }

    /// Reset parser state, discarding any partial frame.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.msg_type = None;
    }

    /// Number of bytes of the current partial frame.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pos
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Feed a byte to the parser.
    ///
    /// Returns `Some(message)` if this byte completed a valid frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<Message> {
        if self.pos >= MAX_FRAME_SIZE {
            self.reset();
        }
        self.buffer[self.pos] = byte;
        self.pos += 1;

        if self.pos <= PREAMBLE.len() {
            if byte != PREAMBLE[self.pos - 1] {
                self.reset();
            }
            return None;
        }

        if self.pos == HEADER_SIZE {
            let tag = i32::from_le_bytes([
                self.buffer[4],
                self.buffer[5],
                self.buffer[6],
                self.buffer[7],
            ]);
            self.msg_type = MessageType::from_tag(tag);
            if self.msg_type.is_none() {
                self.drop_frame();
            }
            return None;
        }

        let Some(msg_type) = self.msg_type else {
            // Only reachable mid-header
            return None;
        };

        let payload_end = HEADER_SIZE + msg_type.payload_size();
        if self.pos < payload_end + FOOTER_SIZE {
            return None;
        }

        let result = check_footer(&self.buffer[payload_end..self.pos], payload_end)
            .and_then(|()| Message::decode(msg_type, &self.buffer[HEADER_SIZE..payload_end]));

        match result {
            Ok(message) => {
                self.stats.frames = self.stats.frames.wrapping_add(1);
                self.reset();
                Some(message)
            }
            Err(_) => {
                self.drop_frame();
                None
            }
        }
    }

    fn drop_frame(&mut self) {
        self.stats.dropped = self.stats.dropped.wrapping_add(1);
        self.reset();
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::serialize::Serialize;
    use crate::types::{ArmState, StarterStatus};

    fn frame<P: Serialize>(payload: &P) -> Vec<u8> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = payload.serialize(&mut buf).unwrap();
        buf[..len].to_vec()
    }

    fn feed(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Message> {
        bytes.iter().filter_map(|&b| parser.push_byte(b)).collect()
    }

    fn plane() -> PlaneControl {
        PlaneControl {
            roll: 1500,
            pitch: 1250,
            yaw: 1750,
            throttle: 1600,
        }
    }

    fn armed() -> StateReport {
        StateReport {
            arm: ArmState::Armed,
            ahrs_count: 400,
            starter: StarterStatus::Idle,
        }
    }

    #[test]
    fn test_parser_ignores_noise() {
        let mut parser = FrameParser::new();
        assert!(parser.push_byte(0x00).is_none());
        assert!(parser.push_byte(0x42).is_none());
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn test_valid_frame_dispatches_once() {
        let mut parser = FrameParser::new();
        let bytes = frame(&plane());

        let mut delivered = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            if let Some(msg) = parser.push_byte(b) {
                delivered.push((i, msg));
            }
        }
        assert_eq!(delivered, [(bytes.len() - 1, Message::PlaneControl(plane()))]);
        assert_eq!(parser.pending(), 0);
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_same_frame_twice_dispatches_twice() {
        let mut parser = FrameParser::new();
        let mut bytes = frame(&armed());
        bytes.extend(frame(&armed()));

        let msgs = feed(&mut parser, &bytes);
        assert_eq!(msgs, [Message::State(armed()), Message::State(armed())]);
    }

    #[test]
    fn test_ping_frame() {
        let mut parser = FrameParser::new();
        let msgs = feed(&mut parser, &frame(&crate::types::Ping));
        assert_eq!(msgs, [Message::Ping]);
    }

    #[test]
    fn test_corrupt_preamble_recovers_on_next_frame() {
        let good = frame(&plane());
        for i in 0..PREAMBLE.len() {
            let mut parser = FrameParser::new();
            let mut bytes = good.clone();
            bytes[i] = b'x';
            bytes.extend(&good);

            let msgs = feed(&mut parser, &bytes);
            assert_eq!(msgs, [Message::PlaneControl(plane())], "corrupt byte {i}");
        }
    }

    #[test]
    fn test_corrupt_footer_drops_frame() {
        let good = frame(&armed());
        let len = good.len();
        // Declared length bytes, then marker bytes
        for i in (len - FOOTER_SIZE)..len {
            let mut parser = FrameParser::new();
            let mut bytes = good.clone();
            bytes[i] ^= 0x20;
            bytes.extend(&good);

            let msgs = feed(&mut parser, &bytes);
            assert_eq!(msgs, [Message::State(armed())], "corrupt byte {i}");
            assert_eq!(parser.stats(), FrameStats { frames: 1, dropped: 1 });
        }
    }

    #[test]
    fn test_unknown_tag_resets() {
        let mut parser = FrameParser::new();
        let mut bytes = Vec::from(PREAMBLE);
        bytes.extend(7i32.to_le_bytes());
        assert!(feed(&mut parser, &bytes).is_empty());
        assert_eq!(parser.pending(), 0);
        assert_eq!(parser.stats().dropped, 1);

        let msgs = feed(&mut parser, &frame(&plane()));
        assert_eq!(msgs, [Message::PlaneControl(plane())]);
    }

    #[test]
    fn test_repeated_preamble_byte_loses_frame() {
        // "HHITL...": the second 'H' fails the match and is discarded with the
        // first, so the frame that follows it is not recognised.
        let mut parser = FrameParser::new();
        let mut bytes = Vec::from([b'H']);
        bytes.extend(frame(&plane()));
        assert!(feed(&mut parser, &bytes).is_empty());
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            Message::decode(MessageType::State, &[1, 2, 3]),
            Err(ParseError::Length)
        );
        assert_eq!(Message::decode(MessageType::Ping, &[]), Ok(Message::Ping));
    }
}
