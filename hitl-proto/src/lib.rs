//! Binary wire protocol between the simulator and a HITL autopilot device.
//!
//! This crate provides everything needed to speak the HITL link protocol:
//!
//! - **Types**: fixed-layout payloads
//!   - [`Message`] - Decoded inbound message (ping, state, plane/heli control)
//!   - [`StateReport`], [`PlaneControl`], [`HeliControl`] - Inbound payloads
//!   - [`TelemetryBundle`] - Outbound sensor bundle sent once per tick
//!
//! - **Parsing**: byte-at-a-time framing of the inbound stream
//!   - [`FrameParser`] - Accumulates bytes and yields validated messages
//!   - [`decode_frame()`] - Validate and decode one complete frame
//!
//! - **Serialization**: framing of outgoing payloads
//!   - [`Serialize`] trait - Wraps any payload into a complete frame
//!
//! # Protocol Format
//!
//! ```text
//! HITL <type:i32> <payload> <length:i32> END
//! ```
//!
//! - `HITL` - 4-byte preamble
//! - `type` - message type tag, little-endian
//! - `payload` - packed fields, size fixed per type, little-endian
//! - `length` - header plus payload size in bytes
//! - `END` - 3-byte marker
//!
//! Type tag 0 is the telemetry bundle when sent by the simulator and a ping
//! when sent by the device. Control axes are PWM values in
//! [`PWM_MIN`]..=[`PWM_MAX`].
//!
//! # Example
//!
//! ```
//! use hitl_proto::{FrameParser, Message, PlaneControl, Serialize};
//!
//! let control = PlaneControl { roll: 1500, pitch: 1400, yaw: 1500, throttle: 1800 };
//! let mut buf = [0u8; 32];
//! let len = control.serialize(&mut buf).unwrap();
//!
//! let mut parser = FrameParser::new();
//! let decoded: Vec<Message> = buf[..len].iter().filter_map(|&b| parser.push_byte(b)).collect();
//! assert_eq!(decoded, [Message::PlaneControl(control)]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host builds)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `serialize_to_vec()`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod parser;
pub mod serialize;
pub mod types;
pub mod wire;

// Re-export types at crate root for convenience
pub use parser::{FrameParser, FrameStats, ParseError};
pub use serialize::{
    decode_frame, frame_size, Serialize, SerializeError, WireFormat, FOOTER_MARKER, FOOTER_SIZE,
    HEADER_SIZE, MAX_FRAME_SIZE, PREAMBLE,
};
pub use types::{
    AirspeedData, ArmState, BaroData, EfiData, GpsData, HeliControl, InsData, MagData, Message,
    MessageType, Ping, PlaneControl, StarterStatus, StateReport, TelemetryBundle, PWM_CENTER,
    PWM_MAX, PWM_MIN, TELEMETRY_TYPE_TAG,
};
