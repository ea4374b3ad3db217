//! Host side of the X-Plane HITL bridge.
//!
//! - [`serial`]: serial port [`Transport`](hitl_core::Transport)
//! - [`scanner`]: background device search
//! - [`plugin`]: the owned plugin context driven by the flight loop

pub mod plugin;
pub mod scanner;
pub mod serial;

pub use plugin::{HitlPlugin, FLIGHT_LOOP_EVERY_FRAME};
pub use scanner::{probe_stream, PortScanner, ScanStatus};
pub use serial::{list_ports, SerialError, SerialSettings, SerialTransport, DEFAULT_SERIAL_SETTINGS};
