//! Simulator-agnostic core of the X-Plane HITL bridge.
//!
//! This crate holds everything between the wire protocol and the host SDK.
//! It talks to the simulator only through the [`SimData`], [`SimCommands`]
//! and [`StatusDisplay`] traits, and to the device only through
//! [`Transport`], so all of it runs under test on the host.
//!
//! # Overview
//!
//! - [`convert`]: unit and frame conversions, quaternion helpers
//! - [`snapshot`]: one tick's worth of simulator state ([`VehicleSnapshot`])
//! - [`telemetry`]: snapshot to outbound sensor frame ([`TelemetryEncoder`])
//! - [`remote`]: inbound messages to simulator writes ([`RemoteControl`])
//! - [`calibration`]: scripted attitude sequence ([`Calibration`])
//! - [`bridge`]: per-tick orchestration ([`HitlBridge`])
//!
//! # Tick Order
//!
//! 1. Drain received bytes, apply every decoded message
//! 2. Advance the calibration animation
//! 3. Read a snapshot and send one telemetry frame

pub mod bridge;
pub mod calibration;
pub mod config;
pub mod convert;
pub mod datarefs;
pub mod remote;
pub mod sim;
pub mod snapshot;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use bridge::{BridgeError, HitlBridge};
pub use calibration::{Calibration, CalibrationStep, Phase, Pose, SavedState};
pub use config::{BridgeConfig, CalibrationConfig, TelemetryConfig, DEFAULT_CONFIG};
pub use remote::RemoteControl;
pub use sim::{SimCommands, SimData, StatusDisplay, StatusLabel};
pub use snapshot::{EngineSnapshot, VehicleSnapshot};
pub use telemetry::{TelemetryEncoder, TelemetryFrame};
pub use transport::{Transport, TransportError};
