//! Bridge configuration.
//!
//! Values the device cannot get from the simulator (fixed sensor readings,
//! GPS quality figures) and the calibration animation tuning.

use nalgebra::Vector3;

/// Fixed values filled into the outbound telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryConfig {
    /// IMU die temperature in °C.
    pub ins_temperature_c: f32,
    /// Earth field in NED, rotated into the body frame for the magnetometer.
    pub mag_field_ned: [f32; 3],
    /// GPS fix type (3 = 3D fix).
    pub gps_fix_type: u8,
    pub satellites: u8,
    /// Horizontal, vertical and speed accuracy in meters.
    pub gps_accuracy_m: f32,
    /// HDOP and VDOP.
    pub gps_dop: f32,
    /// Send engine data when the aircraft has an engine.
    pub efi_enabled: bool,
}

impl TelemetryConfig {
    #[must_use]
    pub fn mag_field(&self) -> Vector3<f32> {
        Vector3::from(self.mag_field_ned)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.telemetry
    }
}

/// Calibration animation tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    /// Seconds to move between two poses.
    pub transition_s: f32,
    /// Yaw rate of the continuous rotation, deg/s.
    pub rotation_rate_dps: f32,
    /// Height added above the aircraft's half-extent, meters.
    pub clearance_m: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.calibration
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BridgeConfig {
    pub telemetry: TelemetryConfig,
    pub calibration: CalibrationConfig,
}

/// Default configuration.
pub const DEFAULT_CONFIG: BridgeConfig = BridgeConfig {
    telemetry: TelemetryConfig {
        ins_temperature_c: 25.0,
        mag_field_ned: [400.0, 0.0, 0.0],
        gps_fix_type: 3,
        satellites: 10,
        gps_accuracy_m: 1.0,
        gps_dop: 1.0,
        efi_enabled: true,
    },
    calibration: CalibrationConfig {
        transition_s: 1.0,
        rotation_rate_dps: 30.0,
        clearance_m: 1.0,
    },
};
