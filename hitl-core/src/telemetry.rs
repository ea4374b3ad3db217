//! Outbound telemetry: vehicle snapshot to the device's sensor bundle.

use heapless::Vec;
use hitl_proto::{
    AirspeedData, BaroData, EfiData, GpsData, InsData, MagData, Serialize, SerializeError,
    TelemetryBundle, MAX_FRAME_SIZE,
};
use nalgebra::Vector3;

use crate::config::TelemetryConfig;
use crate::convert::{
    local_to_ned, quat_to_sim, DEG_E7, GRAVITY_MSS, INHG_TO_PA, M_TO_CM, PSF_TO_PA,
};
use crate::snapshot::VehicleSnapshot;

/// GPS week value meaning "unknown".
pub const GPS_WEEK_UNKNOWN: u16 = 0xFFFF;

/// Fuel density used for the volumetric flow conversion, kg/L.
pub const FUEL_DENSITY_KG_PER_L: f32 = 0.72;

/// One encoded telemetry frame.
pub type TelemetryFrame = Vec<u8, MAX_FRAME_SIZE>;

/// Builds the telemetry bundle sent to the device once per tick.
#[derive(Debug, Clone, Default)]
pub struct TelemetryEncoder {
    config: TelemetryConfig,
}

impl TelemetryEncoder {
    #[must_use]
    pub fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Convert a snapshot into wire units.
    ///
    /// While `calibrating`, the airframe is held still and the live load
    /// factors are meaningless, so the accelerometer reports gravity rotated
    /// into the current attitude instead.
    #[must_use]
    pub fn build(&self, snap: &VehicleSnapshot, calibrating: bool) -> TelemetryBundle {
        let q = snap.attitude;
        let accel = if calibrating {
            q.inverse_transform_vector(&Vector3::new(0.0, 0.0, -GRAVITY_MSS))
        } else {
            -snap.accel_g * GRAVITY_MSS
        };
        let gyro = snap.gyro_dps.map(f32::to_radians);
        let mag = q.inverse_transform_vector(&self.config.mag_field());
        let ned = local_to_ned(snap.local_velocity);

        let gps = GpsData {
            gps_week: GPS_WEEK_UNKNOWN,
            // No GPS week, so no time of week either
            ms_tow: 0,
            fix_type: self.config.gps_fix_type,
            satellites_in_view: self.config.satellites,
            horizontal_pos_accuracy: self.config.gps_accuracy_m,
            vertical_pos_accuracy: self.config.gps_accuracy_m,
            horizontal_vel_accuracy: self.config.gps_accuracy_m,
            hdop: self.config.gps_dop,
            vdop: self.config.gps_dop,
            longitude: (snap.longitude * DEG_E7).round() as i32,
            latitude: (snap.latitude * DEG_E7).round() as i32,
            msl_altitude: (snap.elevation_m * M_TO_CM).round() as i32,
            ned_vel_north: ned.x,
            ned_vel_east: ned.y,
            ned_vel_down: ned.z,
        };

        let efi = match snap.engine {
            Some(engine) if self.config.efi_enabled => EfiData {
                present: true,
                rpm: engine.rpm,
                throttle_position_percent: engine.throttle_ratio * 100.0,
                fuel_consumption_cm3_per_min: engine.fuel_flow_kg_s / FUEL_DENSITY_KG_PER_L
                    * 60_000.0,
                exhaust_gas_temperature_c: engine.egt_c,
            },
            _ => EfiData::default(),
        };

        TelemetryBundle {
            baro: BaroData {
                instance: 0,
                pressure_pa: snap.pressure_inhg * INHG_TO_PA,
                temperature_c: snap.temperature_c,
            },
            mag: MagData { field: mag.into() },
            gps,
            ins: InsData {
                accel: accel.into(),
                gyro: gyro.into(),
                temperature_c: self.config.ins_temperature_c,
            },
            airspeed: AirspeedData {
                differential_pressure_pa: snap.dynamic_pressure_psf * PSF_TO_PA,
                temperature_c: snap.temperature_c,
            },
            efi,
            attitude: quat_to_sim(&q),
        }
    }

    /// Build and frame the bundle.
    ///
    /// # Errors
    ///
    /// Only fails if the frame does not fit [`MAX_FRAME_SIZE`], which the
    /// bundle layout rules out.
    pub fn encode(
        &self,
        snap: &VehicleSnapshot,
        calibrating: bool,
    ) -> Result<TelemetryFrame, SerializeError> {
        self.build(snap, calibrating).serialize_to_vec()
    }
}
