//! Per-tick vehicle state read from the simulator.

use nalgebra::{UnitQuaternion, Vector3};

use crate::convert::quat_from_sim;
use crate::datarefs as dr;
use crate::sim::SimData;

/// Engine 1 readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSnapshot {
    pub rpm: f32,
    /// Throttle lever, 0..1.
    pub throttle_ratio: f32,
    pub fuel_flow_kg_s: f32,
    pub egt_c: f32,
}

/// Physical state of the aircraft, in simulator units.
///
/// Replaced wholesale every tick, never updated field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    /// Load factors along the body axes (axial, side, normal).
    pub accel_g: Vector3<f32>,
    /// Body rates P, Q, R in deg/s.
    pub gyro_dps: Vector3<f32>,
    pub attitude: UnitQuaternion<f32>,
    pub pressure_inhg: f32,
    pub temperature_c: f32,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above mean sea level.
    pub elevation_m: f64,
    /// Velocity in the local frame (x east, y up, z south), m/s.
    pub local_velocity: Vector3<f32>,
    pub dynamic_pressure_psf: f32,
    /// `None` when the aircraft has no engines.
    pub engine: Option<EngineSnapshot>,
}

impl Default for VehicleSnapshot {
    fn default() -> Self {
        Self {
            accel_g: Vector3::zeros(),
            gyro_dps: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            pressure_inhg: 0.0,
            temperature_c: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            elevation_m: 0.0,
            local_velocity: Vector3::zeros(),
            dynamic_pressure_psf: 0.0,
            engine: None,
        }
    }
}

impl VehicleSnapshot {
    /// Read the current state from the simulator.
    pub fn read(sim: &impl SimData) -> Self {
        let mut q = [0f32; 4];
        sim.get_f32_array(dr::ATTITUDE_Q, 0, &mut q);

        let engine = (sim.get_i32(dr::NUM_ENGINES) > 0).then(|| EngineSnapshot {
            rpm: first(sim, dr::ENGINE_RPM),
            throttle_ratio: first(sim, dr::THROTTLE_RATIO),
            fuel_flow_kg_s: first(sim, dr::FUEL_FLOW_KG_SEC),
            egt_c: first(sim, dr::EGT_DEG_C),
        });

        Self {
            accel_g: read_vec3(sim, [dr::G_AXIAL, dr::G_SIDE, dr::G_NORMAL]),
            gyro_dps: read_vec3(sim, [dr::ROLL_RATE_P, dr::PITCH_RATE_Q, dr::YAW_RATE_R]),
            attitude: quat_from_sim(q),
            pressure_inhg: sim.get_f32(dr::BAROMETER_INHG),
            temperature_c: sim.get_f32(dr::TEMPERATURE_C),
            latitude: sim.get_f64(dr::LATITUDE),
            longitude: sim.get_f64(dr::LONGITUDE),
            elevation_m: sim.get_f64(dr::ELEVATION_M),
            local_velocity: read_vec3(sim, [dr::LOCAL_VX, dr::LOCAL_VY, dr::LOCAL_VZ]),
            dynamic_pressure_psf: sim.get_f32(dr::DYNAMIC_PRESSURE_PSF),
            engine,
        }
    }
}

fn read_vec3(sim: &impl SimData, names: [&str; 3]) -> Vector3<f32> {
    Vector3::new(
        sim.get_f32(names[0]),
        sim.get_f32(names[1]),
        sim.get_f32(names[2]),
    )
}

fn first(sim: &impl SimData, name: &str) -> f32 {
    let mut out = [0f32; 1];
    sim.get_f32_array(name, 0, &mut out);
    out[0]
}
