//! Unit and coordinate conversions between simulator and autopilot conventions.
//!
//! The simulator works in feet, inches of mercury, degrees and a local
//! OpenGL frame (x east, y up, z south). The autopilot expects SI units,
//! radians and NED. Attitude uses the aerospace Z-Y-X Euler convention on
//! both ends with no heading offset.

use core::ops::{Add, Div, Mul, Sub};

use hitl_proto::{PWM_MAX, PWM_MIN};
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// Standard gravity in m/s².
pub const GRAVITY_MSS: f32 = 9.80665;

/// Pascals per inch of mercury.
pub const INHG_TO_PA: f32 = 3386.38867;

/// Pascals per pound-force per square foot.
pub const PSF_TO_PA: f32 = 47.880_26;

/// Scale from degrees to the GPS integer representation.
pub const DEG_E7: f64 = 1e7;

/// Centimeters per meter.
pub const M_TO_CM: f64 = 100.0;

/// Distance kept between a commanded pitch and ±90°.
pub const SINGULAR_PITCH_EPSILON_DEG: f32 = 0.05;

/// Linearly map `value` from the range `from` onto the range `to`.
///
/// `from.0 == from.1` divides by zero; callers pass distinct bounds.
#[inline]
#[must_use]
pub fn map_range<T>(from: (T, T), to: (T, T), value: T) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T>,
{
    // Scale before dividing so integer ranges do not truncate to zero
    to.0 + (value - from.0) * (to.1 - to.0) / (from.1 - from.0)
}

/// Map a PWM value onto `to`, clamping out-of-range pulses first.
#[inline]
#[must_use]
pub fn pwm_to_range(pwm: u16, to: (f32, f32)) -> f32 {
    let pwm = pwm.clamp(PWM_MIN, PWM_MAX);
    map_range(
        (f32::from(PWM_MIN), f32::from(PWM_MAX)),
        to,
        f32::from(pwm),
    )
}

/// Body-frame angular velocity in deg/s between two attitudes `dt` seconds apart.
///
/// Finite difference of `q1⁻¹ · q2`. The pair is sign aligned first so a
/// quaternion flipping hemisphere does not read as a full turn. Returns zero
/// for a non-positive `dt`.
#[must_use]
pub fn angular_velocity(q1: &UnitQuaternion<f32>, q2: &UnitQuaternion<f32>, dt: f32) -> Vector3<f32> {
    if dt <= 0.0 {
        return Vector3::zeros();
    }
    let a = q1.quaternion();
    let mut b = *q2.quaternion();
    if a.coords.dot(&b.coords) < 0.0 {
        b = -b;
    }
    let v = Vector3::new(
        a.w * b.i - a.i * b.w - a.j * b.k + a.k * b.j,
        a.w * b.j + a.i * b.k - a.j * b.w - a.k * b.i,
        a.w * b.k - a.i * b.j + a.j * b.i - a.k * b.w,
    );
    (v * (2.0 / dt)).map(f32::to_degrees)
}

/// Attitude quaternion from roll, pitch and heading in degrees.
///
/// Pitch within [`SINGULAR_PITCH_EPSILON_DEG`] of ±90° is pulled back to keep
/// the decomposition in [`quat_to_euler`] well defined.
#[must_use]
pub fn euler_to_quat(euler_deg: Vector3<f32>) -> UnitQuaternion<f32> {
    let limit = 90.0 - SINGULAR_PITCH_EPSILON_DEG;
    let pitch = euler_deg.y.clamp(-limit, limit);
    UnitQuaternion::from_euler_angles(
        euler_deg.x.to_radians(),
        pitch.to_radians(),
        euler_deg.z.to_radians(),
    )
}

/// Roll, pitch and heading in degrees. Heading is wrapped to [0, 360).
#[must_use]
pub fn quat_to_euler(q: &UnitQuaternion<f32>) -> Vector3<f32> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(
        roll.to_degrees(),
        pitch.to_degrees(),
        wrap_degrees(yaw.to_degrees()),
    )
}

/// Wrap an angle in degrees to [0, 360).
#[inline]
#[must_use]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Simulator local velocity (x east, y up, z south) to NED.
#[inline]
#[must_use]
pub fn local_to_ned(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(-v.z, v.x, -v.y)
}

/// Quadratic ease-in-out on `t` in [0, 1].
#[inline]
#[must_use]
pub fn ease_quad_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u / 2.0
    }
}

/// Unit quaternion from the simulator's `[w, x, y, z]` array.
///
/// A degenerate (zero) array, as read before the flight model runs, maps to
/// identity.
#[must_use]
pub fn quat_from_sim(q: [f32; 4]) -> UnitQuaternion<f32> {
    Unit::try_new(Quaternion::new(q[0], q[1], q[2], q[3]), f32::EPSILON)
        .unwrap_or_else(UnitQuaternion::identity)
}

/// Simulator `[w, x, y, z]` array from a unit quaternion.
#[inline]
#[must_use]
pub fn quat_to_sim(q: &UnitQuaternion<f32>) -> [f32; 4] {
    [q.w, q.i, q.j, q.k]
}
