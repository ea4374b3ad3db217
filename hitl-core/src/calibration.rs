//! Accelerometer calibration animation.
//!
//! While active, the flight model is suspended and the aircraft is lifted and
//! moved through the six poses of an accelerometer calibration. Every
//! transition is eased over a fixed duration, position linearly and attitude
//! by slerp. Velocities and body rates are synthesized from the motion so the
//! device sees a consistent picture.
//!
//! ```text
//!            toggle                      toggle
//! Inactive ─────────► Animating(step) ─────────► Returning ──(duration)──► Inactive
//!                       │  ▲   next / previous
//!                       └──┘   toggle_rotation
//! ```

use log::{debug, info};
use nalgebra::{UnitQuaternion, Vector3};

use crate::config::CalibrationConfig;
use crate::convert::{
    angular_velocity, ease_quad_in_out, euler_to_quat, quat_from_sim, quat_to_euler, quat_to_sim,
};
use crate::datarefs as dr;
use crate::sim::SimData;

/// Calibration poses, in the order the autopilot asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    Level,
    LeftSide,
    RightSide,
    NoseDown,
    NoseUp,
    Back,
}

impl CalibrationStep {
    pub const ALL: [Self; 6] = [
        Self::Level,
        Self::LeftSide,
        Self::RightSide,
        Self::NoseDown,
        Self::NoseUp,
        Self::Back,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Level => "Level",
            Self::LeftSide => "Left side",
            Self::RightSide => "Right side",
            Self::NoseDown => "Nose down",
            Self::NoseUp => "Nose up",
            Self::Back => "Back",
        }
    }

    /// Roll and pitch of the pose in degrees. Heading is kept from the
    /// saved attitude.
    #[must_use]
    pub const fn roll_pitch(self) -> (f32, f32) {
        match self {
            Self::Level => (0.0, 0.0),
            Self::LeftSide => (-90.0, 0.0),
            Self::RightSide => (90.0, 0.0),
            Self::NoseDown => (0.0, -90.0),
            Self::NoseUp => (0.0, 90.0),
            Self::Back => (180.0, 0.0),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// Next pose, wrapping after the last.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous pose, wrapping before the first.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Where the state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inactive,
    Animating(CalibrationStep),
    /// Moving back to the saved pose; physics resumes on arrival.
    Returning,
}

/// Position in the local frame and attitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub attitude: UnitQuaternion<f32>,
}

/// Simulator state captured when calibration starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedState {
    pub position: Vector3<f64>,
    /// Simulator quaternion as read, `[w, x, y, z]`.
    pub attitude: [f32; 4],
    /// Roll, pitch, heading in degrees as read.
    pub euler: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// P, Q, R in deg/s.
    pub rates: Vector3<f32>,
    /// Height the poses are lifted by, meters.
    pub lift: f64,
}

impl SavedState {
    fn read(sim: &impl SimData, clearance_m: f64) -> Self {
        let mut q = [0f32; 4];
        sim.get_f32_array(dr::ATTITUDE_Q, 0, &mut q);
        let size = f64::from(sim.get_f32(dr::SIZE_X_M).max(sim.get_f32(dr::SIZE_Z_M)));
        Self {
            position: Vector3::new(
                sim.get_f64(dr::LOCAL_X),
                sim.get_f64(dr::LOCAL_Y),
                sim.get_f64(dr::LOCAL_Z),
            ),
            attitude: q,
            euler: Vector3::new(
                sim.get_f32(dr::ROLL_DEG),
                sim.get_f32(dr::PITCH_DEG),
                sim.get_f32(dr::HEADING_DEG),
            ),
            velocity: Vector3::new(
                sim.get_f32(dr::LOCAL_VX),
                sim.get_f32(dr::LOCAL_VY),
                sim.get_f32(dr::LOCAL_VZ),
            ),
            rates: Vector3::new(
                sim.get_f32(dr::ROLL_RATE_P),
                sim.get_f32(dr::PITCH_RATE_Q),
                sim.get_f32(dr::YAW_RATE_R),
            ),
            lift: size + clearance_m,
        }
    }

    fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            attitude: quat_from_sim(self.attitude),
        }
    }
}

/// Calibration animation state machine.
#[derive(Debug, Clone)]
pub struct Calibration {
    config: CalibrationConfig,
    phase: Phase,
    rotating: bool,
    /// Seconds into the current transition, at most the transition time.
    elapsed: f32,
    /// Continuous yaw added on top of the target, wrapped to [0, 360).
    spin_deg: f32,
    start: Pose,
    target: Pose,
    last: Pose,
    saved: Option<SavedState>,
}

impl Calibration {
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        let rest = Pose {
            position: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
        };
        Self {
            config,
            phase: Phase::Inactive,
            rotating: false,
            elapsed: 0.0,
            spin_deg: 0.0,
            start: rest,
            target: rest,
            last: rest,
            saved: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True from the first toggle until the aircraft is back and released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Inactive
    }

    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    /// Destination of the current transition.
    #[must_use]
    pub fn target(&self) -> &Pose {
        &self.target
    }

    #[must_use]
    pub fn saved(&self) -> Option<&SavedState> {
        self.saved.as_ref()
    }

    /// Status text for the UI.
    #[must_use]
    pub fn label(&self) -> String {
        match self.phase {
            Phase::Inactive => "Off".to_string(),
            Phase::Animating(step) if self.rotating => format!("{} (rotating)", step.name()),
            Phase::Animating(step) => step.name().to_string(),
            Phase::Returning => "Returning".to_string(),
        }
    }

    /// Start calibration, or head back to the saved pose if already running.
    ///
    /// Toggling again while returning restarts the return from the current
    /// pose.
    pub fn toggle<S: SimData>(&mut self, sim: &mut S) {
        match self.phase {
            Phase::Inactive => self.enter(sim),
            Phase::Animating(_) | Phase::Returning => {
                info!("calibration: returning to saved pose");
                self.rotating = false;
                self.phase = Phase::Returning;
                if let Some(saved) = self.saved {
                    self.begin_transition(saved.pose());
                }
            }
        }
    }

    /// Advance to the next pose. Ignored unless animating.
    pub fn next(&mut self) {
        if let Phase::Animating(step) = self.phase {
            self.go_to(step.next());
        }
    }

    /// Go back to the previous pose. Ignored unless animating.
    pub fn previous(&mut self) {
        if let Phase::Animating(step) = self.phase {
            self.go_to(step.previous());
        }
    }

    /// Toggle continuous yaw rotation. Ignored unless animating.
    ///
    /// Turning rotation off eases back to the current pose's heading.
    pub fn toggle_rotation(&mut self) {
        if let Phase::Animating(step) = self.phase {
            self.rotating = !self.rotating;
            debug!("calibration: rotation {}", self.rotating);
            if !self.rotating {
                self.go_to(step);
            }
        }
    }

    /// Advance the animation by `dt` seconds and write the pose.
    pub fn tick<S: SimData>(&mut self, dt: f32, sim: &mut S) {
        if self.phase == Phase::Inactive || dt <= 0.0 {
            return;
        }
        let duration = self.config.transition_s;

        if self.rotating {
            let spin_dt = (self.elapsed + dt - duration).clamp(0.0, dt);
            self.spin_deg =
                (self.spin_deg + self.config.rotation_rate_dps * spin_dt).rem_euclid(360.0);
        }
        self.elapsed = (self.elapsed + dt).min(duration);

        let t = ease_quad_in_out(self.elapsed / duration);
        let position = self.start.position.lerp(&self.target.position, f64::from(t));
        let mut attitude = self
            .start
            .attitude
            .try_slerp(&self.target.attitude, t, f32::EPSILON)
            .unwrap_or(self.target.attitude);

        if self.rotating {
            let yaw = self.spin_deg.to_radians();
            attitude *= UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
        }

        let velocity = ((position - self.last.position) / f64::from(dt)).cast::<f32>();
        let rates = angular_velocity(&self.last.attitude, &attitude, dt);
        write_pose(sim, &position, &attitude, &velocity, &rates);
        self.last = Pose { position, attitude };

        if self.phase == Phase::Returning && self.elapsed >= duration {
            self.finish(sim);
        }
    }

    fn enter<S: SimData>(&mut self, sim: &mut S) {
        let saved = SavedState::read(sim, self.config.clearance_m);
        info!(
            "calibration: start at ({:.1}, {:.1}, {:.1}), lift {:.1} m",
            saved.position.x, saved.position.y, saved.position.z, saved.lift
        );
        self.saved = Some(saved);
        self.last = saved.pose();
        self.rotating = false;
        self.go_to(CalibrationStep::Level);

        sim.set_i32_array(dr::OVERRIDE_PLANEPATH, 0, &[1]);
        write_motion(sim, &Vector3::zeros(), &Vector3::zeros());
    }

    fn go_to(&mut self, step: CalibrationStep) {
        let Some(saved) = self.saved else {
            return;
        };
        debug!("calibration: {}", step.name());
        let (roll, pitch) = step.roll_pitch();
        let target = Pose {
            position: saved.position + Vector3::new(0.0, saved.lift, 0.0),
            attitude: euler_to_quat(Vector3::new(roll, pitch, saved.euler.z)),
        };
        self.phase = Phase::Animating(step);
        self.begin_transition(target);
    }

    fn begin_transition(&mut self, target: Pose) {
        self.start = self.last;
        self.target = target;
        self.elapsed = 0.0;
        self.spin_deg = 0.0;
    }

    /// Restore the saved state verbatim and hand the aircraft back to physics.
    fn finish<S: SimData>(&mut self, sim: &mut S) {
        if let Some(saved) = self.saved.take() {
            sim.set_f64(dr::LOCAL_X, saved.position.x);
            sim.set_f64(dr::LOCAL_Y, saved.position.y);
            sim.set_f64(dr::LOCAL_Z, saved.position.z);
            sim.set_f32_array(dr::ATTITUDE_Q, 0, &saved.attitude);
            sim.set_f32(dr::ROLL_DEG, saved.euler.x);
            sim.set_f32(dr::PITCH_DEG, saved.euler.y);
            sim.set_f32(dr::HEADING_DEG, saved.euler.z);
            write_motion(sim, &saved.velocity, &saved.rates);
        }
        sim.set_i32_array(dr::OVERRIDE_PLANEPATH, 0, &[0]);
        self.phase = Phase::Inactive;
        info!("calibration: done");
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

fn write_pose<S: SimData>(
    sim: &mut S,
    position: &Vector3<f64>,
    attitude: &UnitQuaternion<f32>,
    velocity: &Vector3<f32>,
    rates: &Vector3<f32>,
) {
    sim.set_f64(dr::LOCAL_X, position.x);
    sim.set_f64(dr::LOCAL_Y, position.y);
    sim.set_f64(dr::LOCAL_Z, position.z);
    sim.set_f32_array(dr::ATTITUDE_Q, 0, &quat_to_sim(attitude));
    let euler = quat_to_euler(attitude);
    sim.set_f32(dr::ROLL_DEG, euler.x);
    sim.set_f32(dr::PITCH_DEG, euler.y);
    sim.set_f32(dr::HEADING_DEG, euler.z);
    write_motion(sim, velocity, rates);
}

fn write_motion<S: SimData>(sim: &mut S, velocity: &Vector3<f32>, rates: &Vector3<f32>) {
    sim.set_f32(dr::LOCAL_VX, velocity.x);
    sim.set_f32(dr::LOCAL_VY, velocity.y);
    sim.set_f32(dr::LOCAL_VZ, velocity.z);
    sim.set_f32(dr::ROLL_RATE_P, rates.x);
    sim.set_f32(dr::PITCH_RATE_Q, rates.y);
    sim.set_f32(dr::YAW_RATE_R, rates.z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSim;

    const HEADING: f32 = 90.0;

    fn parked_sim() -> MockSim {
        let mut sim = MockSim::new();
        sim.set_f64(dr::LOCAL_X, 100.0);
        sim.set_f64(dr::LOCAL_Y, 50.0);
        sim.set_f64(dr::LOCAL_Z, -200.0);
        sim.set_f32(dr::LOCAL_VX, 1.5);
        sim.set_f32(dr::LOCAL_VY, -0.25);
        sim.set_f32(dr::LOCAL_VZ, 3.0);
        sim.set_f32(dr::ROLL_RATE_P, 0.5);
        sim.set_f32(dr::PITCH_RATE_Q, -0.5);
        sim.set_f32(dr::YAW_RATE_R, 2.0);
        sim.set_f32(dr::ROLL_DEG, 1.0);
        sim.set_f32(dr::PITCH_DEG, 2.0);
        sim.set_f32(dr::HEADING_DEG, HEADING);
        let q = euler_to_quat(Vector3::new(1.0, 2.0, HEADING));
        sim.set_f32_array(dr::ATTITUDE_Q, 0, &quat_to_sim(&q));
        sim.set_f32(dr::SIZE_X_M, 5.0);
        sim.set_f32(dr::SIZE_Z_M, 4.0);
        sim
    }

    fn active(sim: &mut MockSim) -> Calibration {
        let mut cal = Calibration::default();
        cal.toggle(sim);
        cal
    }

    #[test]
    fn test_step_order_wraps() {
        assert_eq!(CalibrationStep::Back.next(), CalibrationStep::Level);
        assert_eq!(CalibrationStep::Level.previous(), CalibrationStep::Back);
        assert_eq!(CalibrationStep::LeftSide.next(), CalibrationStep::RightSide);
    }

    #[test]
    fn test_toggle_suspends_physics_and_targets_level() {
        let mut sim = parked_sim();
        let cal = active(&mut sim);

        assert_eq!(cal.phase(), Phase::Animating(CalibrationStep::Level));
        assert_eq!(sim.int_at(dr::OVERRIDE_PLANEPATH, 0), 1);
        assert_eq!(sim.get_f32(dr::LOCAL_VX), 0.0);
        assert_eq!(sim.get_f32(dr::YAW_RATE_R), 0.0);

        // Lifted by the larger extent plus clearance
        let target = cal.target();
        assert_eq!(target.position, Vector3::new(100.0, 56.0, -200.0));
        let euler = quat_to_euler(&target.attitude);
        assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3);
        assert!((euler.z - HEADING).abs() < 1e-3);
    }

    #[test]
    fn test_tick_eases_position() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);

        cal.tick(0.5, &mut sim);
        assert!((sim.get_f64(dr::LOCAL_Y) - 53.0).abs() < 1e-9);
        // Upward velocity from the finite difference
        assert!((sim.get_f32(dr::LOCAL_VY) - 6.0).abs() < 1e-3);

        // Clamped at the destination without rotation
        cal.tick(5.0, &mut sim);
        assert!((sim.get_f64(dr::LOCAL_Y) - 56.0).abs() < 1e-9);
        cal.tick(0.1, &mut sim);
        assert_eq!(sim.get_f32(dr::LOCAL_VY), 0.0);
    }

    #[test]
    fn test_next_full_cycle_returns_to_same_target() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);
        let first = *cal.target();

        for _ in 0..CalibrationStep::ALL.len() {
            cal.tick(0.3, &mut sim);
            cal.next();
        }
        assert_eq!(cal.phase(), Phase::Animating(CalibrationStep::Level));
        assert_eq!(*cal.target(), first);

        cal.previous();
        assert_eq!(cal.phase(), Phase::Animating(CalibrationStep::Back));
    }

    #[test]
    fn test_step_change_starts_from_last_pose() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);
        cal.tick(1.0, &mut sim);
        cal.next();

        // First tick of the new transition stays close to where we were
        cal.tick(0.01, &mut sim);
        assert!((sim.get_f64(dr::LOCAL_Y) - 56.0).abs() < 1e-9);
        assert!(sim.get_f32(dr::ROLL_DEG).abs() < 1.0);

        cal.tick(1.0, &mut sim);
        assert!((sim.get_f32(dr::ROLL_DEG) + 90.0).abs() < 1e-2);
    }

    #[test]
    fn test_pose_at_singular_pitch_is_finite() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);
        cal.next();
        cal.next();
        cal.next();
        assert_eq!(cal.phase(), Phase::Animating(CalibrationStep::NoseDown));

        cal.tick(1.0, &mut sim);
        for name in [dr::ROLL_DEG, dr::PITCH_DEG, dr::HEADING_DEG, dr::ROLL_RATE_P] {
            assert!(sim.get_f32(name).is_finite(), "{name}");
        }
        assert!(sim.get_f32(dr::PITCH_DEG) < -89.0);
    }

    #[test]
    fn test_illegal_calls_are_ignored() {
        let mut sim = parked_sim();
        sim.clear_log();
        let mut cal = Calibration::default();
        cal.next();
        cal.previous();
        cal.toggle_rotation();
        cal.tick(0.1, &mut sim);
        assert_eq!(cal.phase(), Phase::Inactive);
        assert!(!cal.is_rotating());
        assert!(sim.writes.is_empty());
    }

    #[test]
    fn test_continuous_rotation_adds_yaw() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);
        cal.tick(1.0, &mut sim);

        cal.toggle_rotation();
        assert_eq!(cal.label(), "Level (rotating)");
        cal.tick(1.0, &mut sim);

        let heading = sim.get_f32(dr::HEADING_DEG);
        assert!((heading - (HEADING + 30.0)).abs() < 1e-2, "{heading}");
        let r = sim.get_f32(dr::YAW_RATE_R);
        assert!(r > 25.0 && r < 31.0, "{r}");

        // Turning it off eases back to the step heading
        cal.toggle_rotation();
        assert!(!cal.is_rotating());
        cal.tick(1.0, &mut sim);
        assert!((sim.get_f32(dr::HEADING_DEG) - HEADING).abs() < 1e-2);
    }

    #[test]
    fn test_return_restores_saved_state_exactly() {
        let mut sim = parked_sim();
        let before = sim.values.clone();
        let mut cal = active(&mut sim);
        cal.tick(0.4, &mut sim);
        cal.next();
        cal.tick(0.7, &mut sim);

        cal.toggle(&mut sim);
        assert_eq!(cal.phase(), Phase::Returning);
        cal.next();
        assert_eq!(cal.phase(), Phase::Returning);

        cal.tick(0.6, &mut sim);
        assert!(cal.is_active());
        cal.tick(0.6, &mut sim);
        assert!(!cal.is_active());
        assert_eq!(sim.int_at(dr::OVERRIDE_PLANEPATH, 0), 0);

        for name in [
            dr::LOCAL_X,
            dr::LOCAL_Y,
            dr::LOCAL_Z,
            dr::LOCAL_VX,
            dr::LOCAL_VY,
            dr::LOCAL_VZ,
            dr::ROLL_RATE_P,
            dr::PITCH_RATE_Q,
            dr::YAW_RATE_R,
            dr::ROLL_DEG,
            dr::PITCH_DEG,
            dr::HEADING_DEG,
            dr::ATTITUDE_Q,
        ] {
            assert_eq!(sim.values.get(name), before.get(name), "{name}");
        }
        assert_eq!(cal.label(), "Off");
    }

    #[test]
    fn test_toggle_while_returning_restarts_return() {
        let mut sim = parked_sim();
        let before = sim.values.clone();
        let mut cal = active(&mut sim);
        cal.tick(1.0, &mut sim);
        cal.toggle(&mut sim);
        cal.tick(0.5, &mut sim);
        let home = cal.target().position;

        cal.toggle(&mut sim);
        assert_eq!(cal.phase(), Phase::Returning);
        assert_eq!(cal.label(), "Returning");
        assert_eq!(cal.target().position, home);

        // The segment starts over, so half a transition is not enough
        cal.tick(0.6, &mut sim);
        assert!(cal.is_active());
        cal.tick(0.6, &mut sim);
        assert!(!cal.is_active());
        assert_eq!(sim.values.get(dr::LOCAL_Y), before.get(dr::LOCAL_Y));
    }

    #[test]
    fn test_long_rotation_keeps_steady_rate() {
        let mut sim = parked_sim();
        let mut cal = active(&mut sim);
        cal.tick(1.0, &mut sim);
        cal.toggle_rotation();

        let dt = 1.0 / 60.0;
        for i in 0..100_000 {
            cal.tick(dt, &mut sim);
            if i % 1000 == 0 {
                sim.clear_log();
            }
        }
        for _ in 0..120 {
            cal.tick(dt, &mut sim);
            let r = sim.get_f32(dr::YAW_RATE_R);
            assert!((r - 30.0).abs() < 0.05, "{r}");
        }
    }
}
