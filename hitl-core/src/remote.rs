//! Inbound message dispatch: arm state, starter and control outputs.

use hitl_proto::{ArmState, HeliControl, Message, PlaneControl, StarterStatus, StateReport};
use log::{debug, info, trace};

use crate::convert::pwm_to_range;
use crate::datarefs as dr;
use crate::sim::{SimCommands, SimData, StatusDisplay, StatusLabel};

/// Stick axes: PWM to [-1, 1].
const AXIS_RANGE: (f32, f32) = (-1.0, 1.0);

/// Throttle and collective: PWM to [0, 1].
const LEVER_RANGE: (f32, f32) = (0.0, 1.0);

const OVERRIDES: [&str; 4] = [
    dr::OVERRIDE_JOYSTICK_ROLL,
    dr::OVERRIDE_JOYSTICK_PITCH,
    dr::OVERRIDE_JOYSTICK_HEADING,
    dr::OVERRIDE_THROTTLES,
];

/// Latched remote-control state.
///
/// Everything here is derived from received messages and only used to skip
/// redundant simulator writes and label updates.
#[derive(Debug, Default)]
pub struct RemoteControl {
    override_enabled: bool,
    arm_state: Option<ArmState>,
    starter: StarterStatus,
    ahrs_count: Option<u32>,
    pinged: bool,
}

impl RemoteControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether device control outputs are currently applied.
    #[must_use]
    pub fn override_enabled(&self) -> bool {
        self.override_enabled
    }

    /// Last arm state reported by the device.
    #[must_use]
    pub fn arm_state(&self) -> Option<ArmState> {
        self.arm_state
    }

    /// Apply one decoded message to the simulator and UI.
    pub fn handle<S, U>(&mut self, message: &Message, sim: &mut S, ui: &mut U)
    where
        S: SimData + SimCommands,
        U: StatusDisplay,
    {
        match message {
            Message::Ping => {
                if !self.pinged {
                    self.pinged = true;
                    info!("device responding");
                    ui.set_text(StatusLabel::Connection, "Connected");
                }
            }
            Message::State(state) => self.handle_state(state, sim, ui),
            Message::PlaneControl(control) => {
                if self.override_enabled {
                    self.apply_plane(control, sim);
                }
            }
            Message::HeliControl(control) => {
                if self.override_enabled {
                    self.apply_heli(control, sim);
                }
            }
        }
    }

    /// Release all overrides and forget latched state.
    pub fn reset<S, U>(&mut self, sim: &mut S, ui: &mut U)
    where
        S: SimData + SimCommands,
        U: StatusDisplay,
    {
        if self.starter == StarterStatus::Start {
            sim.command_end(dr::CMD_ENGAGE_STARTER);
        }
        set_overrides(sim, false);
        ui.set_text(StatusLabel::Armed, "");
        ui.set_text(StatusLabel::AhrsRate, "");
        *self = Self::default();
    }

    fn handle_state<S, U>(&mut self, state: &StateReport, sim: &mut S, ui: &mut U)
    where
        S: SimData + SimCommands,
        U: StatusDisplay,
    {
        if self.arm_state != Some(state.arm) {
            debug!("arm state -> {:?}", state.arm);
            self.arm_state = Some(state.arm);
            ui.set_text(StatusLabel::Armed, state.arm.label());

            let armed = state.arm == ArmState::Armed;
            self.override_enabled = armed;
            set_overrides(sim, armed);
            sim.set_f32(dr::PARKING_BRAKE_RATIO, if armed { 0.0 } else { 1.0 });
        }

        if self.ahrs_count != Some(state.ahrs_count) {
            self.ahrs_count = Some(state.ahrs_count);
            ui.set_text(
                StatusLabel::AhrsRate,
                &format!("AHRS: {} Hz", state.ahrs_count),
            );
        }

        if self.starter != state.starter {
            debug!("starter {:?} -> {:?}", self.starter, state.starter);
            if self.starter == StarterStatus::Start {
                sim.command_end(dr::CMD_ENGAGE_STARTER);
            }
            match state.starter {
                StarterStatus::Start => sim.command_begin(dr::CMD_ENGAGE_STARTER),
                StarterStatus::Stop => sim.command_once(dr::CMD_SHUT_DOWN),
                StarterStatus::Idle => {}
            }
            self.starter = state.starter;
        }
    }

    fn apply_plane<S: SimData>(&self, control: &PlaneControl, sim: &mut S) {
        trace!("{control:?}");
        sim.set_f32(dr::YOKE_ROLL_RATIO, pwm_to_range(control.roll, AXIS_RANGE));
        sim.set_f32(dr::YOKE_PITCH_RATIO, pwm_to_range(control.pitch, AXIS_RANGE));
        sim.set_f32(dr::YOKE_HEADING_RATIO, pwm_to_range(control.yaw, AXIS_RANGE));
        set_all_engines(sim, dr::THROTTLE_USE, pwm_to_range(control.throttle, LEVER_RANGE));
    }

    fn apply_heli<S: SimData>(&self, control: &HeliControl, sim: &mut S) {
        trace!("{control:?}");
        sim.set_f32(dr::YOKE_ROLL_RATIO, pwm_to_range(control.roll, AXIS_RANGE));
        sim.set_f32(dr::YOKE_PITCH_RATIO, pwm_to_range(control.pitch, AXIS_RANGE));
        sim.set_f32(dr::YOKE_HEADING_RATIO, pwm_to_range(control.tail, AXIS_RANGE));
        set_all_engines(
            sim,
            dr::PROP_PITCH_RATIO,
            pwm_to_range(control.collective, LEVER_RANGE),
        );
        set_all_engines(sim, dr::THROTTLE_USE, pwm_to_range(control.throttle, LEVER_RANGE));
    }
}

fn set_overrides<S: SimData>(sim: &mut S, enabled: bool) {
    for name in OVERRIDES {
        sim.set_i32(name, i32::from(enabled));
    }
}

/// Write `value` to every engine slot the aircraft has (at least one).
fn set_all_engines<S: SimData>(sim: &mut S, name: &str, value: f32) {
    let count = usize::try_from(sim.get_i32(dr::NUM_ENGINES))
        .unwrap_or(0)
        .clamp(1, dr::MAX_ENGINES);
    let values = [value; dr::MAX_ENGINES];
    sim.set_f32_array(name, 0, &values[..count]);
}
