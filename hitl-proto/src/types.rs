//! Wire message types: inbound device messages and the outbound telemetry bundle.
//!
//! Every type here has a fixed packed layout, written field by field through
//! its [`WireFormat`] impl. Sizes are part of the protocol contract.

use crate::serialize::{Serialize, WireFormat};
use crate::wire::{WireReader, WireWriter};

/// Lowest PWM value a control axis can carry.
pub const PWM_MIN: u16 = 1100;

/// Highest PWM value a control axis can carry.
pub const PWM_MAX: u16 = 1900;

/// Neutral PWM value (centered stick).
pub const PWM_CENTER: u16 = (PWM_MIN + PWM_MAX) / 2;

/// Type tag of the outbound telemetry bundle.
///
/// Tag 0 is direction dependent: the simulator sends telemetry with it and the
/// device answers with [`MessageType::Ping`].
pub const TELEMETRY_TYPE_TAG: i32 = 0;

/// Inbound message type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i32)]
pub enum MessageType {
    /// Presence/heartbeat frame with an empty payload.
    Ping = 0,
    /// Arm state, AHRS rate and starter request.
    State = 1,
    /// Fixed-wing control outputs.
    PlaneControl = 2,
    /// Rotary-wing control outputs.
    HeliControl = 3,
}

impl MessageType {
    /// Map a raw header tag to a known message type.
    #[must_use]
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Ping),
            1 => Some(Self::State),
            2 => Some(Self::PlaneControl),
            3 => Some(Self::HeliControl),
            _ => None,
        }
    }

    /// Raw header tag.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Payload size in bytes for this message type.
    #[must_use]
    pub const fn payload_size(self) -> usize {
        match self {
            Self::Ping => Ping::SIZE,
            Self::State => StateReport::SIZE,
            Self::PlaneControl => PlaneControl::SIZE,
            Self::HeliControl => HeliControl::SIZE,
        }
    }
}

/// A decoded inbound message.
///
/// Produced once per complete, validated frame and consumed immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Message {
    Ping,
    State(StateReport),
    PlaneControl(PlaneControl),
    HeliControl(HeliControl),
}

impl Message {
    /// The type tag this message is framed with.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Ping => MessageType::Ping,
            Self::State(_) => MessageType::State,
            Self::PlaneControl(_) => MessageType::PlaneControl,
            Self::HeliControl(_) => MessageType::HeliControl,
        }
    }
}

/// Empty heartbeat payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ping;

impl WireFormat for Ping {
    const SIZE: usize = 0;

    fn write_to(&self, _w: &mut WireWriter<'_>) {}

    fn read_from(_r: &mut WireReader<'_>) -> Self {
        Ping
    }
}

impl Serialize for Ping {
    const TYPE_TAG: i32 = MessageType::Ping.tag();
}

/// Autopilot arm state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
}

impl ArmState {
    /// Any nonzero byte means armed.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            Self::Disarmed
        } else {
            Self::Armed
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Disarmed => 0,
            Self::Armed => 1,
        }
    }

    /// Text shown on the arm-state label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disarmed => "Disarmed",
            Self::Armed => "Armed",
        }
    }
}

/// Engine starter request carried by the state message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StarterStatus {
    #[default]
    Idle,
    /// Crank the engine (held until the status leaves this value).
    Start,
    /// Shut the engine down.
    Stop,
}

impl StarterStatus {
    /// Unknown values are treated as idle.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Start,
            2 => Self::Stop,
            _ => Self::Idle,
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Start => 1,
            Self::Stop => 2,
        }
    }
}

/// State/heartbeat payload (type 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateReport {
    pub arm: ArmState,
    /// AHRS updates counted over the last second.
    pub ahrs_count: u32,
    pub starter: StarterStatus,
}

impl WireFormat for StateReport {
    const SIZE: usize = 6;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u8(self.arm.raw());
        w.put_u32(self.ahrs_count);
        w.put_u8(self.starter.raw());
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            arm: ArmState::from_raw(r.get_u8()),
            ahrs_count: r.get_u32(),
            starter: StarterStatus::from_raw(r.get_u8()),
        }
    }
}

impl Serialize for StateReport {
    const TYPE_TAG: i32 = MessageType::State.tag();
}

/// Fixed-wing control payload (type 2), PWM-scaled axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaneControl {
    pub roll: u16,
    pub pitch: u16,
    pub yaw: u16,
    pub throttle: u16,
}

impl Default for PlaneControl {
    fn default() -> Self {
        Self {
            roll: PWM_CENTER,
            pitch: PWM_CENTER,
            yaw: PWM_CENTER,
            throttle: PWM_MIN,
        }
    }
}

impl WireFormat for PlaneControl {
    const SIZE: usize = 8;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u16(self.roll);
        w.put_u16(self.pitch);
        w.put_u16(self.yaw);
        w.put_u16(self.throttle);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            roll: r.get_u16(),
            pitch: r.get_u16(),
            yaw: r.get_u16(),
            throttle: r.get_u16(),
        }
    }
}

impl Serialize for PlaneControl {
    const TYPE_TAG: i32 = MessageType::PlaneControl.tag();
}

/// Rotary-wing control payload (type 3), PWM-scaled axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeliControl {
    /// Cyclic roll.
    pub roll: u16,
    /// Cyclic pitch.
    pub pitch: u16,
    pub collective: u16,
    /// Tail rotor.
    pub tail: u16,
    pub throttle: u16,
}

impl Default for HeliControl {
    fn default() -> Self {
        Self {
            roll: PWM_CENTER,
            pitch: PWM_CENTER,
            collective: PWM_MIN,
            tail: PWM_CENTER,
            throttle: PWM_MIN,
        }
    }
}

impl WireFormat for HeliControl {
    const SIZE: usize = 10;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u16(self.roll);
        w.put_u16(self.pitch);
        w.put_u16(self.collective);
        w.put_u16(self.tail);
        w.put_u16(self.throttle);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            roll: r.get_u16(),
            pitch: r.get_u16(),
            collective: r.get_u16(),
            tail: r.get_u16(),
            throttle: r.get_u16(),
        }
    }
}

impl Serialize for HeliControl {
    const TYPE_TAG: i32 = MessageType::HeliControl.tag();
}

// --- Outbound telemetry blocks ---

/// Barometer block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaroData {
    pub instance: u8,
    pub pressure_pa: f32,
    pub temperature_c: f32,
}

impl WireFormat for BaroData {
    const SIZE: usize = 9;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u8(self.instance);
        w.put_f32(self.pressure_pa);
        w.put_f32(self.temperature_c);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            instance: r.get_u8(),
            pressure_pa: r.get_f32(),
            temperature_c: r.get_f32(),
        }
    }
}

/// Magnetometer block, body frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagData {
    pub field: [f32; 3],
}

impl WireFormat for MagData {
    const SIZE: usize = 12;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_f32s(&self.field);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self { field: r.get_f32s() }
    }
}

/// GPS block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsData {
    /// 0xFFFF when the week is unknown.
    pub gps_week: u16,
    pub ms_tow: u32,
    pub fix_type: u8,
    pub satellites_in_view: u8,
    pub horizontal_pos_accuracy: f32,
    pub vertical_pos_accuracy: f32,
    pub horizontal_vel_accuracy: f32,
    pub hdop: f32,
    pub vdop: f32,
    /// Degrees * 1e7.
    pub longitude: i32,
    /// Degrees * 1e7.
    pub latitude: i32,
    /// Centimeters above mean sea level.
    pub msl_altitude: i32,
    pub ned_vel_north: f32,
    pub ned_vel_east: f32,
    pub ned_vel_down: f32,
}

impl WireFormat for GpsData {
    const SIZE: usize = 52;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u16(self.gps_week);
        w.put_u32(self.ms_tow);
        w.put_u8(self.fix_type);
        w.put_u8(self.satellites_in_view);
        w.put_f32(self.horizontal_pos_accuracy);
        w.put_f32(self.vertical_pos_accuracy);
        w.put_f32(self.horizontal_vel_accuracy);
        w.put_f32(self.hdop);
        w.put_f32(self.vdop);
        w.put_i32(self.longitude);
        w.put_i32(self.latitude);
        w.put_i32(self.msl_altitude);
        w.put_f32(self.ned_vel_north);
        w.put_f32(self.ned_vel_east);
        w.put_f32(self.ned_vel_down);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            gps_week: r.get_u16(),
            ms_tow: r.get_u32(),
            fix_type: r.get_u8(),
            satellites_in_view: r.get_u8(),
            horizontal_pos_accuracy: r.get_f32(),
            vertical_pos_accuracy: r.get_f32(),
            horizontal_vel_accuracy: r.get_f32(),
            hdop: r.get_f32(),
            vdop: r.get_f32(),
            longitude: r.get_i32(),
            latitude: r.get_i32(),
            msl_altitude: r.get_i32(),
            ned_vel_north: r.get_f32(),
            ned_vel_east: r.get_f32(),
            ned_vel_down: r.get_f32(),
        }
    }
}

/// Inertial block: accelerometer (m/s²) and gyro (rad/s), body frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InsData {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub temperature_c: f32,
}

impl WireFormat for InsData {
    const SIZE: usize = 28;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_f32s(&self.accel);
        w.put_f32s(&self.gyro);
        w.put_f32(self.temperature_c);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            accel: r.get_f32s(),
            gyro: r.get_f32s(),
            temperature_c: r.get_f32(),
        }
    }
}

/// Airspeed block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AirspeedData {
    /// Pitot differential pressure in Pascals.
    pub differential_pressure_pa: f32,
    pub temperature_c: f32,
}

impl WireFormat for AirspeedData {
    const SIZE: usize = 8;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_f32(self.differential_pressure_pa);
        w.put_f32(self.temperature_c);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            differential_pressure_pa: r.get_f32(),
            temperature_c: r.get_f32(),
        }
    }
}

/// Engine/EFI block. Sent zeroed with `present == false` when unavailable.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EfiData {
    pub present: bool,
    pub rpm: f32,
    pub throttle_position_percent: f32,
    pub fuel_consumption_cm3_per_min: f32,
    pub exhaust_gas_temperature_c: f32,
}

impl WireFormat for EfiData {
    const SIZE: usize = 17;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        w.put_u8(u8::from(self.present));
        w.put_f32(self.rpm);
        w.put_f32(self.throttle_position_percent);
        w.put_f32(self.fuel_consumption_cm3_per_min);
        w.put_f32(self.exhaust_gas_temperature_c);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            present: r.get_u8() != 0,
            rpm: r.get_f32(),
            throttle_position_percent: r.get_f32(),
            fuel_consumption_cm3_per_min: r.get_f32(),
            exhaust_gas_temperature_c: r.get_f32(),
        }
    }
}

/// Outbound telemetry bundle (type 0), one per simulation tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryBundle {
    pub baro: BaroData,
    pub mag: MagData,
    pub gps: GpsData,
    pub ins: InsData,
    pub airspeed: AirspeedData,
    pub efi: EfiData,
    /// Attitude quaternion as `[w, x, y, z]`.
    pub attitude: [f32; 4],
}

impl WireFormat for TelemetryBundle {
    const SIZE: usize = BaroData::SIZE
        + MagData::SIZE
        + GpsData::SIZE
        + InsData::SIZE
        + AirspeedData::SIZE
        + EfiData::SIZE
        + 16;

    fn write_to(&self, w: &mut WireWriter<'_>) {
        self.baro.write_to(w);
        self.mag.write_to(w);
        self.gps.write_to(w);
        self.ins.write_to(w);
        self.airspeed.write_to(w);
        self.efi.write_to(w);
        w.put_f32s(&self.attitude);
    }

    fn read_from(r: &mut WireReader<'_>) -> Self {
        Self {
            baro: BaroData::read_from(r),
            mag: MagData::read_from(r),
            gps: GpsData::read_from(r),
            ins: InsData::read_from(r),
            airspeed: AirspeedData::read_from(r),
            efi: EfiData::read_from(r),
            attitude: r.get_f32s(),
        }
    }
}

impl Serialize for TelemetryBundle {
    const TYPE_TAG: i32 = TELEMETRY_TYPE_TAG;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a block and checks it fills exactly its declared size.
    fn written_len<T: WireFormat>(value: &T) -> usize {
        let mut buf = [0u8; 256];
        let mut w = WireWriter::new(&mut buf);
        value.write_to(&mut w);
        w.position()
    }

    #[test]
    fn test_block_sizes_match_layout() {
        assert_eq!(written_len(&StateReport::default()), StateReport::SIZE);
        assert_eq!(written_len(&PlaneControl::default()), PlaneControl::SIZE);
        assert_eq!(written_len(&HeliControl::default()), HeliControl::SIZE);
        assert_eq!(written_len(&GpsData::default()), GpsData::SIZE);
        assert_eq!(written_len(&EfiData::default()), EfiData::SIZE);
        assert_eq!(written_len(&TelemetryBundle::default()), TelemetryBundle::SIZE);
        assert_eq!(TelemetryBundle::SIZE, 142);
    }

    #[test]
    fn test_message_type_tags() {
        for t in [
            MessageType::Ping,
            MessageType::State,
            MessageType::PlaneControl,
            MessageType::HeliControl,
        ] {
            assert_eq!(MessageType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(MessageType::from_tag(4), None);
        assert_eq!(MessageType::from_tag(-1), None);
    }

    #[test]
    fn test_state_report_layout() {
        let report = StateReport {
            arm: ArmState::Armed,
            ahrs_count: 400,
            starter: StarterStatus::Stop,
        };
        let mut buf = [0u8; StateReport::SIZE];
        report.write_to(&mut WireWriter::new(&mut buf));
        assert_eq!(buf, [1, 0x90, 0x01, 0, 0, 2]);
    }

    #[test]
    fn test_arm_state_nonzero_is_armed() {
        assert_eq!(ArmState::from_raw(0), ArmState::Disarmed);
        assert_eq!(ArmState::from_raw(1), ArmState::Armed);
        assert_eq!(ArmState::from_raw(0x7F), ArmState::Armed);
    }

    #[test]
    fn test_unknown_starter_status_is_idle() {
        assert_eq!(StarterStatus::from_raw(9), StarterStatus::Idle);
    }
}
