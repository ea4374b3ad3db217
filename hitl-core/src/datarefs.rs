//! Simulator variable and command paths used by the bridge.

// Sensors
pub const G_AXIAL: &str = "sim/flightmodel/forces/g_axil";
pub const G_SIDE: &str = "sim/flightmodel/forces/g_side";
pub const G_NORMAL: &str = "sim/flightmodel/forces/g_nrml";
pub const ROLL_RATE_P: &str = "sim/flightmodel/position/P";
pub const PITCH_RATE_Q: &str = "sim/flightmodel/position/Q";
pub const YAW_RATE_R: &str = "sim/flightmodel/position/R";
pub const ATTITUDE_Q: &str = "sim/flightmodel/position/q";
pub const BAROMETER_INHG: &str = "sim/weather/barometer_current_inhg";
pub const TEMPERATURE_C: &str = "sim/weather/temperature_ambient_c";
pub const DYNAMIC_PRESSURE_PSF: &str = "sim/flightmodel/misc/Qstatic_psf";

// Position
pub const LATITUDE: &str = "sim/flightmodel/position/latitude";
pub const LONGITUDE: &str = "sim/flightmodel/position/longitude";
pub const ELEVATION_M: &str = "sim/flightmodel/position/elevation";
pub const LOCAL_X: &str = "sim/flightmodel/position/local_x";
pub const LOCAL_Y: &str = "sim/flightmodel/position/local_y";
pub const LOCAL_Z: &str = "sim/flightmodel/position/local_z";
pub const LOCAL_VX: &str = "sim/flightmodel/position/local_vx";
pub const LOCAL_VY: &str = "sim/flightmodel/position/local_vy";
pub const LOCAL_VZ: &str = "sim/flightmodel/position/local_vz";
pub const ROLL_DEG: &str = "sim/flightmodel/position/phi";
pub const PITCH_DEG: &str = "sim/flightmodel/position/theta";
pub const HEADING_DEG: &str = "sim/flightmodel/position/psi";

// Aircraft
pub const NUM_ENGINES: &str = "sim/aircraft/engine/acf_num_engines";
pub const SIZE_X_M: &str = "sim/aircraft/view/acf_size_x";
pub const SIZE_Z_M: &str = "sim/aircraft/view/acf_size_z";

// Engine arrays (index 0 is engine 1)
pub const ENGINE_RPM: &str = "sim/cockpit2/engine/indicators/engine_speed_rpm";
pub const THROTTLE_RATIO: &str = "sim/cockpit2/engine/actuators/throttle_ratio";
pub const FUEL_FLOW_KG_SEC: &str = "sim/cockpit2/engine/indicators/fuel_flow_kg_sec";
pub const EGT_DEG_C: &str = "sim/cockpit2/engine/indicators/EGT_deg_C";

// Control overrides
pub const OVERRIDE_PLANEPATH: &str = "sim/operation/override/override_planepath";
pub const OVERRIDE_JOYSTICK_ROLL: &str = "sim/operation/override/override_joystick_roll";
pub const OVERRIDE_JOYSTICK_PITCH: &str = "sim/operation/override/override_joystick_pitch";
pub const OVERRIDE_JOYSTICK_HEADING: &str = "sim/operation/override/override_joystick_heading";
pub const OVERRIDE_THROTTLES: &str = "sim/operation/override/override_throttles";

// Control inputs
pub const YOKE_ROLL_RATIO: &str = "sim/joystick/yoke_roll_ratio";
pub const YOKE_PITCH_RATIO: &str = "sim/joystick/yoke_pitch_ratio";
pub const YOKE_HEADING_RATIO: &str = "sim/joystick/yoke_heading_ratio";
pub const THROTTLE_USE: &str = "sim/flightmodel/engine/ENGN_thro_use";
pub const PROP_PITCH_RATIO: &str = "sim/cockpit2/engine/actuators/prop_ratio";
pub const PARKING_BRAKE_RATIO: &str = "sim/cockpit2/controls/parking_brake_ratio";

// Commands
pub const CMD_ENGAGE_STARTER: &str = "sim/starters/engage_starter_1";
pub const CMD_SHUT_DOWN: &str = "sim/starters/shut_down_1";

/// Engine slots in the simulator's per-engine arrays.
pub const MAX_ENGINES: usize = 16;
