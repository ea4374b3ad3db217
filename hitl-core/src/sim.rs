//! Simulator and UI facades.
//!
//! These traits are the only way the bridge touches the host: named variable
//! access, one-shot commands and status labels. The host plugin implements
//! them over the SDK; tests use in-memory mocks.

/// Named simulator variable access ("datarefs").
///
/// Unknown names read as zero and writes to them are ignored, matching the
/// host's behavior for unresolved handles.
pub trait SimData {
    fn get_i32(&self, name: &str) -> i32;
    fn get_f32(&self, name: &str) -> f32;
    fn get_f64(&self, name: &str) -> f64;

    /// Read array elements starting at `offset` into `out`.
    ///
    /// Returns the number of elements copied.
    fn get_f32_array(&self, name: &str, offset: usize, out: &mut [f32]) -> usize;

    fn set_i32(&mut self, name: &str, value: i32);
    fn set_f32(&mut self, name: &str, value: f32);
    fn set_f64(&mut self, name: &str, value: f64);

    /// Write `values` into the array starting at `offset`.
    fn set_f32_array(&mut self, name: &str, offset: usize, values: &[f32]);

    /// Write `values` into the array starting at `offset`.
    fn set_i32_array(&mut self, name: &str, offset: usize, values: &[i32]);
}

/// One-shot and held simulator commands.
pub trait SimCommands {
    fn command_once(&mut self, name: &str);

    /// Start holding a command until [`SimCommands::command_end`].
    fn command_begin(&mut self, name: &str);

    fn command_end(&mut self, name: &str);
}

/// Status labels shown in the plugin window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLabel {
    /// Link state ("Connected", "Disconnected", ...).
    Connection,
    /// Autopilot arm state.
    Armed,
    /// AHRS update rate reported by the device.
    AhrsRate,
    /// Current calibration step.
    Calibration,
}

/// Text sink for status labels.
pub trait StatusDisplay {
    fn set_text(&mut self, label: StatusLabel, text: &str);
}
