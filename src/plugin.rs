//! The plugin context.
//!
//! [`HitlPlugin`] owns every piece of runtime state. The SDK glue keeps one
//! instance and forwards its callbacks (flight loop, menu and button
//! handlers) to it; nothing lives in globals. It is generic over the
//! simulator and UI facades so it runs without the simulator.

use hitl_core::{
    BridgeConfig, Calibration, HitlBridge, SimCommands, SimData, StatusDisplay, StatusLabel,
    Transport,
};
use log::{info, warn};

use crate::scanner::{PortScanner, ScanStatus};
use crate::serial::{list_ports, SerialError, SerialSettings, SerialTransport};

/// Flight loop return value asking to be called again next frame.
pub const FLIGHT_LOOP_EVERY_FRAME: f32 = -1.0;

pub struct HitlPlugin<S, U> {
    bridge: HitlBridge<SerialTransport, S, U>,
    settings: SerialSettings,
    scanner: Option<PortScanner>,
    /// Seconds since the last scan ended while disconnected.
    idle: f32,
    ports: Vec<String>,
}

impl<S, U> HitlPlugin<S, U>
where
    S: SimData + SimCommands,
    U: StatusDisplay,
{
    pub fn new(sim: S, mut ui: U, config: BridgeConfig, settings: SerialSettings) -> Self {
        ui.set_text(StatusLabel::Connection, "Disconnected");
        ui.set_text(StatusLabel::Calibration, &Calibration::default().label());
        Self {
            bridge: HitlBridge::new(sim, ui, config),
            settings,
            scanner: None,
            idle: 0.0,
            ports: Vec::new(),
        }
    }

    /// Per-frame callback. Returns the interval until the next call.
    pub fn flight_loop(&mut self, dt: f32) -> f32 {
        self.poll_scanner();

        if let Err(e) = self.bridge.tick(dt) {
            warn!("connection lost: {e}");
            self.idle = 0.0;
        }

        if self.rescan_due(dt) {
            self.start_scan();
        }
        FLIGHT_LOOP_EVERY_FRAME
    }

    /// Advance the automatic rescan timer. True when a scan should start.
    fn rescan_due(&mut self, dt: f32) -> bool {
        if !self.settings.auto_scan || self.bridge.is_connected() || self.is_scanning() {
            self.idle = 0.0;
            return false;
        }
        self.idle += dt.max(0.0);
        if self.idle >= self.settings.rescan_interval.as_secs_f32() {
            self.idle = 0.0;
            return true;
        }
        false
    }

    /// Open `port` directly, cancelling any scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened.
    pub fn connect(&mut self, port: &str) -> Result<(), SerialError> {
        self.stop_scan();
        self.disconnect();
        let transport = SerialTransport::open(port, &self.settings)?;
        self.bridge.attach(transport);
        Ok(())
    }

    /// Close the link and release the controls.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.bridge.detach() {
            info!("disconnecting from {}", transport.name());
            transport.close();
        }
        self.idle = 0.0;
    }

    /// Probe every listed port in the background.
    pub fn start_scan(&mut self) {
        self.stop_scan();
        let ports = match list_ports() {
            Ok(ports) => ports,
            Err(e) => {
                warn!("cannot list ports: {e}");
                return;
            }
        };
        self.bridge
            .ui_mut()
            .set_text(StatusLabel::Connection, "Scanning");
        self.ports.clone_from(&ports);
        self.scanner = Some(PortScanner::spawn(ports, self.settings));
    }

    pub fn stop_scan(&mut self) {
        if let Some(mut scanner) = self.scanner.take() {
            scanner.stop();
        }
    }

    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanner.as_ref().is_some_and(PortScanner::is_running)
    }

    fn poll_scanner(&mut self) {
        let Some(scanner) = self.scanner.as_mut() else {
            return;
        };
        match scanner.poll() {
            ScanStatus::Running => {}
            ScanStatus::Found(transport) => {
                self.scanner = None;
                if !self.bridge.is_connected() {
                    self.bridge.attach(transport);
                }
            }
            ScanStatus::Finished => {
                self.scanner = None;
                self.bridge
                    .ui_mut()
                    .set_text(StatusLabel::Connection, "No device found");
            }
        }
    }

    /// Re-read the port list for the UI.
    pub fn refresh_ports(&mut self) -> &[String] {
        match list_ports() {
            Ok(ports) => self.ports = ports,
            Err(e) => warn!("cannot list ports: {e}"),
        }
        &self.ports
    }

    /// Ports seen by the last scan or refresh.
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn toggle_calibration(&mut self) {
        self.bridge.toggle_calibration();
    }

    pub fn next_calibration_step(&mut self) {
        self.bridge.next_calibration_step();
    }

    pub fn previous_calibration_step(&mut self) {
        self.bridge.previous_calibration_step();
    }

    pub fn toggle_calibration_rotation(&mut self) {
        self.bridge.toggle_calibration_rotation();
    }

    pub fn bridge(&self) -> &HitlBridge<SerialTransport, S, U> {
        &self.bridge
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Plugin disable: stop scanning and drop the link.
    pub fn shutdown(&mut self) {
        self.stop_scan();
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct Sim {
        values: HashMap<String, f64>,
    }

    impl SimData for Sim {
        fn get_i32(&self, name: &str) -> i32 {
            self.get_f64(name) as i32
        }
        fn get_f32(&self, name: &str) -> f32 {
            self.get_f64(name) as f32
        }
        fn get_f64(&self, name: &str) -> f64 {
            self.values.get(name).copied().unwrap_or(0.0)
        }
        fn get_f32_array(&self, _name: &str, _offset: usize, _out: &mut [f32]) -> usize {
            0
        }
        fn set_i32(&mut self, name: &str, value: i32) {
            self.values.insert(name.to_string(), f64::from(value));
        }
        fn set_f32(&mut self, name: &str, value: f32) {
            self.values.insert(name.to_string(), f64::from(value));
        }
        fn set_f64(&mut self, name: &str, value: f64) {
            self.values.insert(name.to_string(), value);
        }
        fn set_f32_array(&mut self, _name: &str, _offset: usize, _values: &[f32]) {}
        fn set_i32_array(&mut self, _name: &str, _offset: usize, _values: &[i32]) {}
    }

    impl SimCommands for Sim {
        fn command_once(&mut self, _name: &str) {}
        fn command_begin(&mut self, _name: &str) {}
        fn command_end(&mut self, _name: &str) {}
    }

    #[derive(Default)]
    struct Labels(HashMap<StatusLabel, String>);

    impl StatusDisplay for Labels {
        fn set_text(&mut self, label: StatusLabel, text: &str) {
            self.0.insert(label, text.to_string());
        }
    }

    fn plugin(auto_scan: bool) -> HitlPlugin<Sim, Labels> {
        let settings = SerialSettings {
            auto_scan,
            rescan_interval: Duration::from_secs(2),
            ..SerialSettings::default()
        };
        HitlPlugin::new(Sim::default(), Labels::default(), BridgeConfig::default(), settings)
    }

    fn label(plugin: &HitlPlugin<Sim, Labels>, which: StatusLabel) -> Option<&str> {
        plugin.bridge().ui().0.get(&which).map(String::as_str)
    }

    #[test]
    fn test_initial_labels() {
        let plugin = plugin(false);
        assert_eq!(label(&plugin, StatusLabel::Connection), Some("Disconnected"));
        assert_eq!(label(&plugin, StatusLabel::Calibration), Some("Off"));
    }

    #[test]
    fn test_flight_loop_runs_every_frame() {
        let mut plugin = plugin(false);
        assert_eq!(plugin.flight_loop(0.02), FLIGHT_LOOP_EVERY_FRAME);
        assert!(!plugin.bridge().is_connected());
        assert!(!plugin.is_scanning());
    }

    #[test]
    fn test_rescan_timer() {
        let mut plugin = plugin(true);
        assert!(!plugin.rescan_due(1.0));
        assert!(!plugin.rescan_due(0.5));
        assert!(plugin.rescan_due(0.6));
        // Timer restarts after firing
        assert!(!plugin.rescan_due(1.5));
    }

    #[test]
    fn test_rescan_disabled() {
        let mut plugin = plugin(false);
        for _ in 0..10 {
            assert!(!plugin.rescan_due(1.0));
        }
    }

    #[test]
    fn test_calibration_commands_reach_label() {
        let mut plugin = plugin(false);
        plugin.toggle_calibration();
        assert_eq!(label(&plugin, StatusLabel::Calibration), Some("Level"));
        plugin.next_calibration_step();
        assert_eq!(label(&plugin, StatusLabel::Calibration), Some("Left side"));
        assert!(plugin.bridge().calibration().is_active());
    }

    #[test]
    fn test_disconnect_without_link_is_noop() {
        let mut plugin = plugin(false);
        plugin.disconnect();
        assert!(plugin.bridge().transport().is_none());
    }
}
