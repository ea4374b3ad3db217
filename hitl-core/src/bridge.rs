//! HitlBridge: connects the device link to the simulator, one tick at a time.

use hitl_proto::{FrameParser, FrameStats, SerializeError};
use log::{error, info, trace, warn};

use crate::calibration::Calibration;
use crate::config::BridgeConfig;
use crate::remote::RemoteControl;
use crate::sim::{SimCommands, SimData, StatusDisplay, StatusLabel};
use crate::snapshot::VehicleSnapshot;
use crate::telemetry::TelemetryEncoder;
use crate::transport::{Transport, TransportError};

/// Owns everything the per-frame callback needs.
///
/// Each [`HitlBridge::tick`] drains received bytes and applies decoded
/// messages, advances calibration, then sends one telemetry frame. Telemetry
/// therefore always reflects the controls applied in the same tick.
///
/// # Error Handling
///
/// A transport error drops the connection: the transport is closed, control
/// overrides are released and the connection label reads "Disconnected".
/// Reconnecting is up to the caller.
pub struct HitlBridge<T, S, U> {
    transport: Option<T>,
    sim: S,
    ui: U,
    parser: FrameParser,
    remote: RemoteControl,
    encoder: TelemetryEncoder,
    calibration: Calibration,
}

impl<T, S, U> HitlBridge<T, S, U>
where
    T: Transport,
    S: SimData + SimCommands,
    U: StatusDisplay,
{
    /// Create a disconnected bridge.
    pub fn new(sim: S, ui: U, config: BridgeConfig) -> Self {
        Self {
            transport: None,
            sim,
            ui,
            parser: FrameParser::new(),
            remote: RemoteControl::new(),
            encoder: TelemetryEncoder::new(config.telemetry),
            calibration: Calibration::new(config.calibration),
        }
    }

    /// Start using `transport`, replacing (and closing) any current one.
    pub fn attach(&mut self, transport: T) {
        if let Some(mut old) = self.transport.replace(transport) {
            old.close();
            self.remote.reset(&mut self.sim, &mut self.ui);
        }
        self.parser.reset();
        info!("transport attached");
        self.ui.set_text(StatusLabel::Connection, "Waiting for device");
    }

    /// Stop using the transport and hand it back without closing it.
    pub fn detach(&mut self) -> Option<T> {
        let transport = self.transport.take();
        if transport.is_some() {
            info!("transport detached");
            self.disconnected();
        }
        transport
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_open)
    }

    /// Run one simulation tick.
    ///
    /// # Errors
    ///
    /// Returns the transport or serialization error that ended the
    /// connection during this tick.
    pub fn tick(&mut self, dt: f32) -> Result<(), BridgeError> {
        if let Err(e) = self.receive() {
            return Err(self.fail(e));
        }

        let was_calibrating = self.calibration.is_active();
        self.calibration.tick(dt, &mut self.sim);
        if was_calibrating && !self.calibration.is_active() {
            self.update_calibration_label();
        }

        self.send_telemetry()
    }

    /// Drain and dispatch every byte the transport has ready.
    fn receive(&mut self) -> Result<(), TransportError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        // Transports may report their backlog in pieces
        loop {
            let available = transport.available()?;
            if available == 0 {
                return Ok(());
            }
            for _ in 0..available {
                let byte = transport.read_byte()?;
                if let Some(message) = self.parser.push_byte(byte) {
                    trace!("rx {:?}", message.message_type());
                    self.remote.handle(&message, &mut self.sim, &mut self.ui);
                }
            }
        }
    }

    fn send_telemetry(&mut self) -> Result<(), BridgeError> {
        if self.transport.is_none() {
            return Ok(());
        }
        let snapshot = VehicleSnapshot::read(&self.sim);
        let frame = self
            .encoder
            .encode(&snapshot, self.calibration.is_active())
            .map_err(BridgeError::Serialize)?;

        let written = match self.transport.as_mut() {
            Some(transport) => transport.write(&frame),
            None => Ok(()),
        };
        written.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, e: TransportError) -> BridgeError {
        error!("link error: {e}");
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.disconnected();
        BridgeError::Transport(e)
    }

    fn disconnected(&mut self) {
        self.parser.reset();
        self.remote.reset(&mut self.sim, &mut self.ui);
        self.ui.set_text(StatusLabel::Connection, "Disconnected");
    }

    /// Start calibration, or return from it.
    pub fn toggle_calibration(&mut self) {
        self.calibration.toggle(&mut self.sim);
        self.update_calibration_label();
    }

    pub fn next_calibration_step(&mut self) {
        self.calibration.next();
        self.update_calibration_label();
    }

    pub fn previous_calibration_step(&mut self) {
        self.calibration.previous();
        self.update_calibration_label();
    }

    pub fn toggle_calibration_rotation(&mut self) {
        if !self.calibration.is_active() {
            warn!("rotation toggled without calibration running");
        }
        self.calibration.toggle_rotation();
        self.update_calibration_label();
    }

    fn update_calibration_label(&mut self) {
        let label = self.calibration.label();
        self.ui.set_text(StatusLabel::Calibration, &label);
    }

    /// Frame counters of the receive parser.
    #[must_use]
    pub fn frame_stats(&self) -> FrameStats {
        self.parser.stats()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn remote(&self) -> &RemoteControl {
        &self.remote
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Decompose the bridge into its transport and facades.
    pub fn into_parts(self) -> (Option<T>, S, U) {
        (self.transport, self.sim, self.ui)
    }
}

/// Error type for bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The link failed and has been closed.
    Transport(TransportError),
    /// Telemetry could not be framed.
    Serialize(SerializeError),
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Serialize(e) => write!(f, "serialize: {e}"),
        }
    }
}
