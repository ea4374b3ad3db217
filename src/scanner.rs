//! Background search for the HITL device.
//!
//! Probing a port can take a while (open, then wait for bytes with a
//! timeout), so it runs on its own thread. The thread hands the first port
//! that produced a valid frame to the flight loop through a single-slot
//! [`Signal`] and exits.

use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use hitl_proto::FrameParser;
use log::{debug, info, warn};
use portable_atomic::{AtomicBool, Ordering};

use crate::serial::{open_port, SerialSettings, SerialTransport};

/// Read up to `max_bytes` from `reader` and report whether they contain a
/// complete valid frame.
///
/// Stops early at end of stream, on a read error or timeout, or once `stop`
/// is set.
pub fn probe_stream<R: Read>(reader: &mut R, max_bytes: usize, stop: &AtomicBool) -> bool {
    let mut parser = FrameParser::new();
    let mut byte = [0u8; 1];
    let mut read = 0;

    while read < max_bytes {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        match reader.read(&mut byte) {
            Ok(0) => return false,
            Ok(_) => {
                read += 1;
                if parser.push_byte(byte[0]).is_some() {
                    return true;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => return false,
        }
    }
    false
}

/// Outcome of [`PortScanner::poll`].
#[derive(Debug)]
pub enum ScanStatus<T> {
    /// Still probing.
    Running,
    /// A device answered. The scan thread has exited.
    Found(T),
    /// Every candidate was tried without success.
    Finished,
}

/// Handle to a running scan.
///
/// The scan thread publishes at most one result through a single-slot
/// mailbox. Dropping the handle stops the scan and waits for the thread.
pub struct PortScanner<T: Send + 'static = SerialTransport> {
    stop: Arc<AtomicBool>,
    found: Arc<Signal<CriticalSectionRawMutex, T>>,
    handle: Option<JoinHandle<()>>,
}

impl PortScanner<SerialTransport> {
    /// Probe `ports` in order on a new thread.
    pub fn spawn(ports: Vec<String>, settings: SerialSettings) -> Self {
        Self::spawn_with(move |stop| scan(&ports, &settings, stop))
    }
}

impl<T: Send + 'static> PortScanner<T> {
    /// Run `search` on a new thread and publish what it returns.
    ///
    /// `search` should check the stop flag between attempts.
    pub fn spawn_with<F>(search: F) -> Self
    where
        F: FnOnce(&AtomicBool) -> Option<T> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let found = Arc::new(Signal::new());

        let handle = {
            let stop = Arc::clone(&stop);
            let found = Arc::clone(&found);
            thread::spawn(move || {
                if let Some(result) = search(&stop) {
                    found.signal(result);
                }
            })
        };

        Self {
            stop,
            found,
            handle: Some(handle),
        }
    }

    /// Check on the scan without blocking.
    pub fn poll(&mut self) -> ScanStatus<T> {
        // Sampled before taking: a thread already seen as finished has
        // published its result, so nothing is lost between the two checks.
        let finished = !self.is_running();
        if let Some(result) = self.found.try_take() {
            self.join();
            return ScanStatus::Found(result);
        }
        if finished {
            self.join();
            ScanStatus::Finished
        } else {
            ScanStatus::Running
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the thread to stop after the current read and wait for it.
    ///
    /// A transport found in the meantime is dropped, closing its port.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.join();
        if self.found.try_take().is_some() {
            debug!("scan stopped, discarding found port");
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("scan thread panicked");
            }
        }
    }
}

impl<T: Send + 'static> Drop for PortScanner<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scan(
    ports: &[String],
    settings: &SerialSettings,
    stop: &AtomicBool,
) -> Option<SerialTransport> {
    info!("scanning {} port(s)", ports.len());
    for name in ports {
        if stop.load(Ordering::Relaxed) {
            debug!("scan cancelled");
            return None;
        }

        let mut port = match open_port(name, settings.baud_rate, settings.probe_timeout) {
            Ok(port) => port,
            Err(e) => {
                debug!("{name}: {e}");
                continue;
            }
        };

        if !probe_stream(&mut port, settings.probe_max_bytes, stop) {
            debug!("{name}: no device");
            continue;
        }

        if let Err(e) = port.set_timeout(settings.io_timeout) {
            warn!("{name}: {e}");
            continue;
        }
        info!("device found on {name}");
        return Some(SerialTransport::from_port(name, port));
    }
    info!("scan finished without finding a device");
    None
}
