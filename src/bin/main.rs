//! hitl-monitor: find a HITL device and watch what it sends.

use std::thread;
use std::time::Duration;

use clap::Parser;
use hitl_core::{Transport, TransportError};
use hitl_proto::{FrameParser, Message};
use log::{error, info, warn};
use xplane_hitl::{list_ports, PortScanner, ScanStatus, SerialSettings, SerialTransport};

#[derive(Parser, Debug)]
#[command(name = "hitl-monitor")]
#[command(about = "Find a HITL device on a serial port and log its frames")]
struct Args {
    /// List serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Scan all ports for a device instead of opening one
    #[arg(short, long)]
    scan: bool,

    /// Serial port to open
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let ports = match list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            error!("cannot list ports: {e}");
            return;
        }
    };

    if args.list {
        println!("Found {} port(s):", ports.len());
        for port in &ports {
            println!("  {port}");
        }
        return;
    }

    let settings = SerialSettings {
        baud_rate: args.baud,
        ..SerialSettings::default()
    };

    let transport = if let Some(port) = args.port {
        match SerialTransport::open(&port, &settings) {
            Ok(t) => t,
            Err(e) => {
                error!("{port}: {e}");
                return;
            }
        }
    } else if args.scan {
        match scan(ports, settings) {
            Some(t) => t,
            None => {
                error!("no device found");
                return;
            }
        }
    } else {
        error!("pass --port, --scan or --list");
        return;
    };

    if let Err(e) = monitor(transport) {
        error!("link error: {e}");
    }
}

fn scan(ports: Vec<String>, settings: SerialSettings) -> Option<SerialTransport> {
    let mut scanner = PortScanner::spawn(ports, settings);
    loop {
        match scanner.poll() {
            ScanStatus::Running => thread::sleep(Duration::from_millis(20)),
            ScanStatus::Found(transport) => return Some(transport),
            ScanStatus::Finished => return None,
        }
    }
}

fn monitor(mut transport: SerialTransport) -> Result<(), TransportError> {
    info!("listening on {}", transport.name());
    let mut parser = FrameParser::new();
    let mut dropped = 0;
    loop {
        let available = transport.available()?;
        if available == 0 {
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        for _ in 0..available {
            let Some(message) = parser.push_byte(transport.read_byte()?) else {
                continue;
            };
            match message {
                Message::Ping => info!("ping"),
                Message::State(state) => info!(
                    "state: {} ahrs={} Hz starter={:?}",
                    state.arm.label(),
                    state.ahrs_count,
                    state.starter
                ),
                Message::PlaneControl(c) => info!(
                    "plane: roll={} pitch={} yaw={} throttle={}",
                    c.roll, c.pitch, c.yaw, c.throttle
                ),
                Message::HeliControl(c) => info!(
                    "heli: roll={} pitch={} collective={} tail={} throttle={}",
                    c.roll, c.pitch, c.collective, c.tail, c.throttle
                ),
            }
        }
        let stats = parser.stats();
        if stats.dropped != dropped {
            dropped = stats.dropped;
            warn!("{dropped} malformed frame(s) dropped so far");
        }
    }
}
