//! `serbridge`
//!
//! Bridges a serial device and a pair of pre-existing named pipes: one
//! FIFO carries serial→client bytes, the other client→serial bytes.

use std::os::fd::AsFd;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{error, info};

use serbridge_core::{Result, exit, tracing_init};
use serbridge_relay::relay::{Disconnect, Relay};
use serbridge_relay::{fifo, serial};

#[derive(Parser, Debug)]
#[command(name = "serbridge")]
#[command(
    version,
    about = "Relay data between a serial port and a client via a pair of named pipes (FIFOs)",
    long_about = "Relay data between a serial port and a client via a pair of named pipes (FIFOs).\n\
                  The pipes must be created independently, such as by mkfifo(1)."
)]
struct Args {
    /// Serial device to bridge (e.g. /dev/ttyUSB0).
    device: PathBuf,

    /// FIFO carrying serial-to-client bytes (opened write-only).
    serial_to_client: PathBuf,

    /// FIFO carrying client-to-serial bytes (opened read-only).
    client_to_serial: PathBuf,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "SERBRIDGE_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "SERBRIDGE_LOG_JSON")]
    log_json: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap would exit 2; the bridge keeps the sysexits usage status.
            let kind = err.kind();
            let _ = err.print();
            return if matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(exit::USAGE)
            };
        }
    };

    tracing_init::init_tracing(
        &format!(
            "serbridge={level},serbridge_relay={level}",
            level = args.log_level
        ),
        args.log_json,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        device = %args.device.display(),
        "Starting serbridge"
    );

    match run(&args) {
        Ok(side) => {
            info!("Read end-of-file from {side}");
            ExitCode::from(exit::OK)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<Disconnect> {
    let serial = serial::open(&args.device)?;

    // Inbound first: its non-blocking open succeeds without a client,
    // while the outbound open blocks until the client starts reading.
    let c2s = fifo::open_reader(&args.client_to_serial)?;
    let s2c = fifo::open_writer(&args.serial_to_client)?;

    info!(
        serial_to_client = %args.serial_to_client.display(),
        client_to_serial = %args.client_to_serial.display(),
        "Relaying"
    );

    Relay::new(serial.as_fd(), s2c.as_fd(), c2s.as_fd()).run()
}
