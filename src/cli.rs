//! Pieces shared by the `xdmlog` and `xdmcmd` binaries.

use clap::{arg, value_parser, Arg, ArgMatches};
use std::io::ErrorKind;
use std::process::exit;
use std::time::Duration;
use tracing::Level;

use crate::proto::{resource::Resource, ProtoError};
use crate::{Device, Result, DEFAULT_BAUDRATE, DEFAULT_TTY};

/// Port, baudrate, read timeout and verbosity flags.
pub fn connection_args() -> Vec<Arg> {
    vec![
        arg!(
            -p --port <RESOURCE> "Serial port or VISA resource (ASRL3::INSTR, TCPIP0::host::5025::SOCKET)"
        )
        .default_value(DEFAULT_TTY)
        .required(false)
        .value_parser(value_parser!(Resource)),
        arg!(
            -b --baudrate <BAUDRATE> "Baudrate"
        )
        .default_value(DEFAULT_BAUDRATE.to_string())
        .value_parser(value_parser!(u32)),
        arg!(
            --timeout <MS> "Reply timeout in milliseconds"
        )
        .default_value("2000")
        .value_parser(millis),
        arg!(
            -d --debug ... "Turn debugging information on"
        ),
    ]
}

pub fn millis(s: &str) -> std::result::Result<Duration, String> {
    let ms = s
        .parse::<u64>()
        .map_err(|e| format!("{}: {}", s, e))?;
    if ms == 0 {
        return Err(String::from("must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

/// Fractional seconds, zero allowed.
pub fn seconds(s: &str) -> std::result::Result<Duration, String> {
    let secs = s
        .parse::<f64>()
        .map_err(|e| format!("{}: {}", s, e))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("{}: not a valid number of seconds", s))
}

/// Fractional seconds greater than zero.
pub fn positive_seconds(s: &str) -> std::result::Result<Duration, String> {
    match seconds(s)? {
        d if d.is_zero() => Err(String::from("must be greater than zero")),
        d => Ok(d),
    }
}

/// Log to stderr; each `-d` raises the level by one step from WARN.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

pub fn resource(matches: &ArgMatches) -> Resource {
    matches
        .get_one::<Resource>("port")
        .cloned()
        .unwrap_or_else(|| Resource::Serial(DEFAULT_TTY.to_string()))
}

pub async fn open_device(matches: &ArgMatches) -> Result<Device> {
    let baud_rate = matches
        .get_one::<u32>("baudrate")
        .unwrap_or(&DEFAULT_BAUDRATE);
    let timeout = matches
        .get_one::<Duration>("timeout")
        .copied()
        .unwrap_or(crate::DEFAULT_TIMEOUT);

    Device::open(&resource(matches), *baud_rate, timeout).await
}

/// Print a message for `err` and terminate the process.
pub fn report_error(err: &ProtoError, resource: &Resource) -> ! {
    match err {
        ProtoError::Serial(err) => {
            if err.kind() == tokio_serial::ErrorKind::NoDevice
                || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
            {
                eprintln!("{}: File not found", resource);
            } else {
                eprintln!("I/O Error: {} [device: {}]", err, resource);
            }
        }
        ProtoError::Io(err) => {
            if err.kind() == ErrorKind::NotFound {
                eprintln!("{}: File not found", resource);
            } else {
                eprintln!("I/O Error: {} [device: {}]", err, resource);
            }
        }
        ProtoError::Timeout(after) => {
            eprintln!(
                "No answer from {} within {:?}, is the meter switched on?",
                resource, after
            );
        }
        ProtoError::Malformed(text) => {
            eprintln!("Received an unexpected response from device: {}", text);
        }
        ProtoError::InvalidCommand(text) => {
            eprintln!("Invalid command: {}", text);
        }
        ProtoError::InvalidResource(text) => {
            eprintln!("Invalid resource: {}", text);
        }
        ProtoError::Abort => {
            eprintln!("Failed to communicate with device, aborting!");
        }
    }
    exit(-1);
}
