//!
//! This library provides SCPI communication with OWON XDM digital multimeters
//! and a fixed-interval voltage/current logger on top of it.
//!
//! <br>
//!
//! # Details
//!
//! - The meter is reached over its USB serial port, or over a raw TCP socket
//!   for models with a LAN interface. VISA style names (`ASRL3::INSTR`,
//!   `TCPIP0::192.168.1.20::5025::SOCKET`) are accepted.
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use xdmctrl::proto::resource::Resource;
//!   use xdmctrl::{Device, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT};
//!   #[tokio::main]
//!   async fn main() -> xdmctrl::Result<()> {
//!       let resource = "/dev/ttyUSB0".parse::<Resource>()?;
//!       let mut device = Device::open(&resource, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT).await?;
//!       eprintln!("Connected to: {}\n", device.ident().await?.model);
//!       println!("{} V", device.measure_voltage().await?);
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * OWON XDM1041
//!  * OWON XDM1141
//!

pub mod cli;
pub mod device;
pub mod measurement;
pub mod output;
pub mod proto;
pub mod sampler;

use std::time::Duration;

pub use device::Device;
pub use proto::Result;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for the XDM series.
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// How long a query waits for its reply line.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
