use futures::{FutureExt, SinkExt, StreamExt};
use std::{pin::Pin, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};
use tokio_util::codec::{Decoder, Framed};
use tracing::{debug, trace, warn};

use crate::measurement::{parse_reading, Unit};
use crate::proto::{
    codec::ScpiCodec,
    command::{Command, CurrentRange, Screen, Speed, TemperatureUnit, VoltageRange},
    resource::Resource,
    response::{parse_switch, Ident},
    ProtoError, Result,
};

trait Port: AsyncRead + AsyncWrite + Send {}

impl<T> Port for T where T: AsyncRead + AsyncWrite + Send {}

/// An open connection to one meter.
///
/// Every read waits at most `timeout`; the connection is closed on drop.
pub struct Device {
    stream: Framed<Pin<Box<dyn Port>>, ScpiCodec>,
    timeout: Duration,
}

impl Device {
    pub async fn open(resource: &Resource, baudrate: u32, timeout: Duration) -> Result<Self> {
        let port: Pin<Box<dyn Port>> = match resource {
            Resource::Serial(path) => {
                #[allow(unused_mut)]
                let mut serial = tokio_serial::new(path.as_str(), baudrate)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .flow_control(FlowControl::None)
                    .open_native_async()?;

                #[cfg(unix)]
                serial.set_exclusive(false)?;

                Box::pin(serial)
            }
            Resource::Socket { host, port } => {
                let stream = tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), *port)))
                    .await
                    .map_err(|_| ProtoError::Timeout(timeout))??;
                stream.set_nodelay(true)?;
                Box::pin(stream)
            }
        };
        debug!(%resource, baudrate, "connection opened");

        Ok(Self::from_port(port, timeout))
    }

    fn from_port(port: Pin<Box<dyn Port>>, timeout: Duration) -> Self {
        Self {
            stream: ScpiCodec.framed(port),
            timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_faked(fake: crate::proto::fake::FakeInstrument, timeout: Duration) -> Self {
        Self::from_port(Box::pin(fake), timeout)
    }

    /// Write `command` and, if `expect_response` is set, wait for its reply line.
    pub async fn send(&mut self, command: Command, expect_response: bool) -> Result<Option<String>> {
        trace!(%command, "send");
        self.discard_stale()?;
        self.stream.send(command).await?;
        if expect_response {
            self.read_line().await.map(Some)
        } else {
            Ok(None)
        }
    }

    pub async fn write(&mut self, command: Command) -> Result<()> {
        self.send(command, false).await.map(|_| ())
    }

    pub async fn query(&mut self, command: Command) -> Result<String> {
        self.send(command, true).await?.ok_or(ProtoError::Abort)
    }

    /// Drop replies that arrived after their query timed out, so the next
    /// read returns the answer to the next command.
    fn discard_stale(&mut self) -> Result<()> {
        while let Some(next) = self.stream.next().now_or_never() {
            match next {
                Some(Ok(line)) => warn!(%line, "discarding late response"),
                Some(Err(ioerr)) => return Err(ioerr.into()),
                None => return Err(ProtoError::Abort),
            }
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.stream.next()).await {
            Ok(Some(Ok(line))) => {
                trace!(%line, "recv");
                Ok(line)
            }
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(ProtoError::Abort),
            Err(_) => {
                // Start the next exchange without a stale half line.
                let stale = self.stream.read_buffer().len();
                if stale > 0 {
                    warn!(bytes = stale, "dropping partial response");
                }
                self.stream.read_buffer_mut().clear();
                Err(ProtoError::Timeout(self.timeout))
            }
        }
    }

    pub async fn ident(&mut self) -> Result<Ident> {
        let line = self.query(Command::Identify).await?;
        Ident::try_from(line.as_str())
    }

    pub async fn set_remote(&mut self) -> Result<()> {
        self.write(Command::RemoteMode).await
    }

    pub async fn set_local(&mut self) -> Result<()> {
        self.write(Command::LocalMode).await
    }

    pub async fn reset(&mut self) -> Result<()> {
        self.write(Command::Reset).await
    }

    pub async fn configure_voltage_dc(&mut self, range: Option<VoltageRange>) -> Result<()> {
        self.write(Command::ConfigureVoltageDc(range)).await
    }

    pub async fn configure_voltage_ac(&mut self, range: Option<VoltageRange>) -> Result<()> {
        self.write(Command::ConfigureVoltageAc(range)).await
    }

    pub async fn configure_current_dc(&mut self, range: Option<CurrentRange>) -> Result<()> {
        self.write(Command::ConfigureCurrentDc(range)).await
    }

    pub async fn configure_current_ac(&mut self, range: Option<CurrentRange>) -> Result<()> {
        self.write(Command::ConfigureCurrentAc(range)).await
    }

    pub async fn configure_resistance(&mut self) -> Result<()> {
        self.write(Command::ConfigureResistance).await
    }

    pub async fn configure_capacitance(&mut self) -> Result<()> {
        self.write(Command::ConfigureCapacitance).await
    }

    pub async fn configure_frequency(&mut self) -> Result<()> {
        self.write(Command::ConfigureFrequency).await
    }

    pub async fn configure_period(&mut self) -> Result<()> {
        self.write(Command::ConfigurePeriod).await
    }

    pub async fn configure_diode(&mut self) -> Result<()> {
        self.write(Command::ConfigureDiode).await
    }

    pub async fn configure_continuity(&mut self) -> Result<()> {
        self.write(Command::ConfigureContinuity).await
    }

    pub async fn configure_temperature(&mut self) -> Result<()> {
        self.write(Command::ConfigureTemperature).await
    }

    pub async fn temperature_unit(&mut self) -> Result<TemperatureUnit> {
        let line = self.query(Command::GetTemperatureUnit).await?;
        line.parse::<TemperatureUnit>().map_err(ProtoError::Malformed)
    }

    pub async fn set_temperature_unit(&mut self, unit: TemperatureUnit) -> Result<()> {
        self.write(Command::SetTemperatureUnit(unit)).await
    }

    pub async fn measure_voltage(&mut self) -> Result<f64> {
        let line = self.query(Command::MeasureVoltage).await?;
        parse_reading(&line, Unit::Volt)
    }

    pub async fn measure_current(&mut self) -> Result<f64> {
        let line = self.query(Command::MeasureCurrent).await?;
        parse_reading(&line, Unit::Ampere)
    }

    /// Reading of the active function, unit included.
    pub async fn measure(&mut self) -> Result<String> {
        self.query(Command::Measure).await
    }

    /// Reading shown on one of the numbered displays.
    pub async fn measure_screen(&mut self, screen: Screen) -> Result<String> {
        self.query(Command::MeasureScreen(screen)).await
    }

    pub async fn function(&mut self) -> Result<String> {
        self.query(Command::Function).await
    }

    pub async fn function_of(&mut self, screen: Screen) -> Result<String> {
        self.query(Command::FunctionOf(screen)).await
    }

    pub async fn rate(&mut self) -> Result<Speed> {
        let line = self.query(Command::GetRate).await?;
        line.parse::<Speed>().map_err(ProtoError::Malformed)
    }

    pub async fn set_rate(&mut self, speed: Speed) -> Result<()> {
        self.write(Command::SetRate(speed)).await
    }

    pub async fn beeper(&mut self) -> Result<bool> {
        let line = self.query(Command::GetBeeper).await?;
        parse_switch(&line)
    }

    pub async fn set_beeper(&mut self, state: bool) -> Result<()> {
        self.write(Command::SetBeeper(state)).await
    }
}
