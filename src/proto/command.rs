use std::{fmt, str::FromStr};

use super::ProtoError;

/// SCPI commands understood by the XDM series.
///
/// The `Display` impl yields the literal wire text without terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // System
    Identify,
    RemoteMode,
    LocalMode,
    Reset,
    // Measurement
    Measure,
    MeasureVoltage,
    MeasureCurrent,
    Function,
    MeasureScreen(Screen),
    FunctionOf(Screen),
    // Configuration, `None` selects auto-range
    ConfigureVoltageDc(Option<VoltageRange>),
    ConfigureVoltageAc(Option<VoltageRange>),
    ConfigureCurrentDc(Option<CurrentRange>),
    ConfigureCurrentAc(Option<CurrentRange>),
    ConfigureResistance,
    ConfigureCapacitance,
    ConfigureFrequency,
    ConfigurePeriod,
    ConfigureDiode,
    ConfigureContinuity,
    ConfigureTemperature,
    // Temperature
    SetTemperatureUnit(TemperatureUnit),
    GetTemperatureUnit,
    // Speed
    SetRate(Speed),
    GetRate,
    // Beeper
    SetBeeper(bool),
    GetBeeper,
    Raw(RawCommand),
}

impl Command {
    pub fn is_query(&self) -> bool {
        self.to_string().ends_with('?')
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("*IDN?"),
            Command::RemoteMode => f.write_str("SYST:REM"),
            Command::LocalMode => f.write_str("SYST:LOC"),
            Command::Reset => f.write_str("*RST"),
            Command::Measure => f.write_str("MEAS?"),
            Command::MeasureVoltage => f.write_str("MEAS:VOLT?"),
            Command::MeasureCurrent => f.write_str("MEAS:CURRENT?"),
            Command::Function => f.write_str("FUNC?"),
            Command::MeasureScreen(screen) => write!(f, "MEAS{}?", screen),
            Command::FunctionOf(screen) => write!(f, "FUNC{}?", screen),
            Command::ConfigureVoltageDc(range) => {
                write!(f, "CONF:VOLT:DC {}", range_or_auto(range.map(|r| r.as_scpi())))
            }
            Command::ConfigureVoltageAc(range) => {
                write!(f, "CONF:VOLT:AC {}", range_or_auto(range.map(|r| r.as_scpi())))
            }
            Command::ConfigureCurrentDc(range) => {
                write!(f, "CONF:CURR:DC {}", range_or_auto(range.map(|r| r.as_scpi())))
            }
            Command::ConfigureCurrentAc(range) => {
                write!(f, "CONF:CURR:AC {}", range_or_auto(range.map(|r| r.as_scpi())))
            }
            Command::ConfigureResistance => f.write_str("CONF:RES AUTO"),
            Command::ConfigureCapacitance => f.write_str("CONF:CAP AUTO"),
            Command::ConfigureFrequency => f.write_str("CONF:FREQ"),
            Command::ConfigurePeriod => f.write_str("CONF:PER"),
            Command::ConfigureDiode => f.write_str("CONF:DIOD"),
            Command::ConfigureContinuity => f.write_str("CONF:CONT"),
            Command::ConfigureTemperature => f.write_str("CONF:TEMP:RTD"),
            Command::SetTemperatureUnit(unit) => write!(f, "TEMP:RTD:UNIT {}", unit),
            Command::GetTemperatureUnit => f.write_str("TEMP:RTD:UNIT?"),
            Command::SetRate(speed) => write!(f, "RATE {}", speed),
            Command::GetRate => f.write_str("RATE?"),
            Command::SetBeeper(true) => f.write_str("BEEP:STAT ON"),
            Command::SetBeeper(false) => f.write_str("BEEP:STAT OFF"),
            Command::GetBeeper => f.write_str("BEEP:STAT?"),
            Command::Raw(raw) => f.write_str(raw.as_str()),
        }
    }
}

fn range_or_auto(range: Option<&'static str>) -> &'static str {
    range.unwrap_or("AUTO")
}

/// Free-form SCPI text, checked to be a single non-empty ASCII line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand(String);

impl RawCommand {
    pub fn new(text: impl AsRef<str>) -> Result<Self, ProtoError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(ProtoError::InvalidCommand(String::from("empty command")));
        }
        if !text.is_ascii() || text.chars().any(|c| c.is_ascii_control()) {
            return Err(ProtoError::InvalidCommand(text.to_string()));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RawCommand {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltageRange {
    MilliVolt50,
    MilliVolt500,
    Volt5,
    Volt50,
    Volt1000,
}

impl VoltageRange {
    pub fn as_scpi(&self) -> &'static str {
        match self {
            VoltageRange::MilliVolt50 => "50E-3",
            VoltageRange::MilliVolt500 => "500E-3",
            VoltageRange::Volt5 => "5",
            VoltageRange::Volt50 => "50",
            VoltageRange::Volt1000 => "1000",
        }
    }
}

impl FromStr for VoltageRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "50mv" | "50e-3" => Ok(Self::MilliVolt50),
            "500mv" | "500e-3" => Ok(Self::MilliVolt500),
            "5v" | "5" => Ok(Self::Volt5),
            "50v" | "50" => Ok(Self::Volt50),
            "1000v" | "1000" => Ok(Self::Volt1000),
            _ => Err(format!("Unknown voltage range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentRange {
    MicroAmp500,
    MilliAmp5,
    MilliAmp500,
    Amp5,
    Amp10,
}

impl CurrentRange {
    pub fn as_scpi(&self) -> &'static str {
        match self {
            CurrentRange::MicroAmp500 => "500E-6",
            CurrentRange::MilliAmp5 => "5E-3",
            CurrentRange::MilliAmp500 => "500E-3",
            CurrentRange::Amp5 => "5",
            CurrentRange::Amp10 => "10",
        }
    }
}

impl FromStr for CurrentRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "500ua" | "500e-6" => Ok(Self::MicroAmp500),
            "5ma" | "5e-3" => Ok(Self::MilliAmp5),
            "500ma" | "500e-3" => Ok(Self::MilliAmp500),
            "5a" | "5" => Ok(Self::Amp5),
            "10a" | "10" => Ok(Self::Amp10),
            _ => Err(format!("Unknown current range: {}", s)),
        }
    }
}

/// Measurement rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Slow,
    Medium,
    Fast,
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speed::Slow => f.write_str("S"),
            Speed::Medium => f.write_str("M"),
            Speed::Fast => f.write_str("F"),
        }
    }
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "slow" => Ok(Self::Slow),
            "m" | "medium" => Ok(Self::Medium),
            "f" | "fast" => Ok(Self::Fast),
            _ => Err(format!("Unknown rate: {}", s)),
        }
    }
}

/// Unit of the RTD temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("C"),
            TemperatureUnit::Fahrenheit => f.write_str("F"),
            TemperatureUnit::Kelvin => f.write_str("K"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            "k" | "kelvin" => Ok(Self::Kelvin),
            _ => Err(format!("Unknown temperature unit: {}", s)),
        }
    }
}

/// Numbered readout of the dual display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    First,
    Second,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::First => f.write_str("1"),
            Screen::Second => f.write_str("2"),
        }
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "first" => Ok(Self::First),
            "2" | "second" => Ok(Self::Second),
            _ => Err(format!("Unknown display: {}", s)),
        }
    }
}
