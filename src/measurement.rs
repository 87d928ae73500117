use std::{fmt, time::Duration};

use serde::{Serialize, Serializer};

use crate::proto::{ProtoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Volt,
    Ampere,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parse a reading such as `1.23400V` or `-2.5E-3A`.
///
/// One trailing unit symbol is stripped if present.
pub fn parse_reading(text: &str, unit: Unit) -> Result<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix(unit.symbol()).unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ProtoError::Malformed(format!(
            "expected a reading in {}, got {:?}",
            unit, text
        ))),
    }
}

fn as_secs<S: Serializer>(elapsed: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64())
}

/// One logged point. `elapsed` is measured from the start of sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    #[serde(rename = "elapsed_s", serialize_with = "as_secs")]
    pub elapsed: Duration,
    #[serde(rename = "voltage_V")]
    pub voltage: f64,
    #[serde(rename = "current_A")]
    pub current: Option<f64>,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6.1}, {:9.5}",
            self.elapsed.as_secs_f64(),
            self.voltage
        )?;
        match self.current {
            Some(current) => write!(f, ", {:9.5}", current),
            None => f.write_str(",         -"),
        }
    }
}

/// Append-only, strictly time-ascending sequence of samples.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sample`, handing it back if it is not later than the last one.
    pub fn push(&mut self, sample: Sample) -> std::result::Result<(), Sample> {
        match self.samples.last() {
            Some(last) if sample.elapsed <= last.elapsed => Err(sample),
            _ => {
                self.samples.push(sample);
                Ok(())
            }
        }
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}
