//! Fixed-interval voltage/current logging.
//!
//! A [`Sampler`] owns the [`Device`] for the whole run. Each cycle re-asserts
//! the measurement configuration, queries the reading and appends a
//! [`Sample`]. Cycles that fail with a recoverable error are skipped; any
//! other error ends the run. Whatever was collected is returned in a [`Run`].

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::device::Device;
use crate::measurement::{Sample, Series};
use crate::proto::{command::Command, ProtoError, Result};

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Target spacing between cycle starts.
    pub interval: Duration,
    /// `None` samples until stopped.
    pub duration: Option<Duration>,
    /// Also configure and read DC current each cycle.
    pub log_current: bool,
    /// Wait after each configuration command before measuring.
    pub settle: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            duration: Some(Duration::from_secs(60)),
            log_current: false,
            settle: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DurationElapsed,
    StopRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Connected,
    Sampling,
    Stopped(StopReason),
    Failed,
}

/// Outcome of [`Sampler::run`].
#[derive(Debug)]
pub struct Run {
    pub identity: Option<String>,
    pub samples: Series,
    pub state: State,
    pub cycles: usize,
    pub skipped: usize,
    /// Set when `state` is [`State::Failed`].
    pub error: Option<ProtoError>,
}

/// Time left in the current interval after a cycle took `cycle`.
pub fn pause_before_next(interval: Duration, cycle: Duration) -> Duration {
    interval.saturating_sub(cycle)
}

pub struct Sampler {
    device: Device,
    config: SamplerConfig,
    state: State,
    identity: Option<String>,
    series: Series,
    cycles: usize,
    skipped: usize,
}

impl Sampler {
    pub fn new(device: Device, config: SamplerConfig) -> Self {
        Self {
            device,
            config,
            state: State::Idle,
            identity: None,
            series: Series::new(),
            cycles: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Ask the meter who it is. The answer is informational only.
    pub async fn connect(&mut self) -> Result<&str> {
        match self.device.query(Command::Identify).await {
            Ok(id) => {
                info!(identity = %id, "instrument connected");
                self.state = State::Connected;
                Ok(self.identity.insert(id).as_str())
            }
            Err(err) => {
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    /// Sample until the configured duration passes, `stop` is cancelled or
    /// the connection fails. The device is released when this returns.
    pub async fn run(mut self, stop: CancellationToken, mut on_sample: impl FnMut(&Sample)) -> Run {
        match self.state {
            State::Idle => {
                let connected = self.connect().await.map(|_| ());
                if let Err(err) = connected {
                    error!(error = %err, "no answer to identification");
                    return self.finish(State::Failed, Some(err));
                }
            }
            State::Failed => {
                error!("connection failed earlier, not sampling");
                return self.finish(State::Failed, None);
            }
            _ => {}
        }

        info!(
            interval = ?self.config.interval,
            duration = ?self.config.duration,
            current = self.config.log_current,
            "sampling started"
        );
        self.state = State::Sampling;
        let started = Instant::now();

        let (state, failure) = loop {
            if stop.is_cancelled() {
                break (State::Stopped(StopReason::StopRequested), None);
            }
            let cycle_start = Instant::now();
            let elapsed = cycle_start - started;
            if let Some(limit) = self.config.duration {
                if elapsed >= limit {
                    break (State::Stopped(StopReason::DurationElapsed), None);
                }
            }

            self.cycles += 1;
            match self.measure_cycle(elapsed).await {
                Ok(sample) => match self.series.push(sample) {
                    Ok(()) => on_sample(&sample),
                    Err(rejected) => {
                        warn!(elapsed = ?rejected.elapsed, "sample out of order, dropped")
                    }
                },
                Err(err) if err.is_recoverable() => {
                    self.skipped += 1;
                    warn!(cycle = self.cycles, error = %err, "measurement failed, sample skipped");
                }
                Err(err) => {
                    error!(cycle = self.cycles, error = %err, "connection failed, sampling aborted");
                    break (State::Failed, Some(err));
                }
            }

            let mut pause = pause_before_next(self.config.interval, cycle_start.elapsed());
            if let Some(limit) = self.config.duration {
                pause = pause.min(limit.saturating_sub(started.elapsed()));
            }
            if pause.is_zero() {
                continue;
            }
            debug!(?pause, "waiting for next cycle");
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = stop.cancelled() => break (State::Stopped(StopReason::StopRequested), None),
            }
        };

        self.finish(state, failure)
    }

    async fn measure_cycle(&mut self, elapsed: Duration) -> Result<Sample> {
        self.device.configure_voltage_dc(None).await?;
        self.settle().await;
        let voltage = self.device.measure_voltage().await?;

        let current = if self.config.log_current {
            self.device.configure_current_dc(None).await?;
            self.settle().await;
            Some(self.device.measure_current().await?)
        } else {
            None
        };

        Ok(Sample {
            elapsed,
            voltage,
            current,
        })
    }

    async fn settle(&self) {
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }
    }

    fn finish(self, state: State, error: Option<ProtoError>) -> Run {
        info!(
            ?state,
            samples = self.series.len(),
            skipped = self.skipped,
            "sampling finished, releasing connection"
        );
        Run {
            identity: self.identity,
            samples: self.series,
            state,
            cycles: self.cycles,
            skipped: self.skipped,
            error,
        }
    }
}
