//! Startup sequence and the sampling loop.
//!
//! ```text
//!               connect ok
//!   NoSession ─────────────▶ HasSession ──┐
//!    ▲    │                    │   ▲      │ publish cycle, ok or failed
//!    └────┘ connect fails      │   └──────┘
//!                              │
//!   NoSession ◀────────────────┘ publish failed, reconnect_on_publish_failure set
//! ```
//!
//! Every iteration ends with the measurement interval, or with the error
//! backoff when an unexpected fault reached the loop boundary. The stop flag
//! is only looked at between iterations.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use crate::config::Config;
use crate::constants::VERSION;
use crate::measurement;
use crate::mqtt::{self, Broker};
use crate::reading::Reading;
use crate::sensor::Sensor;
use crate::wifi::{LinkState, Radio, Wifi};

/// Broker session held by the sampling loop. There is never more than one.
#[derive(Debug)]
pub enum SessionState<S> {
    NoSession,
    HasSession(S),
}

impl<S> SessionState<S> {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::HasSession(_))
    }
}

/// Fault that escaped an iteration and is handled at the loop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Encoding,
}

/// What happened during one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Value of the reading counter for this iteration
    pub reading: u32,
    /// Outcome of the reconnect attempt, if the iteration started without a session
    pub reconnect: Option<Result<(), mqtt::Error>>,
    /// Outcome of the publish cycle, if one ran
    pub cycle: Option<Result<Reading, measurement::Error>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Wi-Fi never came up and a device restart was requested
    Restart,
    /// The stop flag was raised
    Stopped,
}

/// Device level controls.
pub trait System {
    /// Requests a full device reset. On hardware this does not return.
    fn restart(&mut self);
}

pub struct SamplingLoop<'a, B: Broker, S, D> {
    config: &'a Config,
    broker: B,
    sensor: S,
    delay: D,
    session: SessionState<B::Session>,
    readings: u32,
}

impl<'a, B, S, D> SamplingLoop<'a, B, S, D>
where
    B: Broker,
    S: Sensor,
    D: DelayNs,
{
    /// Creates the loop in `NoSession`.
    pub fn new(config: &'a Config, broker: B, sensor: S, delay: D) -> Self {
        Self {
            config,
            broker,
            sensor,
            delay,
            session: SessionState::NoSession,
            readings: 0,
        }
    }

    /// Creates the loop after one broker connect attempt. A failed attempt
    /// leaves the loop in `NoSession`; the first iteration retries.
    pub async fn start(config: &'a Config, broker: B, sensor: S, delay: D) -> Self {
        let mut sampling = Self::new(config, broker, sensor, delay);

        match mqtt::connect(&mut sampling.broker, config).await {
            Ok(session) => sampling.session = SessionState::HasSession(session),
            Err(_) => warn!("MQTT failed! Will retry..."),
        }

        sampling
    }

    pub fn session(&self) -> &SessionState<B::Session> {
        &self.session
    }

    pub fn readings(&self) -> u32 {
        self.readings
    }

    /// One pass of the state machine, without the trailing sleep.
    pub async fn iterate(&mut self) -> Result<IterationReport, Fault> {
        self.readings = self.readings.wrapping_add(1);
        info!("Reading #{}", self.readings);

        let mut report = IterationReport {
            reading: self.readings,
            reconnect: None,
            cycle: None,
        };

        if let SessionState::NoSession = self.session {
            info!("[RECONNECT] No broker session");
            match mqtt::connect(&mut self.broker, self.config).await {
                Ok(session) => {
                    self.session = SessionState::HasSession(session);
                    report.reconnect = Some(Ok(()));
                }
                Err(e) => {
                    report.reconnect = Some(Err(e));
                    return Ok(report);
                }
            }
        }

        if let SessionState::HasSession(session) = &mut self.session {
            let cycle =
                measurement::publish_cycle(&mut self.sensor, session, self.config).await;

            match cycle {
                Err(e) if !e.is_recoverable() => return Err(Fault::Encoding),
                Err(measurement::Error::Publish(..))
                    if self.config.reconnect_on_publish_failure =>
                {
                    warn!("Dropping broker session after publish failure");
                    self.session = SessionState::NoSession;
                }
                _ => {}
            }

            report.cycle = Some(cycle);
        }

        Ok(report)
    }

    /// Loop boundary policy: log the fault and return the backoff to apply
    /// before the next iteration, in milliseconds.
    pub fn recover(&self, fault: Fault) -> u32 {
        error!(
            "Loop error: {:?}, backing off {}s",
            fault, self.config.error_backoff_seconds
        );
        self.config.error_backoff_ms()
    }

    /// One iteration followed by the measurement interval, or by the error
    /// backoff if the iteration faulted.
    pub async fn step(&mut self) -> Result<IterationReport, Fault> {
        let result = self.iterate().await;

        let pause_ms = match result {
            Ok(_) => self.config.measurement_interval_ms(),
            Err(fault) => self.recover(fault),
        };
        self.delay.delay_ms(pause_ms).await;

        result
    }

    /// Runs until `stop` is raised.
    pub async fn run(&mut self, stop: &AtomicBool) {
        info!(
            "Publishing sensor data every {} seconds...",
            self.config.measurement_interval_seconds
        );

        while !stop.load(Ordering::Relaxed) {
            // Failures were logged and answered inside the step
            let _ = self.step().await;
        }

        info!("Stopped! {} readings taken", self.readings);
    }
}

/// Startup sequence: bring up Wi-Fi, connect to the broker, then sample
/// until stopped.
///
/// Wi-Fi failure is fatal for this boot: after `restart_delay_seconds` a
/// device restart is requested and nothing else runs.
pub async fn run<R, B, S, D, Y>(
    config: &Config,
    wifi: &mut Wifi<R>,
    broker: B,
    sensor: S,
    mut delay: D,
    system: &mut Y,
    stop: &AtomicBool,
) -> Exit
where
    R: Radio,
    B: Broker,
    S: Sensor,
    D: DelayNs,
    Y: System,
{
    info!("ESP32 Weather Station v{}", VERSION);

    if let LinkState::Down = wifi.connect(config, &mut delay).await {
        error!(
            "WiFi failed! Restarting in {}s...",
            config.restart_delay_seconds
        );
        delay.delay_ms(config.restart_delay_ms()).await;
        system.restart();
        return Exit::Restart;
    }

    let mut sampling = SamplingLoop::start(config, broker, sensor, delay).await;
    sampling.run(stop).await;

    Exit::Stopped
}
