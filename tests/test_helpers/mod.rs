//! Test Helpers
//!
//! Scripted fakes for every capability the station depends on, plus a
//! simulated clock. Delays return immediately and only advance the clock,
//! so timing properties are asserted against simulated time.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal_async::delay::DelayNs;

use esp32_weather_station::mqtt::{self, Broker, Endpoint, Session};
use esp32_weather_station::reading::Reading;
use esp32_weather_station::sensor::{Sensor, SensorError};
use esp32_weather_station::station::System;
use esp32_weather_station::wifi::{self, Radio};
use esp32_weather_station::Config;

pub const STATION_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

pub fn test_config() -> Config {
    Config {
        device_id: "test-station",
        location: "Test Lab",
        wifi_ssid: "test-network",
        wifi_psk: "test-password",
        wifi_connect_attempts: 20,
        wifi_poll_interval_ms: 500,
        mqtt_hostname: "broker.test",
        mqtt_port: 1883,
        mqtt_username: None,
        mqtt_password: None,
        mqtt_topic_temperature: "station/temp",
        mqtt_topic_humidity: "station/humi",
        mqtt_topic_climate: None,
        measurement_interval_seconds: 30,
        error_backoff_seconds: 10,
        restart_delay_seconds: 5,
        reconnect_on_publish_failure: false,
    }
}

pub fn reading(temperature: f32, humidity: f32) -> Reading {
    Reading::new(temperature, humidity).expect("valid test reading")
}

// ============================================================================
// Clock
// ============================================================================

/// Simulated time shared by every fake created from it.
#[derive(Clone, Default)]
pub struct Clock {
    now_ns: Rc<Cell<u64>>,
    stop_at_ns: Rc<Cell<Option<u64>>>,
    stop: Rc<AtomicBool>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            clock: self.clone(),
        }
    }

    /// Stop flag raised once simulated time reaches `ms`.
    pub fn stop_at_ms(&self, ms: u64) -> Rc<AtomicBool> {
        self.stop_at_ns.set(Some(ms * 1_000_000));
        self.stop.clone()
    }

    fn advance(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
        if let Some(deadline) = self.stop_at_ns.get() {
            if self.now_ns.get() >= deadline {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }
}

pub struct SimDelay {
    clock: Clock,
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(u64::from(ns));
    }
}

// ============================================================================
// Radio
// ============================================================================

pub struct FakeRadio {
    clock: Clock,
    /// Poll on which the address appears, `None` for never
    pub up_on_poll: Option<usize>,
    pub activate_result: Result<(), wifi::Error>,
    pub activations: u32,
    pub associations: Vec<(String, String)>,
    /// Clock time in ms of every address poll
    pub polls: RefCell<Vec<u64>>,
}

impl FakeRadio {
    pub fn up_on_poll(clock: &Clock, poll: usize) -> Self {
        Self::new(clock, Some(poll))
    }

    pub fn never_up(clock: &Clock) -> Self {
        Self::new(clock, None)
    }

    fn new(clock: &Clock, up_on_poll: Option<usize>) -> Self {
        Self {
            clock: clock.clone(),
            up_on_poll,
            activate_result: Ok(()),
            activations: 0,
            associations: Vec::new(),
            polls: RefCell::new(Vec::new()),
        }
    }

    pub fn poll_count(&self) -> usize {
        self.polls.borrow().len()
    }
}

impl Radio for FakeRadio {
    async fn activate(&mut self) -> Result<(), wifi::Error> {
        self.activations += 1;
        self.activate_result
    }

    async fn associate(&mut self, ssid: &str, psk: &str) -> Result<(), wifi::Error> {
        self.associations.push((ssid.to_string(), psk.to_string()));
        Ok(())
    }

    fn address(&self) -> Option<Ipv4Addr> {
        let mut polls = self.polls.borrow_mut();
        polls.push(self.clock.now_ms());

        match self.up_on_poll {
            Some(n) if polls.len() >= n => Some(STATION_IP),
            _ => None,
        }
    }
}

// ============================================================================
// Broker
// ============================================================================

/// Everything the fake broker and its sessions observed.
#[derive(Default)]
pub struct BrokerLog {
    pub connect_results: RefCell<VecDeque<Result<(), mqtt::Error>>>,
    pub publish_results: RefCell<VecDeque<Result<(), mqtt::Error>>>,
    pub endpoints: RefCell<Vec<Endpoint>>,
    /// Successfully published (topic, payload) pairs in order
    pub published: RefCell<Vec<(String, String)>>,
    pub publish_attempts: Cell<u32>,
    pub sessions_alive: Cell<u32>,
    pub max_sessions_alive: Cell<u32>,
}

impl BrokerLog {
    pub fn connects(&self) -> usize {
        self.endpoints.borrow().len()
    }

    pub fn payloads_for(&self, topic: &str) -> Vec<String> {
        self.published
            .borrow()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn published_count(&self) -> usize {
        self.published.borrow().len()
    }
}

#[derive(Clone, Default)]
pub struct FakeBroker {
    pub log: Rc<BrokerLog>,
}

impl FakeBroker {
    /// Broker accepting every connect and publish.
    pub fn available() -> Self {
        Self::default()
    }

    /// Broker answering the next connects with `results`, then accepting.
    pub fn with_connects(results: &[Result<(), mqtt::Error>]) -> Self {
        let broker = Self::default();
        broker
            .log
            .connect_results
            .borrow_mut()
            .extend(results.iter().copied());
        broker
    }

    /// Scripts the next publishes; later ones succeed.
    pub fn script_publishes(&self, results: &[Result<(), mqtt::Error>]) {
        self.log
            .publish_results
            .borrow_mut()
            .extend(results.iter().copied());
    }
}

pub struct FakeSession {
    log: Rc<BrokerLog>,
}

impl Broker for FakeBroker {
    type Session = FakeSession;

    async fn connect(&mut self, endpoint: &Endpoint) -> Result<FakeSession, mqtt::Error> {
        self.log.endpoints.borrow_mut().push(*endpoint);
        self.log
            .connect_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()))?;

        let alive = self.log.sessions_alive.get() + 1;
        self.log.sessions_alive.set(alive);
        self.log
            .max_sessions_alive
            .set(alive.max(self.log.max_sessions_alive.get()));

        Ok(FakeSession {
            log: self.log.clone(),
        })
    }
}

impl Session for FakeSession {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), mqtt::Error> {
        self.log
            .publish_attempts
            .set(self.log.publish_attempts.get() + 1);
        self.log
            .publish_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()))?;

        self.log.published.borrow_mut().push((
            topic.to_string(),
            String::from_utf8(payload.to_vec()).expect("utf-8 payload"),
        ));
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.log
            .sessions_alive
            .set(self.log.sessions_alive.get() - 1);
    }
}

// ============================================================================
// Sensor
// ============================================================================

#[derive(Default)]
pub struct SensorLog {
    pub script: RefCell<VecDeque<Result<Reading, SensorError>>>,
    pub measures: Cell<u32>,
}

/// Sensor returning scripted results, then `fallback` forever.
#[derive(Clone)]
pub struct FakeSensor {
    pub log: Rc<SensorLog>,
    fallback: Reading,
}

impl FakeSensor {
    pub fn steady(temperature: f32, humidity: f32) -> Self {
        Self {
            log: Rc::default(),
            fallback: reading(temperature, humidity),
        }
    }

    pub fn script(&self, results: &[Result<Reading, SensorError>]) {
        self.log.script.borrow_mut().extend(results.iter().copied());
    }

    pub fn measures(&self) -> u32 {
        self.log.measures.get()
    }
}

impl Sensor for FakeSensor {
    async fn measure(&mut self) -> Result<Reading, SensorError> {
        self.log.measures.set(self.log.measures.get() + 1);
        self.log
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }
}

// ============================================================================
// System
// ============================================================================

pub struct FakeSystem {
    clock: Clock,
    /// Clock time in ms of every restart request
    pub restarts: Vec<u64>,
}

impl FakeSystem {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            restarts: Vec::new(),
        }
    }
}

impl System for FakeSystem {
    fn restart(&mut self) {
        self.restarts.push(self.clock.now_ms());
    }
}
