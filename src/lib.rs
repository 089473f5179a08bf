//! Temperature/humidity station publishing to an MQTT broker over Wi-Fi.
//!
//! The control logic is written against the capability traits in [`wifi`],
//! [`mqtt`], [`sensor`] and [`station`], with time supplied through
//! `embedded_hal_async::delay::DelayNs`. The ESP32 implementations of those
//! traits live in `board` behind the `esp32` feature.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

#[cfg(feature = "esp32")]
extern crate alloc;

pub mod config;
pub mod constants;
pub mod measurement;
pub mod mqtt;
pub mod reading;
pub mod sensor;
pub mod station;
pub mod wifi;

#[cfg(feature = "esp32")]
pub mod board;

pub use config::{Config, CONFIG};
pub use reading::Reading;
pub use station::{Exit, SamplingLoop, SessionState};
