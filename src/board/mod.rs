//! ESP32 implementations of the station's capability traits.

pub mod bme280;
pub mod mqtt;
pub mod transport;
pub mod wifi;

pub use self::bme280::Bme280;
pub use self::mqtt::{MqttBroker, MqttSession};
pub use self::wifi::EspRadio;

use crate::station::System;

pub struct Esp32;

impl System for Esp32 {
    fn restart(&mut self) {
        esp_hal::system::software_reset()
    }
}
