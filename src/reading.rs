use core::fmt::{self, Write};

use heapless::String;

use crate::constants::{CLIMATE_PAYLOAD_SIZE, VALUE_PAYLOAD_SIZE};
use crate::sensor::SensorError;

// Magnus coefficients for the dew point
const MAGNUS_A: f32 = 17.27;
const MAGNUS_B: f32 = 237.7;

/// Decimal text published on the temperature and humidity topics.
pub type ValuePayload = String<VALUE_PAYLOAD_SIZE>;

/// JSON object published on the climate topic.
pub type ClimatePayload = String<CLIMATE_PAYLOAD_SIZE>;

/// One temperature/humidity measurement. Consumed by the publish cycle and
/// never retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
}

/// Values derived from a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    /// Dew point in degrees Celsius
    pub dew_point: f32,
    /// Absolute humidity in g/m³
    pub absolute_humidity: f32,
    /// Temperature minus dew point
    pub dew_point_depression: f32,
}

impl Reading {
    /// Builds a reading, rejecting values a healthy sensor cannot produce.
    pub fn new(temperature: f32, humidity: f32) -> Result<Self, SensorError> {
        if !temperature.is_finite() || !(0.0..=100.0).contains(&humidity) {
            return Err(SensorError::InvalidData);
        }

        Ok(Self {
            temperature,
            humidity,
        })
    }

    pub fn temperature_payload(&self) -> Result<ValuePayload, fmt::Error> {
        format_value(self.temperature)
    }

    pub fn humidity_payload(&self) -> Result<ValuePayload, fmt::Error> {
        format_value(self.humidity)
    }

    pub fn climate(&self) -> Climate {
        let t = self.temperature;
        let alpha = (MAGNUS_A * t) / (MAGNUS_B + t) + libm::logf(self.humidity / 100.0);
        let dew_point = (MAGNUS_B * alpha) / (MAGNUS_A - alpha);

        // Saturation vapour pressure in hPa times RH in percent gives Pa
        let vapour_pressure = 6.112 * libm::expf((17.67 * t) / (t + 243.5)) * self.humidity;
        let absolute_humidity = vapour_pressure / (461.5 * (t + 273.15)) * 1000.0;

        Climate {
            dew_point,
            absolute_humidity,
            dew_point_depression: t - dew_point,
        }
    }

    pub fn climate_payload(&self, location: &str) -> Result<ClimatePayload, fmt::Error> {
        let climate = self.climate();
        let mut payload = ClimatePayload::new();

        payload.push_str("{\"location\": \"").map_err(|_| fmt::Error)?;
        write_escaped(&mut payload, location)?;
        payload.push('"').map_err(|_| fmt::Error)?;

        write_number(&mut payload, "temperature", self.temperature)?;
        write_number(&mut payload, "humidity", self.humidity)?;
        write_number(&mut payload, "dewPoint", climate.dew_point)?;
        write_number(&mut payload, "absoluteHumidity", climate.absolute_humidity)?;
        write_number(
            &mut payload,
            "dewPointDepression",
            climate.dew_point_depression,
        )?;
        write!(payload, "}}")?;

        Ok(payload)
    }
}

// JSON has no NaN or infinity; dry air (0 % RH) has no dew point
fn write_number(payload: &mut ClimatePayload, key: &str, value: f32) -> fmt::Result {
    if value.is_finite() {
        write!(payload, ", \"{}\": {:.2}", key, value)
    } else {
        write!(payload, ", \"{}\": null", key)
    }
}

fn write_escaped(payload: &mut ClimatePayload, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '"' => payload.write_str("\\\"")?,
            '\\' => payload.write_str("\\\\")?,
            c if c.is_control() => write!(payload, "\\u{:04x}", u32::from(c))?,
            c => payload.write_char(c)?,
        }
    }
    Ok(())
}

// Shortest decimal text: 21.5 -> "21.5", 47.0 -> "47"
fn format_value(value: f32) -> Result<ValuePayload, fmt::Error> {
    let mut payload = ValuePayload::new();
    write!(payload, "{}", value)?;
    Ok(payload)
}
