use bme280_rs::{AsyncBme280, Oversampling, SensorMode};
use embassy_time::Delay;
use embedded_hal_async::i2c::I2c;
use log::{error, info};

use crate::reading::Reading;
use crate::sensor::{Sensor, SensorError};

/// BME280 temperature/humidity sensor on I2C.
///
/// A sensor that fails to initialise at boot is initialised again on the
/// next measurement.
pub struct Bme280<I2C> {
    sensor: AsyncBme280<I2C, Delay>,
    initialised: bool,
}

impl<I2C: I2c> Bme280<I2C> {
    pub async fn new(i2c: I2C) -> Self {
        let mut bme280 = Self {
            sensor: AsyncBme280::new(i2c, Delay),
            initialised: false,
        };

        if let Err(e) = bme280.init().await {
            error!("BME280 not ready ({:?}), retrying on next measurement", e);
        }

        bme280
    }

    async fn init(&mut self) -> Result<(), SensorError> {
        info!("Initialising BME280...");
        self.sensor
            .init()
            .await
            .map_err(|_| SensorError::InitFailure)?;

        self.sensor
            .set_sampling_configuration(
                bme280_rs::Configuration::default()
                    .with_temperature_oversampling(Oversampling::Oversample1)
                    .with_pressure_oversampling(Oversampling::Oversample1)
                    .with_humidity_oversampling(Oversampling::Oversample1)
                    .with_sensor_mode(SensorMode::Normal),
            )
            .await
            .map_err(|_| SensorError::InitFailure)?;

        self.initialised = true;
        info!("Initialised BME280");
        Ok(())
    }
}

impl<I2C: I2c> Sensor for Bme280<I2C> {
    async fn measure(&mut self) -> Result<Reading, SensorError> {
        if !self.initialised {
            self.init().await?;
        }

        let sample = self
            .sensor
            .read_sample()
            .await
            .map_err(|_| SensorError::MeasurementFailure)?;

        let temperature = sample.temperature.ok_or(SensorError::NoTemperatureData)?;
        let humidity = sample.humidity.ok_or(SensorError::NoHumidityData)?;

        Reading::new(temperature, humidity)
    }
}
