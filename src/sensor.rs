use crate::reading::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    InitFailure,
    MeasurementFailure,
    NoTemperatureData,
    NoHumidityData,
    InvalidData,
}

/// A temperature/humidity sensor. One call is one measurement.
pub trait Sensor {
    async fn measure(&mut self) -> Result<Reading, SensorError>;
}
