use log::{error, info};

use crate::config::Config;
use crate::mqtt::{self, Session};
use crate::reading::Reading;
use crate::sensor::{Sensor, SensorError};

/// Topic a publish was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Temperature,
    Humidity,
    Climate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Sensor(SensorError),
    Publish(Topic, mqtt::Error),
    Format,
}

impl Error {
    /// Failures the publish cycle reports as an outcome. `Format` is left to
    /// the caller's fault boundary.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Format)
    }
}

/// Takes one measurement and publishes it.
///
/// Temperature goes out first, then humidity, then the optional climate
/// summary. A publish error stops the cycle, so earlier topics may already
/// have received their value.
pub async fn publish_cycle<S, P>(
    sensor: &mut S,
    session: &mut P,
    config: &Config,
) -> Result<Reading, Error>
where
    S: Sensor,
    P: Session,
{
    let reading = sensor.measure().await.map_err(|e| {
        error!("[ERROR] Sensor read failed: {:?}", e);
        Error::Sensor(e)
    })?;
    log::debug!("Sensor data received: {:?}", reading);

    let temperature = reading.temperature_payload().map_err(|_| Error::Format)?;
    let humidity = reading.humidity_payload().map_err(|_| Error::Format)?;
    let climate = match config.mqtt_topic_climate {
        Some(topic) => Some((
            topic,
            reading
                .climate_payload(config.location)
                .map_err(|_| Error::Format)?,
        )),
        None => None,
    };

    send(
        session,
        Topic::Temperature,
        config.mqtt_topic_temperature,
        temperature.as_bytes(),
    )
    .await?;
    send(
        session,
        Topic::Humidity,
        config.mqtt_topic_humidity,
        humidity.as_bytes(),
    )
    .await?;
    if let Some((topic, payload)) = climate {
        send(session, Topic::Climate, topic, payload.as_bytes()).await?;
    }

    let dew_point = reading.climate().dew_point;
    if dew_point.is_finite() {
        info!(
            "[OK] Temp: {}C, Humidity: {}%, Dew point: {:.1}C",
            temperature, humidity, dew_point
        );
    } else {
        info!("[OK] Temp: {}C, Humidity: {}%", temperature, humidity);
    }
    Ok(reading)
}

async fn send<P: Session>(
    session: &mut P,
    kind: Topic,
    topic: &str,
    payload: &[u8],
) -> Result<(), Error> {
    session.publish(topic, payload).await.map_err(|e| {
        error!("[ERROR] Publish to {:?} failed: {:?}", topic, e);
        Error::Publish(kind, e)
    })
}
