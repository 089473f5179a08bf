//! Broker session establishment.
//!
//! [`connect`] is a single attempt: it never retries. Retry policy belongs
//! to the sampling loop, which calls it both at startup and when it has no
//! session.

use log::{error, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    DnsLookupFailed,
    SocketConnectionFailed,
    ConnectionFailed,
    PublishMessageFailed,
    InvalidTopic,
}

/// Everything needed to open a session with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub client_id: &'static str,
    pub hostname: &'static str,
    pub port: u16,
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl From<&Config> for Endpoint {
    fn from(config: &Config) -> Self {
        Self {
            client_id: config.device_id,
            hostname: config.mqtt_hostname,
            port: config.mqtt_port,
            username: config.mqtt_username,
            password: config.mqtt_password,
        }
    }
}

/// Transport able to perform the connect handshake with a broker.
pub trait Broker {
    type Session: Session;

    async fn connect(&mut self, endpoint: &Endpoint) -> Result<Self::Session, Error>;
}

/// A live, publish-capable broker session.
pub trait Session {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error>;
}

pub async fn connect<B: Broker>(broker: &mut B, config: &Config) -> Result<B::Session, Error> {
    let endpoint = Endpoint::from(config);
    info!(
        "Connecting to MQTT broker {}:{} as {:?}...",
        endpoint.hostname, endpoint.port, endpoint.client_id
    );

    match broker.connect(&endpoint).await {
        Ok(session) => {
            info!("MQTT connected to broker successfully");
            Ok(session)
        }
        Err(e) => {
            error!("MQTT connect failed: {:?}", e);
            Err(e)
        }
    }
}
