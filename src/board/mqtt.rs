use alloc::boxed::Box;
use core::mem::ManuallyDrop;

use embassy_net::{tcp::TcpSocket, Stack};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::publish_packet::QualityOfService,
    utils::rng_generator::CountingRng,
};

use super::transport;
use crate::constants::*;
use crate::mqtt::{Broker, Endpoint, Error, Session};

type Client = MqttClient<'static, TcpSocket<'static>, MQTT_MAX_PROPERTIES, CountingRng>;

struct Buffers {
    rx: [u8; RX_BUFFER_SIZE],
    tx: [u8; TX_BUFFER_SIZE],
    mqtt_rx: [u8; MQTT_RX_BUFFER_SIZE],
    mqtt_tx: [u8; MQTT_TX_BUFFER_SIZE],
}

impl Buffers {
    const fn new() -> Self {
        Self {
            rx: [0; RX_BUFFER_SIZE],
            tx: [0; TX_BUFFER_SIZE],
            mqtt_rx: [0; MQTT_RX_BUFFER_SIZE],
            mqtt_tx: [0; MQTT_TX_BUFFER_SIZE],
        }
    }
}

/// Opens MQTT v5 sessions over plain TCP on the Wi-Fi stack.
pub struct MqttBroker {
    stack: Stack<'static>,
}

impl MqttBroker {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

/// MQTT client together with the socket and buffers it borrows.
pub struct MqttSession {
    client: ManuallyDrop<Client>,
    buffers: *mut Buffers,
}

impl Broker for MqttBroker {
    type Session = MqttSession;

    async fn connect(&mut self, endpoint: &Endpoint) -> Result<MqttSession, Error> {
        let buffers = Box::into_raw(Box::new(Buffers::new()));

        // SAFETY: `buffers` is a fresh allocation. The client is the only
        // holder of references into it, and it is dropped before the
        // allocation is freed, either below or in `MqttSession::drop`.
        let borrowed: &'static mut Buffers = unsafe { &mut *buffers };

        match open(self.stack, borrowed, endpoint).await {
            Ok(client) => Ok(MqttSession {
                client: ManuallyDrop::new(client),
                buffers,
            }),
            Err(e) => {
                // SAFETY: `open` returned, so every borrow of the buffers is gone
                unsafe { drop(Box::from_raw(buffers)) };
                Err(e)
            }
        }
    }
}

async fn open(
    stack: Stack<'static>,
    buffers: &'static mut Buffers,
    endpoint: &Endpoint,
) -> Result<Client, Error> {
    let Buffers {
        rx,
        tx,
        mqtt_rx,
        mqtt_tx,
    } = buffers;

    let socket = transport::connect(stack, rx, tx, endpoint.hostname, endpoint.port).await?;

    let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
    config.add_client_id(endpoint.client_id);
    if let Some(username) = endpoint.username {
        config.add_username(username);
    }
    if let Some(password) = endpoint.password {
        config.add_password(password);
    }
    config.keep_alive = MQTT_KEEP_ALIVE_SECS;
    config.max_packet_size = MQTT_RX_BUFFER_SIZE as u32;

    let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
        socket,
        mqtt_tx,
        MQTT_TX_BUFFER_SIZE,
        mqtt_rx,
        MQTT_RX_BUFFER_SIZE,
        config,
    );

    client.connect_to_broker().await.map_err(|e| {
        log::error!("MQTT connect_to_broker failed: {:?}", e);
        Error::ConnectionFailed
    })?;

    Ok(client)
}

impl Session for MqttSession {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        if topic.is_empty() || topic.contains(['+', '#']) {
            return Err(Error::InvalidTopic);
        }

        self.client
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
            .map_err(|e| {
                log::error!("Failed to publish message: {:?}", e);
                Error::PublishMessageFailed
            })
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        // SAFETY: the client is dropped first and never used again; after
        // that nothing references the buffers allocated in `connect`.
        unsafe {
            ManuallyDrop::drop(&mut self.client);
            drop(Box::from_raw(self.buffers));
        }
    }
}
