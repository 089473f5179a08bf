//! Connectivity manager: brings the wireless link up once at startup.

use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    WifiInitFailed,
    WifiStartFailed,
    WifiConfigFailed,
    HostnameTooLong,
}

/// State of the wireless association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Connecting,
    Up(Ipv4Addr),
}

/// Wireless interface driver.
pub trait Radio {
    /// Powers up the interface.
    async fn activate(&mut self) -> Result<(), Error>;

    /// Issues the association request. Completion is observed through
    /// [`Radio::address`].
    async fn associate(&mut self, ssid: &str, psk: &str) -> Result<(), Error>;

    /// IPv4 address once the link is associated and configured.
    fn address(&self) -> Option<Ipv4Addr>;
}

pub struct Wifi<R> {
    radio: R,
    state: LinkState,
}

impl<R: Radio> Wifi<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            state: LinkState::Down,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Associates with the configured network and waits for an address.
    ///
    /// Each poll is preceded by `wifi_poll_interval_ms`; after
    /// `wifi_connect_attempts` polls without an address the link is reported
    /// `Down`. Driver errors are reported the same way, never returned.
    pub async fn connect<D: DelayNs>(&mut self, config: &Config, delay: &mut D) -> LinkState {
        info!("Connecting to wifi with SSID: {:?}", config.wifi_ssid);
        self.state = LinkState::Connecting;

        if let Err(e) = self.request_association(config).await {
            error!("Wifi failed: {:?}", e);
            self.state = LinkState::Down;
            return self.state;
        }

        for attempt in 1..=config.wifi_connect_attempts {
            delay.delay_ms(config.wifi_poll_interval_ms).await;

            if let Some(address) = self.radio.address() {
                info!("Wifi connected! Got IP: {}", address);
                self.state = LinkState::Up(address);
                return self.state;
            }

            info!(
                "Waiting for association... ({}/{})",
                attempt, config.wifi_connect_attempts
            );
        }

        error!(
            "Wifi failed! No address after {} attempts",
            config.wifi_connect_attempts
        );
        self.state = LinkState::Down;
        self.state
    }

    async fn request_association(&mut self, config: &Config) -> Result<(), Error> {
        self.radio.activate().await?;
        self.radio
            .associate(config.wifi_ssid, config.wifi_psk)
            .await
    }
}
