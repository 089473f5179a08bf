use core::net::Ipv4Addr;
use core::str::FromStr;

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_wifi::{
    wifi::{ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState},
    EspWifiController,
};
use heapless::String;
use log::{error, info};
use static_cell::StaticCell;

use crate::constants::WIFI_RECONNECT_DELAY_MS;
use crate::wifi::{Error, Radio};

static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

/// ESP32 station interface with its embassy-net stack.
pub struct EspRadio {
    pub stack: Stack<'static>,
    controller: Option<WifiController<'static>>,
    spawner: Spawner,
}

impl EspRadio {
    pub fn new(
        init: &'static EspWifiController<'static>,
        wifi: esp_hal::peripherals::WIFI<'static>,
        hostname: &str,
        seed: u64,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let (controller, interfaces) =
            esp_wifi::wifi::new(init, wifi).map_err(|_| Error::WifiInitFailed)?;

        let mut dhcp_config = embassy_net::DhcpConfig::default();
        dhcp_config.hostname =
            Some(String::<32>::from_str(hostname).map_err(|_| Error::HostnameTooLong)?);

        let config = embassy_net::Config::dhcpv4(dhcp_config);

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, config, resources, seed);

        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::WifiInitFailed)?;

        Ok(Self {
            stack,
            controller: Some(controller),
            spawner,
        })
    }
}

impl Radio for EspRadio {
    async fn activate(&mut self) -> Result<(), Error> {
        let controller = self.controller.as_mut().ok_or(Error::WifiStartFailed)?;

        if matches!(controller.is_started(), Ok(true)) {
            return Ok(());
        }

        controller
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|e| {
                error!("Failed to set WiFi mode: {:?}", e);
                Error::WifiConfigFailed
            })?;

        info!("Starting wifi");
        controller.start_async().await.map_err(|e| {
            error!("Failed to start WiFi: {:?}", e);
            Error::WifiStartFailed
        })?;
        info!("Wifi started!");

        Ok(())
    }

    async fn associate(&mut self, ssid: &str, psk: &str) -> Result<(), Error> {
        let mut controller = self.controller.take().ok_or(Error::WifiConfigFailed)?;

        let client_config = Configuration::Client(ClientConfiguration {
            ssid: ssid.into(),
            password: psk.into(),
            ..Default::default()
        });
        controller.set_configuration(&client_config).map_err(|e| {
            error!("Failed to set WiFi config: {:?}", e);
            Error::WifiConfigFailed
        })?;

        // The controller now belongs to the association task
        self.spawner
            .spawn(connection(controller))
            .map_err(|_| Error::WifiInitFailed)
    }

    fn address(&self) -> Option<Ipv4Addr> {
        if !self.stack.is_link_up() {
            return None;
        }

        self.stack.config_v4().map(|config| config.address.address())
    }
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    loop {
        if esp_wifi::wifi::wifi_state() == WifiState::StaConnected {
            // wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            info!("Wifi link dropped, re-associating");
            Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
        }

        match controller.connect_async().await {
            Ok(_) => info!("Wifi associated"),
            Err(e) => {
                info!("Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
