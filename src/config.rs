#[derive(Debug, Clone, Copy)]
pub struct Config {
    // Device ID (used as MQTT client identifier and DHCP hostname)
    pub device_id: &'static str,

    // Location identifier (used in the climate summary payload)
    pub location: &'static str,

    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // Number of association status polls before giving up
    pub wifi_connect_attempts: u8,

    // Delay before each association status poll, in milliseconds
    pub wifi_poll_interval_ms: u32,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'static str,

    // MQTT port (usually 1883)
    pub mqtt_port: u16,

    // MQTT username for authentication (optional)
    pub mqtt_username: Option<&'static str>,

    // MQTT password for authentication (optional)
    pub mqtt_password: Option<&'static str>,

    // MQTT topic receiving the temperature as decimal text
    pub mqtt_topic_temperature: &'static str,

    // MQTT topic receiving the relative humidity as decimal text
    pub mqtt_topic_humidity: &'static str,

    // MQTT topic receiving the JSON climate summary (optional)
    pub mqtt_topic_climate: Option<&'static str>,

    // Measurement interval in seconds
    pub measurement_interval_seconds: u16,

    // Backoff after an unexpected fault in the sampling loop, in seconds
    pub error_backoff_seconds: u16,

    // Delay before the device restarts when Wi-Fi never comes up, in seconds
    pub restart_delay_seconds: u16,

    // Drop the broker session after a failed publish so the next iteration reconnects
    pub reconnect_on_publish_failure: bool,
}

impl Config {
    pub fn measurement_interval_ms(&self) -> u32 {
        u32::from(self.measurement_interval_seconds) * 1000
    }

    pub fn error_backoff_ms(&self) -> u32 {
        u32::from(self.error_backoff_seconds) * 1000
    }

    pub fn restart_delay_ms(&self) -> u32 {
        u32::from(self.restart_delay_seconds) * 1000
    }
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));
