/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 4096;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 4096;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 1024;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 1024;
/// Maximum number of MQTT v5 properties per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;
/// MQTT keep-alive announced to the broker, in seconds
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// TCP socket timeout while talking to the broker, in seconds
pub const SOCKET_TIMEOUT_SECS: u64 = 30;

/// Delay before re-associating after the Wi-Fi link dropped
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;

/// Capacity of a single decimal value payload ("-12.5", "47")
pub const VALUE_PAYLOAD_SIZE: usize = 24;
/// Capacity of the JSON climate summary payload
pub const CLIMATE_PAYLOAD_SIZE: usize = 256;
