use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[derive(Deserialize)]
struct RawConfig {
    device_id: String,
    location: String,
    wifi_ssid: String,
    wifi_psk: String,
    #[serde(default = "default_wifi_connect_attempts")]
    wifi_connect_attempts: u8,
    #[serde(default = "default_wifi_poll_interval_ms")]
    wifi_poll_interval_ms: u32,
    mqtt_hostname: String,
    mqtt_port: u16,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    mqtt_topic_temperature: String,
    mqtt_topic_humidity: String,
    mqtt_topic_climate: Option<String>,
    #[serde(default = "default_measurement_interval_seconds")]
    measurement_interval_seconds: u16,
    #[serde(default = "default_error_backoff_seconds")]
    error_backoff_seconds: u16,
    #[serde(default = "default_restart_delay_seconds")]
    restart_delay_seconds: u16,
    #[serde(default)]
    reconnect_on_publish_failure: bool,
}

fn default_wifi_connect_attempts() -> u8 {
    20
}

fn default_wifi_poll_interval_ms() -> u32 {
    500
}

fn default_measurement_interval_seconds() -> u16 {
    30
}

fn default_error_backoff_seconds() -> u16 {
    10
}

fn default_restart_delay_seconds() -> u16 {
    5
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");
    println!("cargo:rerun-if-changed=cfg.toml.example");

    // A local cfg.toml holds the real credentials; the example keeps fresh
    // checkouts (and host test builds) working.
    let source = if Path::new("cfg.toml").exists() {
        "cfg.toml"
    } else {
        println!("cargo:warning=cfg.toml not found, using cfg.toml.example");
        "cfg.toml.example"
    };

    // Read and parse
    let toml_str = fs::read_to_string(source)?;
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // Generate Rust code
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            device_id: {id:?},
            location: {loc:?},
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            wifi_connect_attempts: {attempts},
            wifi_poll_interval_ms: {poll},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            mqtt_topic_temperature: {mtt:?},
            mqtt_topic_humidity: {mth:?},
            mqtt_topic_climate: {mtc:?},
            measurement_interval_seconds: {intv},
            error_backoff_seconds: {backoff},
            restart_delay_seconds: {restart},
            reconnect_on_publish_failure: {reconnect},
        }};
    "#,
        id = raw.device_id,
        loc = raw.location,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        attempts = raw.wifi_connect_attempts,
        poll = raw.wifi_poll_interval_ms,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        mtt = raw.mqtt_topic_temperature,
        mth = raw.mqtt_topic_humidity,
        mtc = raw.mqtt_topic_climate,
        intv = raw.measurement_interval_seconds,
        backoff = raw.error_backoff_seconds,
        restart = raw.restart_delay_seconds,
        reconnect = raw.reconnect_on_publish_failure,
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
