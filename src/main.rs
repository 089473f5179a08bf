#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;
use esp_wifi::EspWifiController;

use hal::{
    gpio::{Input, InputConfig, Pull},
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
};
use static_cell::StaticCell;

use esp32_weather_station::board::{Bme280, Esp32, EspRadio, MqttBroker};
use esp32_weather_station::constants::HEAP_SIZE;
use esp32_weather_station::station;
use esp32_weather_station::wifi::Wifi;
use esp32_weather_station::CONFIG;

esp_bootloader_esp_idf::esp_app_desc!();

static WIFI_INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();

// Raised by the BOOT button, read by the sampling loop between iterations
static STOP: AtomicBool = AtomicBool::new(false);

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    let rng = Rng::new(peripherals.RNG);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let i2c_config = hal::i2c::master::Config::default()
        .with_frequency(Rate::from_khz(100))
        .with_timeout(BusTimeout::BusCycles(24));

    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .expect("invalid I2C configuration")
        .with_sda(peripherals.GPIO21)
        .with_scl(peripherals.GPIO22)
        .into_async();

    let sensor = Bme280::new(i2c).await;

    let wifi_init = WIFI_INIT.init(
        esp_wifi::init(timg1.timer0, rng.clone()).expect("failed to initialise esp-wifi"),
    );

    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let radio = EspRadio::new(wifi_init, peripherals.WIFI, CONFIG.device_id, seed, spawner)
        .expect("failed to initialise the network stack");
    let broker = MqttBroker::new(radio.stack);

    let button = Input::new(
        peripherals.GPIO0,
        InputConfig::default().with_pull(Pull::Up),
    );
    spawner.spawn(stop_button(button)).ok();

    let mut wifi = Wifi::new(radio);
    let exit = station::run(
        &CONFIG,
        &mut wifi,
        broker,
        sensor,
        Delay,
        &mut Esp32,
        &STOP,
    )
    .await;

    log::info!("Station exited: {:?}", exit);
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

#[embassy_executor::task]
async fn stop_button(mut button: Input<'static>) {
    button.wait_for_falling_edge().await;
    log::info!("Stop requested, finishing current iteration");
    STOP.store(true, Ordering::Relaxed);
}
