#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_net::Stack;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_mbedtls::Tls;
use esp_println::logger::init_logger;

use hal::{
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
    Async,
};

use thingspeak_feeds::{update_interval_secs, Feeds};

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

pub mod config;
pub mod constants;
pub mod cstr;
mod measurement;
mod mqtt;
pub mod sensors;
pub mod transport;
mod wifi;

use config::CONFIG;
use constants::*;
use measurement::Measurement;
use sensors::Sensors;
use wifi::Wifi;

static I2C_BUS: StaticCell<Mutex<NoopRawMutex, I2c<'static, Async>>> = StaticCell::new();
static TLS: StaticCell<Tls<'static>> = StaticCell::new();
static STACK: StaticCell<Mutex<NoopRawMutex, Stack<'static>>> = StaticCell::new();

static RX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>> = StaticCell::new();
static TX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>> = StaticCell::new();

/// The feeds this device publishes to
fn feeds() -> Result<Feeds<MAX_FEEDS>, thingspeak_feeds::Error> {
    let mut feeds = Feeds::new();
    feeds.add(POND_SENSOR_FEED, CONFIG.ts_pond_channel_id)?;
    Ok(feeds)
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let feeds = feeds().expect("Failed to register feeds");
    for feed in feeds.iter() {
        log::info!("Feed {} publishes to {}", feed.name(), feed.topic());
    }

    let mut sensors = Sensors::new();

    if cfg!(feature = "bme280") {
        let (sda, scl) = (peripherals.GPIO21, peripherals.GPIO22);

        let i2c_config = hal::i2c::master::Config::default()
            .with_frequency(Rate::from_khz(100))
            .with_timeout(BusTimeout::BusCycles(24));

        let i2c = I2c::new(peripherals.I2C0, i2c_config)
            .expect("Failed to configure I2C")
            .with_sda(sda)
            .with_scl(scl)
            .into_async();

        let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

        if let Err(e) = sensors.new_bme280(I2cDevice::new(i2c_bus)).await {
            log::error!("BME280 unavailable: {:?}", e);
        }
    }

    let wifi = Wifi::new(
        peripherals.WIFI,
        timg1.timer0,
        peripherals.RADIO_CLK,
        rng,
        spawner,
    )
    .await
    .expect("Failed to initialise Wi-Fi");

    wifi.connect().await.expect("Failed to connect to Wi-Fi");

    let mut tls = Tls::new(peripherals.SHA)
        .expect("Failed to initialise TLS")
        .with_hardware_rsa(peripherals.RSA);

    tls.set_debug(0);

    let tls_shared = TLS.init(tls);

    let stack_shared = STACK.init(Mutex::new(wifi.stack));

    let rx_buf = RX_BUF.init(Mutex::new([0; RX_BUFFER_SIZE]));
    let tx_buf = TX_BUF.init(Mutex::new([0; TX_BUFFER_SIZE]));

    let measurement = Measurement::new(stack_shared, tls_shared, rx_buf, tx_buf, sensors, feeds)
        .expect("Invalid broker configuration");

    spawner.spawn(main_task(measurement)).ok();
}

#[embassy_executor::task]
async fn main_task(mut measurement: Measurement) {
    let interval = update_interval_secs(CONFIG.measurement_interval_seconds);

    loop {
        if let Err(e) = measurement.take().await {
            log::error!("Measurement error: {:?}", e);
        }

        Timer::after(Duration::from_secs(interval.into())).await;
    }
}
