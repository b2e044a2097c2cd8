use embassy_net::Stack;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use esp_mbedtls::Tls;
use heapless::Vec;
use static_cell::StaticCell;
use thingspeak_feeds::{FeedPublisher, Feeds, Payload};

use crate::config::CONFIG;
use crate::constants::*;
use crate::cstr;
use crate::mqtt;
use crate::sensors::{SensorData, Sensors};
use crate::transport::Transport;

static MQTT_RX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; MQTT_RX_BUFFER_SIZE]>> = StaticCell::new();
static MQTT_TX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; MQTT_TX_BUFFER_SIZE]>> = StaticCell::new();

#[derive(Debug)]
pub enum Error {
    Sensor,
    Payload,
    NoReadings,
    UnknownFeed,
    Config,
    Transport,
    Mqtt,
}

pub struct Measurement {
    stack: &'static Mutex<NoopRawMutex, Stack<'static>>,
    tls: &'static Tls<'static>,
    rx_buf: &'static Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>,
    tx_buf: &'static Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>,
    mqtt_rx_buf: &'static Mutex<NoopRawMutex, [u8; MQTT_RX_BUFFER_SIZE]>,
    mqtt_tx_buf: &'static Mutex<NoopRawMutex, [u8; MQTT_TX_BUFFER_SIZE]>,
    servername: Vec<u8, SERVERNAME_MAX>,
    ca_chain: Option<Vec<u8, CA_PEM_MAX>>,
    sensors: Sensors,
    feeds: Feeds<MAX_FEEDS>,
}

impl Measurement {
    pub fn new(
        stack: &'static Mutex<NoopRawMutex, Stack<'static>>,
        tls: &'static Tls<'static>,
        rx_buf: &'static Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>,
        tx_buf: &'static Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>,
        sensors: Sensors,
        feeds: Feeds<MAX_FEEDS>,
    ) -> Result<Self, Error> {
        let mqtt_rx_buf = MQTT_RX_BUF.init(Mutex::new([0; MQTT_RX_BUFFER_SIZE]));
        let mqtt_tx_buf = MQTT_TX_BUF.init(Mutex::new([0; MQTT_TX_BUFFER_SIZE]));

        let servername =
            cstr::build_trimmed_c_str_vec::<SERVERNAME_MAX>(CONFIG.mqtt_hostname).map_err(|e| {
                log::error!("Invalid MQTT hostname: {:?}", e);
                Error::Config
            })?;

        let ca_chain = CONFIG
            .tls_ca
            .map(cstr::build_trimmed_c_str_vec::<CA_PEM_MAX>)
            .transpose()
            .map_err(|e| {
                log::error!("Invalid TLS CA chain: {:?}", e);
                Error::Config
            })?;

        Ok(Self {
            stack,
            tls,
            rx_buf,
            tx_buf,
            mqtt_rx_buf,
            mqtt_tx_buf,
            servername,
            ca_chain,
            sensors,
            feeds,
        })
    }

    pub async fn take(&mut self) -> Result<(), Error> {
        // Measure sensor data first
        let sensor_data = self.sensors.measure().await.map_err(|e| {
            log::error!("Sensor error: {:?}", e);
            Error::Sensor
        })?;
        log::debug!("Sensor data received: {:?}", sensor_data);

        let payload = build_payload(&sensor_data)?;
        if payload.is_empty() {
            return Err(Error::NoReadings);
        }

        let feed = self.feeds.get(POND_SENSOR_FEED).ok_or(Error::UnknownFeed)?;

        // Acquire locks for shared resources only when needed
        let stack_guard = self.stack.lock().await;
        let mut rx_buf = self.rx_buf.lock().await;
        let mut tx_buf = self.tx_buf.lock().await;

        let servername = cstr::as_c_str(&self.servername).map_err(|_| Error::Config)?;

        // Create transport session
        let transport = Transport::new(
            *stack_guard,
            self.tls,
            &mut *rx_buf,
            &mut *tx_buf,
            CONFIG.mqtt_hostname,
            servername,
            self.ca_chain.as_deref(),
            CONFIG.mqtt_port,
        )
        .await
        .map_err(|e| {
            log::error!("Transport error: {:?}", e);
            Error::Transport
        })?;

        // MQTT 3.1.1 session, one per cycle
        let mut mqtt_rx_buf = self.mqtt_rx_buf.lock().await;
        let mut mqtt_tx_buf = self.mqtt_tx_buf.lock().await;
        let mut client = mqtt::connect(transport, &mut *mqtt_tx_buf, &mut *mqtt_rx_buf)
            .await
            .map_err(|_| Error::Mqtt)?;

        let published = FeedPublisher::new(&mut client, feed)
            .publish_payload(&payload)
            .await;

        // Explicitly disconnect, even after a failed publish
        mqtt::disconnect(client).await;

        published.map_err(|e| {
            log::error!("Publishing to {} failed: {:?}", feed.name(), e);
            Error::Mqtt
        })?;

        log::info!("Channel update published to {}", feed.topic());
        Ok(())
    }
}

fn build_payload(sensor_data: &SensorData) -> Result<Payload<'static>, Error> {
    let mut payload = Payload::from_readings(sensor_data.readings(), &POND_FIELDS)
        .map_err(|e| {
            log::error!("Invalid field mapping: {:?}", e);
            Error::Payload
        })?
        .with_status(UPDATE_STATUS);

    if let (Some(latitude), Some(longitude)) = (CONFIG.latitude, CONFIG.longitude) {
        payload = payload.with_location(latitude, longitude);
    }
    if let Some(elevation) = CONFIG.elevation {
        payload = payload.with_elevation(elevation);
    }

    log::debug!("Channel update payload: {:?}", payload);
    Ok(payload)
}
