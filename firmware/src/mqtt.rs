use embedded_io_async::{Read, Write};
use thingspeak_feeds::{ConnectOptions, MqttError, MqttSession};

use crate::config::CONFIG;
use crate::constants::MQTT_KEEP_ALIVE_SECS;

pub type Mqtt<'a, T> = MqttSession<'a, T>;

const OPTIONS: ConnectOptions<'static> = ConnectOptions {
    client_id: CONFIG.mqtt_client_id,
    username: CONFIG.mqtt_username,
    password: CONFIG.mqtt_password,
    keep_alive_secs: MQTT_KEEP_ALIVE_SECS,
};

/// Connects to the ThingSpeak broker with the device credentials from the config.
pub async fn connect<'a, T>(
    transport: T,
    tx_buffer: &'a mut [u8],
    rx_buffer: &'a mut [u8],
) -> Result<Mqtt<'a, T>, MqttError<T::Error>>
where
    T: Read + Write,
{
    log::info!("Connecting to MQTT broker {}", CONFIG.mqtt_hostname);
    MqttSession::connect(transport, tx_buffer, rx_buffer, &OPTIONS)
        .await
        .map_err(|e| {
            log::error!("MQTT connect failed: {:?}", e);
            e
        })
}

pub async fn disconnect<T>(mqtt: Mqtt<'_, T>)
where
    T: Read + Write,
{
    if let Err(e) = mqtt.disconnect().await {
        log::warn!("MQTT disconnect failed: {:?}", e);
    }
}
