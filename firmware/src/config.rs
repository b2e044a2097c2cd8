use thingspeak_feeds::{channel_publish_topic, TOPIC_CAPACITY};

pub struct Config {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // DHCP hostname
    pub hostname: &'static str,

    // ThingSpeak MQTT broker hostname
    pub mqtt_hostname: &'static str,

    // MQTT port (1883, or 8883 for TLS)
    pub mqtt_port: u16,

    // ThingSpeak MQTT device credentials
    pub mqtt_client_id: &'static str,
    pub mqtt_username: &'static str,
    pub mqtt_password: &'static str,

    // ThingSpeak channel the pond sensor feed publishes to
    pub ts_pond_channel_id: &'static str,

    // Optional location sent with each channel update
    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    pub elevation: Option<f32>,

    // TLS CA certificate chain in PEM format (optional)
    pub tls_ca: Option<&'static str>,

    // Measurement interval in seconds
    pub measurement_interval_seconds: u16,
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// `channels/<ts_pond_channel_id>/publish`
pub const POND_TOPIC: &str = channel_publish_topic!(CONFIG.ts_pond_channel_id);

const _: () = assert!(
    POND_TOPIC.len() <= TOPIC_CAPACITY,
    "ts_pond_channel_id is too long for a ThingSpeak topic"
);
