use thingspeak_feeds::FieldMap;

/// Size of the heap
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer for encrypted data
pub const RX_BUFFER_SIZE: usize = 4096;
/// Size of the TCP socket transmit buffer for encrypted data
pub const TX_BUFFER_SIZE: usize = 4096;

/// Size of the MQTT receive buffer, only ever holds a CONNACK
pub const MQTT_RX_BUFFER_SIZE: usize = 64;
/// Size of the MQTT transmit buffer, fits one encoded PUBLISH
pub const MQTT_TX_BUFFER_SIZE: usize = 512;
/// MQTT keep alive in seconds
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;

/// Maximum length of the nul-terminated TLS server name
pub const SERVERNAME_MAX: usize = 64;
/// Maximum length of the nul-terminated PEM CA chain
pub const CA_PEM_MAX: usize = 4096;

/// Wi-Fi connection attempt timeout
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Delay before reconnecting to Wi-Fi
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;

/// Number of feeds the device can publish to
pub const MAX_FEEDS: usize = 4;

/// Feed carrying the pond sensor readings
pub const POND_SENSOR_FEED: &str = "Pond_Sensor";

/// Channel fields of the pond sensor feed
pub const POND_FIELDS: FieldMap = FieldMap::new(&[
    ("temperature", 1),
    ("humidity", 2),
    ("pressure", 3),
]);

/// Status message attached to each channel update
pub const UPDATE_STATUS: &str = "MQTTPUBLISH";
