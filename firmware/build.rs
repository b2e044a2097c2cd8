use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

const CONFIG_FILE: &str = "cfg.toml";
const CONFIG_EXAMPLE_FILE: &str = "cfg.toml.example";

fn default_mqtt_hostname() -> String {
    "mqtt3.thingspeak.com".into()
}

fn default_mqtt_port() -> u16 {
    8883
}

fn default_measurement_interval() -> u16 {
    60
}

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,
    hostname: String,
    #[serde(default = "default_mqtt_hostname")]
    mqtt_hostname: String,
    #[serde(default = "default_mqtt_port")]
    mqtt_port: u16,
    mqtt_client_id: String,
    mqtt_username: String,
    mqtt_password: String,
    ts_pond_channel_id: String,
    latitude: Option<f32>,
    longitude: Option<f32>,
    elevation: Option<f32>,
    tls_ca: Option<String>,
    #[serde(default = "default_measurement_interval")]
    measurement_interval_seconds: u16,
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={}", CONFIG_FILE);
    println!("cargo:rerun-if-changed={}", CONFIG_EXAMPLE_FILE);

    let toml_str = match fs::read_to_string(CONFIG_FILE) {
        Ok(s) => s,
        Err(_) => {
            println!(
                "cargo:warning={} not found, building with {}",
                CONFIG_FILE, CONFIG_EXAMPLE_FILE
            );
            fs::read_to_string(CONFIG_EXAMPLE_FILE)?
        }
    };
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // The broker is the one to reject a bad channel ID, only point it out here
    if raw.ts_pond_channel_id.is_empty()
        || !raw.ts_pond_channel_id.chars().all(|c| c.is_ascii_digit())
    {
        println!(
            "cargo:warning=ts_pond_channel_id {:?} does not look like a ThingSpeak channel ID",
            raw.ts_pond_channel_id
        );
    }

    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            hostname: {host:?},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_client_id: {mc:?},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            ts_pond_channel_id: {chan:?},
            latitude: {lat:?},
            longitude: {long:?},
            elevation: {elev:?},
            tls_ca: {ca:?},
            measurement_interval_seconds: {intv},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        host = raw.hostname,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mc = raw.mqtt_client_id,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        chan = raw.ts_pond_channel_id,
        lat = raw.latitude,
        long = raw.longitude,
        elev = raw.elevation,
        ca = raw.tls_ca,
        intv = raw.measurement_interval_seconds
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
