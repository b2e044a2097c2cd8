#![allow(async_fn_in_trait)]

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use heapless::FnvIndexMap;

use crate::hal::{i2c::master::I2c, Async};

pub mod bme280;

use crate::sensors::bme280::Bme280;

pub type SharedI2c = I2cDevice<'static, NoopRawMutex, I2c<'static, Async>>;

#[derive(Debug)]
pub enum SensorError {
    InitFailure,
    MeasurementFailure,
    NoSensors,
}

/// Named readings from one measurement cycle
#[derive(Default, Debug)]
pub struct SensorData {
    pub data: FnvIndexMap<&'static str, f32, 16>,
}

impl SensorData {
    pub fn add_measurement(&mut self, key: &'static str, value: f32) {
        if self.data.insert(key, value).is_err() {
            log::warn!("Sensor data full, dropping {}", key);
        }
    }

    pub fn readings(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.data.iter().map(|(key, value)| (*key, *value))
    }
}

pub trait Sensor {
    async fn measure(&mut self, data: &mut SensorData) -> Result<(), SensorError>;
}

#[derive(Default)]
pub struct Sensors {
    pub bme280: Option<Bme280<SharedI2c>>,
}

impl Sensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn new_bme280(&mut self, i2c: SharedI2c) -> Result<(), SensorError> {
        self.bme280 = Some(Bme280::new(i2c).await?);
        Ok(())
    }

    /// Reads every attached sensor. A failing sensor is logged and skipped,
    /// the cycle only fails when nothing could be read.
    pub async fn measure(&mut self) -> Result<SensorData, SensorError> {
        let mut data = SensorData::default();

        if let Some(bme280) = self.bme280.as_mut() {
            if let Err(e) = bme280.measure(&mut data).await {
                log::error!("BME280 measurement failed: {:?}", e);
            }
        } else {
            return Err(SensorError::NoSensors);
        }

        if data.data.is_empty() {
            return Err(SensorError::MeasurementFailure);
        }

        Ok(data)
    }
}
