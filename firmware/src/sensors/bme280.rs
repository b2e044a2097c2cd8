use bme280_rs::{AsyncBme280, Oversampling, SensorMode};
use embassy_time::Delay;
use log::info;

use super::{Sensor, SensorData, SensorError};

/// Air temperature, humidity and pressure next to the pond.
pub struct Bme280<I2C> {
    sensor: AsyncBme280<I2C, Delay>,
}

impl<I2C: embedded_hal_async::i2c::I2c> Bme280<I2C> {
    pub async fn new(i2c: I2C) -> Result<Self, SensorError> {
        info!("Initialising BME280...");
        let mut sensor = AsyncBme280::new(i2c, Delay);
        sensor.init().await.map_err(|_| SensorError::InitFailure)?;

        sensor
            .set_sampling_configuration(
                bme280_rs::Configuration::default()
                    .with_temperature_oversampling(Oversampling::Oversample1)
                    .with_pressure_oversampling(Oversampling::Oversample1)
                    .with_humidity_oversampling(Oversampling::Oversample1)
                    .with_sensor_mode(SensorMode::Normal),
            )
            .await
            .map_err(|_| SensorError::InitFailure)?;

        info!("Initialised BME280");

        Ok(Self { sensor })
    }
}

impl<I2C: embedded_hal_async::i2c::I2c> Sensor for Bme280<I2C> {
    async fn measure(&mut self, data: &mut SensorData) -> Result<(), SensorError> {
        let sample = self
            .sensor
            .read_sample()
            .await
            .map_err(|_| SensorError::MeasurementFailure)?;

        // Any channel missing from the sample is left out of the update
        if let Some(temperature) = sample.temperature {
            data.add_measurement("temperature", temperature);
        }
        if let Some(humidity) = sample.humidity {
            data.add_measurement("humidity", humidity);
        }
        if let Some(pressure) = sample.pressure {
            // Pa to hPa
            data.add_measurement("pressure", pressure / 100.0);
        }

        Ok(())
    }
}
