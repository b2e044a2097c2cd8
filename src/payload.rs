use core::fmt::Write;

use heapless::String;

use crate::error::Error;

/// Number of data fields in a ThingSpeak channel
pub const FIELD_COUNT: usize = 8;

/// Maximum encoded payload length in bytes
pub const PAYLOAD_CAPACITY: usize = 256;

/// Maps measurement names to the channel field they are published in.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    fields: &'static [(&'static str, u8)],
}

impl FieldMap {
    pub const fn new(fields: &'static [(&'static str, u8)]) -> Self {
        Self { fields }
    }

    pub fn field(&self, measurement: &str) -> Option<u8> {
        self.fields
            .iter()
            .find(|(name, _)| *name == measurement)
            .map(|(_, field)| *field)
    }
}

/// A channel feed update, encoded as `field1=..&field2=..&status=..`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Payload<'a> {
    fields: [Option<f32>; FIELD_COUNT],
    latitude: Option<f32>,
    longitude: Option<f32>,
    elevation: Option<f32>,
    status: Option<&'a str>,
}

impl<'a> Payload<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from named readings. Readings without a field in
    /// `map` are left out, as are NaN and infinite readings.
    pub fn from_readings<'r, I>(readings: I, map: &FieldMap) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'r str, f32)>,
    {
        let mut payload = Self::new();
        for (name, value) in readings {
            match map.field(name) {
                Some(_) if !value.is_finite() => {
                    log::warn!("Dropping non-finite {} reading: {}", name, value)
                }
                Some(field) => payload.set_field(field, value)?,
                None => log::debug!("No channel field for {}, skipping", name),
            }
        }
        Ok(payload)
    }

    /// Sets channel field `field` (1 to 8) to a finite `value`.
    pub fn set_field(&mut self, field: u8, value: f32) -> Result<(), Error> {
        let slot = (field as usize)
            .checked_sub(1)
            .and_then(|index| self.fields.get_mut(index))
            .ok_or(Error::InvalidField(field))?;
        if !value.is_finite() {
            return Err(Error::NonFiniteValue(field));
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn field(&self, field: u8) -> Option<f32> {
        let index = (field as usize).checked_sub(1)?;
        self.fields.get(index).copied().flatten()
    }

    /// Non-finite coordinates leave the location out.
    pub fn with_location(mut self, latitude: f32, longitude: f32) -> Self {
        if latitude.is_finite() && longitude.is_finite() {
            self.latitude = Some(latitude);
            self.longitude = Some(longitude);
        } else {
            log::warn!("Ignoring location {}, {}", latitude, longitude);
        }
        self
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = Some(elevation).filter(|e| e.is_finite());
        self
    }

    pub fn with_status(mut self, status: &'a str) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    pub fn encode(&self) -> Result<String<PAYLOAD_CAPACITY>, Error> {
        let mut out = String::new();
        self.write_to(&mut out).map_err(|_| Error::PayloadTooLong)?;
        Ok(out)
    }

    fn write_to(&self, out: &mut String<PAYLOAD_CAPACITY>) -> core::fmt::Result {
        let mut sep = "";

        for (index, value) in self.fields.iter().enumerate() {
            if let Some(value) = value {
                write!(out, "{}field{}={:.2}", sep, index + 1, value)?;
                sep = "&";
            }
        }

        if let Some(latitude) = self.latitude {
            write!(out, "{}lat={:.6}", sep, latitude)?;
            sep = "&";
        }
        if let Some(longitude) = self.longitude {
            write!(out, "{}long={:.6}", sep, longitude)?;
            sep = "&";
        }
        if let Some(elevation) = self.elevation {
            write!(out, "{}elevation={:.2}", sep, elevation)?;
            sep = "&";
        }
        if let Some(status) = self.status {
            write!(out, "{}status=", sep)?;
            percent_encode(out, status)?;
        }

        Ok(())
    }
}

fn percent_encode(out: &mut String<PAYLOAD_CAPACITY>, s: &str) -> core::fmt::Result {
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char).map_err(|_| core::fmt::Error)?;
        } else {
            write!(out, "%{:02X}", byte)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const POND_FIELDS: FieldMap = FieldMap::new(&[
        ("temperature", 1),
        ("humidity", 2),
        ("pressure", 3),
    ]);

    #[test]
    fn encode_fields_in_order() {
        let mut payload = Payload::new();
        payload.set_field(3, 1013.25).unwrap();
        payload.set_field(1, 21.5).unwrap();
        assert_eq!(payload.encode().unwrap(), "field1=21.50&field3=1013.25");
    }

    #[test]
    fn encode_with_status() {
        let mut payload = Payload::new().with_status("MQTTPUBLISH");
        payload.set_field(1, 45.0).unwrap();
        payload.set_field(2, 60.0).unwrap();
        assert_eq!(
            payload.encode().unwrap(),
            "field1=45.00&field2=60.00&status=MQTTPUBLISH"
        );
    }

    #[test]
    fn encode_status_is_percent_encoded() {
        let payload = Payload::new().with_status("pump on & ok=1");
        assert_eq!(payload.encode().unwrap(), "status=pump%20on%20%26%20ok%3D1");
    }

    #[test]
    fn encode_location() {
        let mut payload = Payload::new()
            .with_location(54.978252, -1.61778)
            .with_elevation(55.0);
        payload.set_field(2, 1.0).unwrap();
        assert_eq!(
            payload.encode().unwrap(),
            "field2=1.00&lat=54.978252&long=-1.617780&elevation=55.00"
        );
    }

    #[test]
    fn encode_empty() {
        let payload = Payload::new();
        assert!(payload.is_empty());
        assert_eq!(payload.encode().unwrap(), "");
    }

    #[test]
    fn encode_too_long() {
        let status = "%".repeat(PAYLOAD_CAPACITY);
        let payload = Payload::new().with_status(&status);
        assert_eq!(payload.encode(), Err(Error::PayloadTooLong));
    }

    #[test]
    fn invalid_fields() {
        let mut payload = Payload::new();
        assert_eq!(payload.set_field(0, 1.0), Err(Error::InvalidField(0)));
        assert_eq!(payload.set_field(9, 1.0), Err(Error::InvalidField(9)));
        assert!(payload.set_field(8, 1.0).is_ok());
        assert_eq!(payload.field(8), Some(1.0));
        assert_eq!(payload.field(0), None);
    }

    #[test]
    fn from_readings_skips_unmapped() {
        let readings: [(&str, f32); 3] =
            [("temperature", 18.25), ("co2", 400.0), ("pressure", 1000.0)];
        let payload = Payload::from_readings(readings, &POND_FIELDS).unwrap();
        assert_eq!(payload.field(1), Some(18.25));
        assert_eq!(payload.field(2), None);
        assert_eq!(payload.field(3), Some(1000.0));
        assert_eq!(payload.encode().unwrap(), "field1=18.25&field3=1000.00");
    }

    #[test]
    fn from_readings_bad_map() {
        const BAD: FieldMap = FieldMap::new(&[("temperature", 12)]);
        let readings: [(&str, f32); 1] = [("temperature", 18.25)];
        assert_eq!(
            Payload::from_readings(readings, &BAD),
            Err(Error::InvalidField(12))
        );
    }

    #[test]
    fn non_finite_values_rejected() {
        let mut payload = Payload::new();
        assert_eq!(
            payload.set_field(1, f32::NAN),
            Err(Error::NonFiniteValue(1))
        );
        assert_eq!(
            payload.set_field(2, f32::INFINITY),
            Err(Error::NonFiniteValue(2))
        );
        assert_eq!(
            payload.set_field(3, f32::NEG_INFINITY),
            Err(Error::NonFiniteValue(3))
        );
        assert!(payload.is_empty());
        assert_eq!(
            payload.set_field(9, f32::NAN),
            Err(Error::InvalidField(9))
        );

        let payload = payload
            .with_location(f32::NAN, -1.61778)
            .with_elevation(f32::INFINITY);
        assert_eq!(payload.encode().unwrap(), "");
    }

    #[test]
    fn from_readings_skips_non_finite() {
        let readings: [(&str, f32); 3] = [
            ("temperature", f32::NAN),
            ("humidity", 61.0),
            ("pressure", f32::INFINITY),
        ];
        let payload = Payload::from_readings(readings, &POND_FIELDS).unwrap();
        assert_eq!(payload.encode().unwrap(), "field2=61.00");
    }
}
