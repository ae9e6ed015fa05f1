//! The virtual twin of one physical sensor.
//!
//! A [`Sensor`] is a single record with a variant tag and two schema-driven
//! parameter tables: `configs` (device settings pushed twin → device) and
//! `values` (measurements pulled device → twin). Concrete sensor kinds differ
//! only in the default parameters seeded at construction, so there is no
//! trait hierarchy; [`Sensor::adc`] and [`Sensor::temperature_humidity`] are
//! preset constructors over the same type.

use std::collections::BTreeMap;
use std::str::FromStr;

use log::{debug, info};

use crate::codec;
use crate::error::TwinError;
use crate::parser;
use crate::render::Renderer;
use crate::transport::Transport;

/// Declared data type of a parameter. Fixed at registration; only the
/// value string mutates afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Double,
    Float,
    Text,
}

/// One configuration or value parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub value: String,
    pub unit: String,
    pub kind: ParamKind,
}

impl Parameter {
    pub fn new(value: impl Into<String>, unit: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            value: value.into(),
            unit: unit.into(),
            kind,
        }
    }
}

/// Sensor health as reported over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,
    Error,
    Offline,
}

impl Status {
    /// Decodes the wire status field. Unknown strings yield `None` and are
    /// ignored by callers.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Status::Ok),
            "-1" => Some(Status::Error),
            "0" => Some(Status::Offline),
            _ => None,
        }
    }
}

/// In-memory twin of one physical sensor.
#[derive(Debug)]
pub struct Sensor {
    /// Stable identity, unique within a manager.
    pub uid: String,
    /// Type discriminator, e.g. `"ADC"`.
    pub kind: String,
    pub description: String,
    pub status: Status,
    error: Option<TwinError>,
    /// True when the device has seen our current configuration.
    pub configs_synced: bool,
    /// True when our values mirror the device's latest measurements.
    pub values_synced: bool,
    /// True when a value changed since the last draw.
    pub redraw_pending: bool,
    configs: BTreeMap<String, Parameter>,
    values: BTreeMap<String, Parameter>,
}

/// Sensors with the same uid are considered identical.
impl PartialEq for Sensor {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Sensor {
    /// Bare sensor with empty parameter tables. Prefer the preset
    /// constructors for the built-in kinds.
    pub fn new(
        uid: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            kind: kind.into(),
            description: description.into(),
            status: Status::Ok,
            error: None,
            configs_synced: false,
            values_synced: false,
            redraw_pending: true,
            configs: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    /// Analog-to-digital converter twin.
    pub fn adc(uid: impl Into<String>) -> Self {
        let mut sensor = Self::new(uid, "ADC", "Analog to Digital Converter");
        sensor.add_config_parameter("resolution", Parameter::new("12", "bits", ParamKind::Int));
        sensor.add_value_parameter("value", Parameter::new("0", "", ParamKind::Int));
        sensor
    }

    /// Combined temperature and humidity probe twin.
    pub fn temperature_humidity(uid: impl Into<String>) -> Self {
        let mut sensor = Self::new(uid, "TH", "Temperature & Humidity Sensor");
        sensor.add_config_parameter("precision", Parameter::new("2", "decimals", ParamKind::Int));
        sensor.add_value_parameter(
            "temperature",
            Parameter::new("0", "Celsius", ParamKind::Float),
        );
        sensor.add_value_parameter("humidity", Parameter::new("0", "%", ParamKind::Int));
        sensor
    }

    pub fn configs(&self) -> &BTreeMap<String, Parameter> {
        &self.configs
    }

    pub fn values(&self) -> &BTreeMap<String, Parameter> {
        &self.values
    }

    /// Insert-or-replace a configuration parameter.
    pub fn add_config_parameter(&mut self, key: impl Into<String>, param: Parameter) {
        self.configs.insert(key.into(), param);
        self.configs_synced = false;
    }

    /// Insert-or-replace a value parameter.
    pub fn add_value_parameter(&mut self, key: impl Into<String>, param: Parameter) {
        self.values.insert(key.into(), param);
        self.values_synced = false;
    }

    pub fn set_config(&mut self, key: &str, value: impl Into<String>) -> Result<(), TwinError> {
        match self.configs.get_mut(key) {
            Some(param) => {
                param.value = value.into();
                self.configs_synced = false;
                Ok(())
            }
            None => Err(TwinError::config_not_found(format!("key: {key}"))),
        }
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> Result<(), TwinError> {
        match self.values.get_mut(key) {
            Some(param) => {
                param.value = value.into();
                self.values_synced = false;
                self.redraw_pending = true;
                Ok(())
            }
            None => Err(TwinError::value_not_found(format!("key: {key}"))),
        }
    }

    /// Typed read of a configuration parameter. Absent or empty values are
    /// not-found; a value that does not parse as `T` is a conversion error.
    pub fn get_config<T: FromStr>(&self, key: &str) -> Result<T, TwinError> {
        let value = self.configs.get(key).map_or("", |p| p.value.as_str());
        if value.is_empty() {
            return Err(TwinError::config_not_found(format!("key: {key}")));
        }
        convert(value)
    }

    /// Typed read of a value parameter, same contract as [`get_config`].
    ///
    /// [`get_config`]: Sensor::get_config
    pub fn get_value<T: FromStr>(&self, key: &str) -> Result<T, TwinError> {
        let value = self.values.get(key).map_or("", |p| p.value.as_str());
        if value.is_empty() {
            return Err(TwinError::value_not_found(format!("key: {key}")));
        }
        convert(value)
    }

    /// Unit string of a configuration parameter, empty when absent.
    pub fn config_units(&self, key: &str) -> &str {
        self.configs.get(key).map_or("", |p| p.unit.as_str())
    }

    /// Unit string of a value parameter, empty when absent.
    pub fn value_units(&self, key: &str) -> &str {
        self.values.get(key).map_or("", |p| p.unit.as_str())
    }

    /// Overwrites every configuration parameter that has a match in `cfg`.
    /// Fails only when no key in the table matched at all; a partial match
    /// is success.
    pub fn apply_config_str(&mut self, cfg: &str) -> Result<(), TwinError> {
        let mut matched = 0;
        for (key, param) in self.configs.iter_mut() {
            let value = codec::extract(cfg, key, codec::PAIR_SEPARATOR);
            if !value.is_empty() {
                param.value = value;
                matched += 1;
            }
        }
        if matched == 0 {
            return Err(TwinError::config_not_found(
                "no known key in configuration string",
            ));
        }
        self.configs_synced = false;
        Ok(())
    }

    /// Symmetric to [`apply_config_str`] over the value table.
    ///
    /// [`apply_config_str`]: Sensor::apply_config_str
    pub fn apply_update_str(&mut self, upd: &str) -> Result<(), TwinError> {
        let mut matched = 0;
        for (key, param) in self.values.iter_mut() {
            let value = codec::extract(upd, key, codec::PAIR_SEPARATOR);
            if !value.is_empty() {
                param.value = value;
                matched += 1;
            }
        }
        if matched == 0 {
            return Err(TwinError::value_not_found("no known key in update string"));
        }
        self.values_synced = false;
        self.redraw_pending = true;
        Ok(())
    }

    /// Replaces the current error (dropping any previous one, chain
    /// included) and recomputes the status: `Ok` when cleared or when the
    /// severity is only a warning, `Error` otherwise.
    pub fn set_error(&mut self, error: Option<TwinError>) {
        self.status = match &error {
            None => Status::Ok,
            Some(e) if e.is_warning() => Status::Ok,
            Some(_) => Status::Error,
        };
        self.error = error;
    }

    pub fn error(&self) -> Option<&TwinError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> String {
        match &self.error {
            Some(e) => e.to_string(),
            None => "No error".to_string(),
        }
    }

    /// Header every outgoing message for this sensor starts with.
    pub fn basic_header(&self) -> String {
        format!("?type={}&id={}", self.kind, self.uid)
    }

    /// Brings twin and device back in step.
    ///
    /// A dirty configuration is pushed first; dirty values are then pulled
    /// with a `?UPDATE` request. A mismatched, empty or malformed pull
    /// response is not an error: the values stay dirty and the next call
    /// retries. Transport failures propagate to the caller.
    pub fn synchronize(&mut self, transport: &mut dyn Transport) -> Result<(), TwinError> {
        if !self.configs_synced {
            let message = codec::encode(
                self.configs
                    .iter()
                    .map(|(k, p)| (k.as_str(), p.value.as_str())),
                &self.basic_header(),
            );
            debug!("sensor {}: pushing config: {}", self.uid, message);
            transport.send(&message)?;
            self.configs_synced = true;
        }

        if !self.values_synced {
            let request = format!("{}UPDATE&id={}", codec::MARKER, self.uid);
            transport.send(&request)?;
            let response = transport.receive()?;

            let metadata = parser::parse_response(&response);
            if !parser::is_valid(&metadata, &self.uid) {
                debug!(
                    "sensor {}: unusable pull response {:?}, will retry",
                    self.uid, response
                );
                return Ok(());
            }
            if self.apply_update_str(&metadata.payload).is_err() {
                debug!(
                    "sensor {}: pull response carried no known value key, will retry",
                    self.uid
                );
                return Ok(());
            }
            if let Some(status) = metadata.status.as_deref().and_then(Status::from_wire) {
                self.status = status;
            }
            self.values_synced = true;
            self.redraw_pending = true;
        }

        Ok(())
    }

    /// Delegates to the renderer when a redraw is pending, then clears the
    /// flag.
    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        if !self.redraw_pending {
            return;
        }
        renderer.draw(self);
        self.redraw_pending = false;
    }

    /// Logs the full state of the twin.
    pub fn print(&self) {
        info!("Sensor UID: {}", self.uid);
        info!("\tType: {}", self.kind);
        info!("\tDescription: {}", self.description);
        info!("\tStatus: {:?}", self.status);
        info!("\tError: {}", self.error_message());
        info!("\tConfigurations:");
        for (key, param) in &self.configs {
            info!("\t\t{}: {} {}", key, param.value, param.unit);
        }
        info!("\tValues:");
        for (key, param) in &self.values {
            info!("\t\t{}: {} {}", key, param.value, param.unit);
        }
    }
}

fn convert<T: FromStr>(value: &str) -> Result<T, TwinError> {
    value
        .parse::<T>()
        .map_err(|_| TwinError::type_conversion(value, std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::mock::MockTransport;

    #[test]
    fn fresh_adc_has_default_schema() {
        let adc = Sensor::adc("0");
        assert_eq!(adc.kind, "ADC");
        assert_eq!(adc.get_config::<i32>("resolution").unwrap(), 12);
        assert_eq!(adc.get_value::<i32>("value").unwrap(), 0);
        assert_eq!(adc.config_units("resolution"), "bits");
        assert!(!adc.configs_synced);
        assert!(!adc.values_synced);
        assert!(adc.redraw_pending);
    }

    #[test]
    fn fresh_th_has_default_schema() {
        let th = Sensor::temperature_humidity("2");
        assert_eq!(th.kind, "TH");
        assert_eq!(th.get_value::<f32>("temperature").unwrap(), 0.0);
        assert_eq!(th.get_value::<i32>("humidity").unwrap(), 0);
        assert_eq!(th.value_units("temperature"), "Celsius");
        assert_eq!(th.value_units("humidity"), "%");
    }

    #[test]
    fn sensors_compare_by_uid() {
        assert_eq!(Sensor::adc("1"), Sensor::temperature_humidity("1"));
        assert_ne!(Sensor::adc("1"), Sensor::adc("2"));
    }

    #[test]
    fn set_value_marks_dirty_and_redraw() {
        let mut adc = Sensor::adc("0");
        adc.values_synced = true;
        adc.redraw_pending = false;

        adc.set_value("value", "128").unwrap();
        assert_eq!(adc.get_value::<i32>("value").unwrap(), 128);
        assert!(!adc.values_synced);
        assert!(adc.redraw_pending);
    }

    #[test]
    fn set_config_on_unknown_key_fails() {
        let mut adc = Sensor::adc("0");
        let err = adc.set_config("gain", "4").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ConfigNotFound(_)));
    }

    #[test]
    fn get_value_type_mismatch_is_conversion_error() {
        let mut adc = Sensor::adc("0");
        adc.set_value("value", "not-a-number").unwrap();
        let err = adc.get_value::<i32>("value").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeConversion { .. }));
    }

    #[test]
    fn get_value_on_empty_string_is_not_found() {
        let mut adc = Sensor::adc("0");
        adc.set_value("value", "").unwrap();
        let err = adc.get_value::<i32>("value").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueNotFound(_)));
    }

    #[test]
    fn apply_config_str_is_case_sensitive() {
        let mut adc = Sensor::adc("0");
        assert!(adc.apply_config_str("Resolution=10").is_err());
        assert_eq!(adc.get_config::<i32>("resolution").unwrap(), 12);

        adc.apply_config_str("resolution=10").unwrap();
        assert_eq!(adc.get_config::<i32>("resolution").unwrap(), 10);
    }

    #[test]
    fn apply_update_str_updates_value() {
        let mut adc = Sensor::adc("0");
        adc.apply_update_str("value=255").unwrap();
        assert_eq!(adc.get_value::<i32>("value").unwrap(), 255);
        assert!(adc.redraw_pending);
        assert!(!adc.values_synced);
    }

    #[test]
    fn apply_update_str_partial_match_is_success() {
        let mut th = Sensor::temperature_humidity("2");
        th.apply_update_str("temperature=21.5&pressure=1013").unwrap();
        assert_eq!(th.get_value::<f32>("temperature").unwrap(), 21.5);
        assert_eq!(th.get_value::<i32>("humidity").unwrap(), 0);
    }

    #[test]
    fn apply_update_str_with_no_match_fails() {
        let mut adc = Sensor::adc("0");
        let err = adc.apply_update_str("pressure=1013").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueNotFound(_)));
    }

    #[test]
    fn set_error_recomputes_status() {
        let mut adc = Sensor::adc("0");
        adc.set_error(Some(TwinError::transport("receive failed")));
        assert_eq!(adc.status, Status::Error);

        adc.set_error(Some(TwinError::value_not_found("key: value").warning()));
        assert_eq!(adc.status, Status::Ok);

        adc.set_error(None);
        assert_eq!(adc.status, Status::Ok);
        assert_eq!(adc.error_message(), "No error");
    }

    #[test]
    fn synchronize_pushes_config_once() {
        let mut adc = Sensor::adc("7");
        let mut transport = MockTransport::new().respond("?id=7&status=1&value=255");

        adc.synchronize(&mut transport).unwrap();
        assert_eq!(transport.sent[0], "?type=ADC&id=7&resolution=12");
        assert!(adc.configs_synced);

        // A second call with everything in sync sends nothing.
        adc.synchronize(&mut transport).unwrap();
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn synchronize_pulls_values_and_status() {
        let mut adc = Sensor::adc("7");
        let mut transport = MockTransport::new().respond("?id=7&status=0&value=42");

        adc.synchronize(&mut transport).unwrap();
        assert_eq!(transport.sent[1], "?UPDATE&id=7");
        assert_eq!(adc.get_value::<i32>("value").unwrap(), 42);
        assert_eq!(adc.status, Status::Offline);
        assert!(adc.values_synced);
        assert!(adc.redraw_pending);
    }

    #[test]
    fn synchronize_ignores_unknown_status() {
        let mut adc = Sensor::adc("7");
        let mut transport = MockTransport::new().respond("?id=7&status=9&value=42");

        adc.synchronize(&mut transport).unwrap();
        assert_eq!(adc.status, Status::Ok);
        assert!(adc.values_synced);
    }

    #[test]
    fn synchronize_mismatched_uid_leaves_values_dirty() {
        let mut adc = Sensor::adc("7");
        let mut transport = MockTransport::new().respond("?id=8&status=1&value=42");

        adc.synchronize(&mut transport).unwrap();
        assert!(!adc.values_synced);
        assert_eq!(adc.get_value::<i32>("value").unwrap(), 0);
    }

    #[test]
    fn synchronize_timeout_leaves_values_dirty() {
        let mut adc = Sensor::adc("7");
        // Empty response simulates a transport timeout.
        let mut transport = MockTransport::new().respond("");

        adc.synchronize(&mut transport).unwrap();
        assert!(adc.configs_synced);
        assert!(!adc.values_synced);
    }

    #[test]
    fn synchronize_propagates_send_failure() {
        let mut adc = Sensor::adc("7");
        let mut transport = MockTransport::new();
        transport.fail_send = true;

        let err = adc.synchronize(&mut transport).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Transport(_)));
        assert!(!adc.configs_synced);
    }

    #[test]
    fn draw_clears_pending_flag() {
        struct CountingRenderer(usize);
        impl Renderer for CountingRenderer {
            fn construct(&mut self, _: &Sensor) {}
            fn draw(&mut self, _: &Sensor) {
                self.0 += 1;
            }
        }

        let mut adc = Sensor::adc("0");
        let mut renderer = CountingRenderer(0);

        adc.draw(&mut renderer);
        assert_eq!(renderer.0, 1);
        assert!(!adc.redraw_pending);

        adc.draw(&mut renderer);
        assert_eq!(renderer.0, 1);
    }

    #[test]
    fn status_wire_mapping() {
        assert_eq!(Status::from_wire("1"), Some(Status::Ok));
        assert_eq!(Status::from_wire("-1"), Some(Status::Error));
        assert_eq!(Status::from_wire("0"), Some(Status::Offline));
        assert_eq!(Status::from_wire("2"), None);
        assert_eq!(Status::from_wire(""), None);
    }
}
