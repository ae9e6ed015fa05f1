//! Maps sensor type names to constructors and builds the initial sensor
//! collection, either from the fixed built-in list or from a discovery
//! response.

use indexmap::IndexMap;
use log::{info, warn};

use crate::codec;
use crate::error::TwinError;
use crate::sensor::Sensor;

/// Constructor for one sensor kind. Built-in constructors are deterministic
/// and never touch I/O.
pub type Constructor = fn(String) -> Sensor;

#[derive(Debug, Default)]
pub struct SensorFactory {
    constructors: IndexMap<String, Constructor>,
}

impl SensorFactory {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in kinds `ADC` and `TH`.
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register("ADC", |uid| Sensor::adc(uid));
        factory.register("TH", |uid| Sensor::temperature_humidity(uid));
        factory
    }

    /// Registers a constructor under a type name. Re-registering a name
    /// silently overwrites the previous constructor.
    pub fn register(&mut self, kind: &str, constructor: Constructor) {
        self.constructors.insert(kind.to_string(), constructor);
    }

    pub fn create(&self, kind: &str, uid: &str) -> Result<Sensor, TwinError> {
        match self.constructors.get(kind) {
            Some(constructor) => Ok(constructor(uid.to_string())),
            None => Err(TwinError::unknown_sensor_type(kind)),
        }
    }

    /// The fixed fallback collection used when discovery is disabled or
    /// yields nothing usable.
    pub fn builtin_list() -> Vec<Sensor> {
        vec![
            Sensor::adc("0"),
            Sensor::adc("1"),
            Sensor::temperature_humidity("2"),
        ]
    }

    /// Builds sensors from a discovery response of the form
    /// `?id1:Type1&id2:Type2...`. Best-effort: segments that are empty,
    /// malformed or of an unknown type are skipped with a warning instead of
    /// aborting the batch.
    pub fn from_discovery(&self, response: &str) -> Vec<Sensor> {
        let body = response.strip_prefix(codec::MARKER).unwrap_or(response);
        let segments = codec::split(body, codec::PAIR_SEPARATOR);
        info!("discovery listed {} segment(s)", segments.len());

        let mut sensors = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            let Some((uid, kind)) = segment.split_once(':') else {
                warn!("skipping malformed discovery segment {segment:?}");
                continue;
            };
            match self.create(kind, uid) {
                Ok(sensor) => {
                    info!("discovered sensor {uid} of type {kind}");
                    sensors.push(sensor);
                }
                Err(e) => warn!("skipping sensor {uid}: {e}"),
            }
        }
        sensors
    }
}
