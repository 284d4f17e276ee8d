//! Two-pass sensor reconciliation.
//!
//! Motion sensors expose presence, temperature and light level as three
//! logical sensors. Only the presence sensor usually carries the name the user
//! chose; its companions keep vendor placeholders. The first pass handles
//! standalone and naming-authoritative sensors and records the authoritative
//! names per physical device. The second pass handles the remaining split
//! sensors and, when name matching is enabled, borrows those names.

use std::collections::{HashMap, HashSet};

use huesight_common::SensorRecord;
use tracing::{trace, warn};

use crate::classify::{Classification, Pass, SensorKind, classify};
use crate::collector::DeviceLabels;
use crate::identity::device_key;
use crate::restart::RestartDetector;

/// Authoritative human names by physical device key.
#[derive(Debug, Default)]
pub struct NameIndex {
    names: HashMap<String, String>,
}

impl NameIndex {
    pub fn insert(&mut self, device_key: &str, name: &str) {
        self.names.insert(device_key.to_string(), name.to_string());
    }

    pub fn get(&self, device_key: &str) -> Option<&str> {
        self.names.get(device_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One logical sensor ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub labels: DeviceLabels,
    pub value: f64,
    pub battery: u8,
    /// Epoch seconds, or the "no timestamp" sentinel.
    pub last_updated: i64,
    pub on: bool,
    pub reachable: bool,
}

/// Outcome of reconciling one scrape's sensor records.
#[derive(Debug, Default)]
pub struct SensorScrape {
    /// Readings in emission order: first-pass sensors, then second-pass sensors.
    pub readings: Vec<SensorReading>,
    /// True if any sensor's timestamp regressed to unset during this scrape.
    pub restart_observed: bool,
}

/// Sensor reconciliation settings.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    ignore_types: HashSet<String>,
    match_names: bool,
}

impl Reconciler {
    pub fn new(ignore_types: impl IntoIterator<Item = String>, match_names: bool) -> Self {
        Self {
            ignore_types: ignore_types.into_iter().collect(),
            match_names,
        }
    }

    /// Run both passes over one scrape's records.
    pub fn reconcile(&self, sensors: &[SensorRecord]) -> SensorScrape {
        let mut names = NameIndex::default();
        let mut restarts = RestartDetector::new();
        let mut readings = Vec::with_capacity(sensors.len());

        for pass in [Pass::First, Pass::Second] {
            for sensor in sensors {
                if let Some(reading) = self.process(sensor, pass, &mut names, &mut restarts) {
                    readings.push(reading);
                }
            }
        }

        SensorScrape {
            readings,
            restart_observed: restarts.restart_observed(),
        }
    }

    fn process(
        &self,
        sensor: &SensorRecord,
        pass: Pass,
        names: &mut NameIndex,
        restarts: &mut RestartDetector,
    ) -> Option<SensorReading> {
        let kind = match classify(&sensor.sensor_type, &self.ignore_types) {
            Classification::Supported(kind) if kind.pass() == pass => kind,
            Classification::Supported(_) => return None,
            Classification::Ignored => {
                if pass == Pass::First {
                    trace!(sensor_type = %sensor.sensor_type, name = %sensor.name, "Ignoring sensor type");
                }
                return None;
            }
            Classification::Unsupported => {
                if pass == Pass::First {
                    trace!(sensor_type = %sensor.sensor_type, name = %sensor.name, "Skipping unsupported sensor type");
                }
                return None;
            }
        };

        let device_id = match device_key(&sensor.unique_id, kind.is_split()) {
            Ok(key) => key,
            Err(e) => {
                warn!(
                    sensor_type = kind.tag(),
                    name = %sensor.name,
                    error = %e,
                    "Skipping sensor without a usable device id"
                );
                return None;
            }
        };

        let name = match pass {
            Pass::First => {
                if kind.is_naming_authority() {
                    names.insert(device_id, &sensor.name);
                }
                sensor.name.clone()
            }
            Pass::Second if self.match_names => names
                .get(device_id)
                .unwrap_or(sensor.name.as_str())
                .to_string(),
            Pass::Second => sensor.name.clone(),
        };

        let last_updated = sensor.state.last_updated.epoch_seconds();
        restarts.observe(&sensor.unique_id, last_updated);

        Some(SensorReading {
            kind,
            labels: DeviceLabels {
                name,
                device_type: sensor.sensor_type.clone(),
                model_id: sensor.model_id.clone(),
                manufacturer_name: sensor.manufacturer_name.clone(),
                product_name: sensor.product_name.clone(),
                unique_id: sensor.unique_id.clone(),
                device_id: Some(device_id.to_string()),
            },
            value: kind.primary_value(&sensor.state),
            battery: sensor.config.battery,
            last_updated,
            on: sensor.config.on,
            reachable: sensor.config.reachable,
        })
    }
}
