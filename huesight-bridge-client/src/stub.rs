//! In-memory bridge used by tests.

use std::collections::HashSet;

use async_trait::async_trait;
use huesight_common::{GroupRecord, LightRecord, SensorRecord};
use parking_lot::RwLock;

use crate::client::BridgeClient;
use crate::error::{BridgeClientError, Result};

/// Hue API error type for an internal bridge error.
const API_ERROR_INTERNAL: u16 = 901;

/// A resource class whose fetch should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    Lights,
    Groups,
    Sensors,
}

#[derive(Debug, Default)]
struct StubData {
    lights: Vec<LightRecord>,
    groups: Vec<GroupRecord>,
    sensors: Vec<SensorRecord>,
    failures: HashSet<Failure>,
}

/// A [`BridgeClient`] serving fixed records.
///
/// Records and failures can be changed between scrapes through `&self`.
#[derive(Debug, Default)]
pub struct StubBridge {
    data: RwLock<StubData>,
}

impl StubBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lights(self, lights: Vec<LightRecord>) -> Self {
        self.set_lights(lights);
        self
    }

    pub fn with_groups(self, groups: Vec<GroupRecord>) -> Self {
        self.set_groups(groups);
        self
    }

    pub fn with_sensors(self, sensors: Vec<SensorRecord>) -> Self {
        self.set_sensors(sensors);
        self
    }

    pub fn with_failure(self, failure: Failure) -> Self {
        self.fail(failure);
        self
    }

    pub fn set_lights(&self, lights: Vec<LightRecord>) {
        self.data.write().lights = lights;
    }

    pub fn set_groups(&self, groups: Vec<GroupRecord>) {
        self.data.write().groups = groups;
    }

    pub fn set_sensors(&self, sensors: Vec<SensorRecord>) {
        self.data.write().sensors = sensors;
    }

    /// Make fetches of `failure`'s resource class fail until [`recover`](Self::recover).
    pub fn fail(&self, failure: Failure) {
        self.data.write().failures.insert(failure);
    }

    pub fn recover(&self, failure: Failure) {
        self.data.write().failures.remove(&failure);
    }

    fn check(&self, failure: Failure, resource: &str) -> Result<()> {
        if self.data.read().failures.contains(&failure) {
            return Err(BridgeClientError::api(
                API_ERROR_INTERNAL,
                format!("/{}", resource),
                format!("deliberate get {} failure", resource),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BridgeClient for StubBridge {
    async fn fetch_lights(&self) -> Result<Vec<LightRecord>> {
        self.check(Failure::Lights, "lights")?;
        Ok(self.data.read().lights.clone())
    }

    async fn fetch_groups(&self) -> Result<Vec<GroupRecord>> {
        self.check(Failure::Groups, "groups")?;
        Ok(self.data.read().groups.clone())
    }

    async fn fetch_sensors(&self) -> Result<Vec<SensorRecord>> {
        self.check(Failure::Sensors, "sensors")?;
        Ok(self.data.read().sensors.clone())
    }
}
