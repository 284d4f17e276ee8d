//! Light collector.

use async_trait::async_trait;
use huesight_bridge_client::BridgeClient;
use huesight_common::LightRecord;
use tracing::{debug, error};

use crate::collector::{DeviceLabels, ResourceCollector};
use crate::registry::{Counter, GaugeVec, MetricDesc, Snapshot};

/// Exposes per-light state and reachability.
pub struct LightCollector {
    on: MetricDesc,
    brightness: MetricDesc,
    hue: MetricDesc,
    saturation: MetricDesc,
    reachable: MetricDesc,
    scrapes_failed: Counter,
}

impl LightCollector {
    pub fn new(namespace: &str) -> Self {
        Self {
            on: MetricDesc::gauge(namespace, "light", "on", "Light on (1 = on, 0 = off)"),
            brightness: MetricDesc::gauge(namespace, "light", "brightness", "Light brightness level"),
            hue: MetricDesc::gauge(namespace, "light", "hue", "Light hue"),
            saturation: MetricDesc::gauge(namespace, "light", "saturation", "Light saturation"),
            reachable: MetricDesc::gauge(
                namespace,
                "light",
                "reachable",
                "Light reachability (1/0)",
            ),
            scrapes_failed: Counter::new(MetricDesc::counter(
                namespace,
                "light",
                "scrapes_failed",
                "Count of scrapes of light data from the Hue bridge that have failed",
            )),
        }
    }

    pub fn scrapes_failed(&self) -> u64 {
        self.scrapes_failed.get()
    }

    fn emit(&self, lights: &[LightRecord]) -> Snapshot {
        let mut on = GaugeVec::new(self.on.clone());
        let mut brightness = GaugeVec::new(self.brightness.clone());
        let mut hue = GaugeVec::new(self.hue.clone());
        let mut saturation = GaugeVec::new(self.saturation.clone());
        let mut reachable = GaugeVec::new(self.reachable.clone());

        for light in lights {
            let labels = DeviceLabels {
                name: light.name.clone(),
                device_type: light.light_type.clone(),
                model_id: light.model_id.clone(),
                manufacturer_name: light.manufacturer_name.clone(),
                product_name: light.product_name.clone(),
                unique_id: light.unique_id.clone(),
                device_id: None,
            }
            .to_label_set();

            on.set_bool(labels.clone(), light.state.on);
            brightness.set(labels.clone(), f64::from(light.state.brightness));
            hue.set(labels.clone(), f64::from(light.state.hue));
            saturation.set(labels.clone(), f64::from(light.state.saturation));
            reachable.set_bool(labels, light.state.reachable);
        }

        Snapshot::new(vec![
            on.into_family(),
            brightness.into_family(),
            hue.into_family(),
            saturation.into_family(),
            reachable.into_family(),
            self.scrapes_failed.family(),
        ])
    }
}

#[async_trait]
impl ResourceCollector for LightCollector {
    fn name(&self) -> &'static str {
        "lights"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            self.on.clone(),
            self.brightness.clone(),
            self.hue.clone(),
            self.saturation.clone(),
            self.reachable.clone(),
            self.scrapes_failed.desc().clone(),
        ]
    }

    async fn collect(&self, bridge: &dyn BridgeClient) -> Snapshot {
        let lights = match bridge.fetch_lights().await {
            Ok(lights) => lights,
            Err(e) => {
                error!(error = %e, "Failed to update lights");
                self.scrapes_failed.inc();
                Vec::new()
            }
        };

        debug!(count = lights.len(), "Collected lights");
        self.emit(&lights)
    }
}
