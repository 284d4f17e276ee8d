//! Sensor collector.

use async_trait::async_trait;
use huesight_bridge_client::BridgeClient;
use tracing::{debug, error, info};

use crate::collector::ResourceCollector;
use crate::config::SensorsConfig;
use crate::reconcile::{Reconciler, SensorScrape};
use crate::registry::{Counter, GaugeVec, MetricDesc, Snapshot};

/// Exposes sensor values, battery, timestamps and health, plus the bridge
/// restart heuristic.
pub struct SensorCollector {
    reconciler: Reconciler,
    value: MetricDesc,
    battery: MetricDesc,
    last_updated: MetricDesc,
    on: MetricDesc,
    reachable: MetricDesc,
    scrapes_failed: Counter,
    bridge_restarts: Counter,
}

impl SensorCollector {
    pub fn new(namespace: &str, config: &SensorsConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config.ignore_types.iter().cloned(), config.match_names),
            value: MetricDesc::gauge(namespace, "sensor", "value", "Sensor values"),
            battery: MetricDesc::gauge(namespace, "sensor", "battery", "Sensor battery levels (%)"),
            last_updated: MetricDesc::gauge(
                namespace,
                "sensor",
                "last_updated",
                "Sensor last updated time",
            ),
            on: MetricDesc::gauge(namespace, "sensor", "on", "Sensor on/off (1/0)"),
            reachable: MetricDesc::gauge(
                namespace,
                "sensor",
                "reachable",
                "Sensor reachability (1/0)",
            ),
            scrapes_failed: Counter::new(MetricDesc::counter(
                namespace,
                "sensor",
                "scrapes_failed",
                "Count of scrapes of sensor data from the Hue bridge that have failed",
            )),
            bridge_restarts: Counter::new(MetricDesc::counter(
                namespace,
                "bridge",
                "restarts",
                "Count of number of bridge restarts detected",
            )),
        }
    }

    pub fn scrapes_failed(&self) -> u64 {
        self.scrapes_failed.get()
    }

    pub fn bridge_restarts(&self) -> u64 {
        self.bridge_restarts.get()
    }

    /// Build this scrape's snapshot from reconciled readings.
    fn emit(&self, scrape: &SensorScrape) -> Snapshot {
        let mut value = GaugeVec::new(self.value.clone());
        let mut battery = GaugeVec::new(self.battery.clone());
        let mut last_updated = GaugeVec::new(self.last_updated.clone());
        let mut on = GaugeVec::new(self.on.clone());
        let mut reachable = GaugeVec::new(self.reachable.clone());

        for reading in &scrape.readings {
            let labels = reading.labels.to_label_set();
            value.set(labels.clone(), reading.value);
            battery.set(labels.clone(), f64::from(reading.battery));
            last_updated.set(labels.clone(), reading.last_updated as f64);
            on.set_bool(labels.clone(), reading.on);
            reachable.set_bool(labels, reading.reachable);
        }

        Snapshot::new(vec![
            value.into_family(),
            battery.into_family(),
            last_updated.into_family(),
            on.into_family(),
            reachable.into_family(),
            self.scrapes_failed.family(),
            self.bridge_restarts.family(),
        ])
    }
}

#[async_trait]
impl ResourceCollector for SensorCollector {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            self.value.clone(),
            self.battery.clone(),
            self.last_updated.clone(),
            self.on.clone(),
            self.reachable.clone(),
            self.scrapes_failed.desc().clone(),
            self.bridge_restarts.desc().clone(),
        ]
    }

    async fn collect(&self, bridge: &dyn BridgeClient) -> Snapshot {
        let sensors = match bridge.fetch_sensors().await {
            Ok(sensors) => sensors,
            Err(e) => {
                error!(error = %e, "Failed to update sensors");
                self.scrapes_failed.inc();
                Vec::new()
            }
        };

        let scrape = self.reconciler.reconcile(&sensors);
        if scrape.restart_observed {
            info!("Bridge restart detected");
            self.bridge_restarts.inc();
        }

        debug!(
            received = sensors.len(),
            emitted = scrape.readings.len(),
            "Collected sensors"
        );

        self.emit(&scrape)
    }
}
