//! Scrape orchestration.
//!
//! One [`Exporter::scrape`] call runs every collector against the bridge,
//! publishes each collector's snapshot into the [`Registry`] and renders the
//! exposition text. Scrapes are serialized, so concurrent readers of the
//! metrics endpoint never interleave counter updates or restart detection.

use std::sync::Arc;
use std::time::Instant;

use huesight_bridge_client::BridgeClient;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use crate::collector::ResourceCollector;
use crate::config::ExporterConfig;
use crate::groups::GroupCollector;
use crate::lights::LightCollector;
use crate::registry::{MetricDesc, Registry};
use crate::sensors::SensorCollector;

/// Shared exporter handle.
pub type SharedExporter = Arc<Exporter>;

/// Scrape statistics.
#[derive(Debug, Clone, Default)]
pub struct ScrapeStats {
    /// Total scrapes run.
    pub scrapes: u64,
    /// Duration of the most recent scrape in milliseconds.
    pub last_duration_ms: u64,
    /// Series exposed after the most recent scrape.
    pub last_series: usize,
}

/// Drives the resource collectors and owns the metrics registry.
pub struct Exporter {
    bridge: Arc<dyn BridgeClient>,
    collectors: Vec<Box<dyn ResourceCollector>>,
    registry: Registry,
    scrape_lock: Mutex<()>,
    stats: RwLock<ScrapeStats>,
}

impl Exporter {
    /// Create an exporter with the group, light and sensor collectors.
    pub fn new(bridge: Arc<dyn BridgeClient>, config: &ExporterConfig) -> Self {
        let namespace = &config.prometheus.namespace;
        let collectors: Vec<Box<dyn ResourceCollector>> = vec![
            Box::new(GroupCollector::new(namespace)),
            Box::new(LightCollector::new(namespace)),
            Box::new(SensorCollector::new(namespace, &config.sensors)),
        ];

        Self::with_collectors(bridge, collectors)
    }

    /// Create an exporter with an explicit collector list.
    pub fn with_collectors(
        bridge: Arc<dyn BridgeClient>,
        collectors: Vec<Box<dyn ResourceCollector>>,
    ) -> Self {
        Self {
            bridge,
            collectors,
            registry: Registry::new(),
            scrape_lock: Mutex::new(()),
            stats: RwLock::new(ScrapeStats::default()),
        }
    }

    /// Every metric family the exporter can expose.
    pub fn describe(&self) -> Vec<MetricDesc> {
        self.collectors
            .iter()
            .flat_map(|collector| collector.describe())
            .collect()
    }

    /// Run one full scrape and render the result.
    ///
    /// A failing resource class only empties its own series; the other
    /// collectors still publish.
    pub async fn scrape(&self) -> String {
        let _guard = self.scrape_lock.lock().await;
        let started = Instant::now();

        for collector in &self.collectors {
            let snapshot = collector.collect(self.bridge.as_ref()).await;
            self.registry.publish(collector.name(), snapshot);
        }

        let output = self.registry.render();
        let series = self.registry.series_count();
        let elapsed = started.elapsed();

        {
            let mut stats = self.stats.write();
            stats.scrapes += 1;
            stats.last_duration_ms = elapsed.as_millis() as u64;
            stats.last_series = series;
        }

        debug!(
            series,
            duration_ms = elapsed.as_millis() as u64,
            "Scrape complete"
        );

        output
    }

    /// Render the last published snapshots without contacting the bridge.
    pub fn render(&self) -> String {
        self.registry.render()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> ScrapeStats {
        self.stats.read().clone()
    }
}
