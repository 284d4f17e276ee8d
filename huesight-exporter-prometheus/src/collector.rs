//! Resource collector interface and shared label handling.

use async_trait::async_trait;
use huesight_bridge_client::BridgeClient;

use crate::registry::{LabelSet, MetricDesc, Snapshot};

/// Label names used on device series.
pub mod label {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const MODEL_ID: &str = "model_id";
    pub const MANUFACTURER_NAME: &str = "manufacturer_name";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const UNIQUE_ID: &str = "unique_id";
    pub const DEVICE_ID: &str = "device_id";
}

/// Collects one resource class (lights, groups or sensors) from the bridge.
///
/// `collect` performs exactly one fetch and returns the complete set of series
/// the collector exposes for this scrape, including its failure counters. A
/// failed fetch yields an empty set of device series, never stale ones.
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    /// Resource class name, used as the registry slot.
    fn name(&self) -> &'static str;

    /// Every metric family this collector can expose.
    fn describe(&self) -> Vec<MetricDesc>;

    async fn collect(&self, bridge: &dyn BridgeClient) -> Snapshot;
}

/// Identifying labels of one emitted light or sensor series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceLabels {
    pub name: String,
    pub device_type: String,
    pub model_id: String,
    pub manufacturer_name: String,
    pub product_name: String,
    pub unique_id: String,
    /// Physical device key; only set on sensor series.
    pub device_id: Option<String>,
}

impl DeviceLabels {
    pub fn to_label_set(&self) -> LabelSet {
        let labels = LabelSet::new()
            .with(label::NAME, &self.name)
            .with(label::TYPE, &self.device_type)
            .with(label::MODEL_ID, &self.model_id)
            .with(label::MANUFACTURER_NAME, &self.manufacturer_name)
            .with(label::PRODUCT_NAME, &self.product_name)
            .with(label::UNIQUE_ID, &self.unique_id);

        match &self.device_id {
            Some(device_id) => labels.with(label::DEVICE_ID, device_id),
            None => labels,
        }
    }
}
