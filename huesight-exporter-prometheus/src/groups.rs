//! Group collector.

use async_trait::async_trait;
use huesight_bridge_client::BridgeClient;
use huesight_common::GroupRecord;
use tracing::{debug, error};

use crate::collector::{ResourceCollector, label};
use crate::registry::{Counter, GaugeVec, LabelSet, MetricDesc, Snapshot};

/// Exposes group state. Groups are labeled by name and type only.
pub struct GroupCollector {
    on: MetricDesc,
    brightness: MetricDesc,
    hue: MetricDesc,
    saturation: MetricDesc,
    scrapes_failed: Counter,
}

impl GroupCollector {
    pub fn new(namespace: &str) -> Self {
        Self {
            on: MetricDesc::gauge(
                namespace,
                "group",
                "on",
                "Group on (2 = all group members on, 1 = some group members on, 0 = all group members off)",
            ),
            brightness: MetricDesc::gauge(namespace, "group", "brightness", "Group brightness level"),
            hue: MetricDesc::gauge(namespace, "group", "hue", "Group hue"),
            saturation: MetricDesc::gauge(namespace, "group", "saturation", "Group saturation"),
            scrapes_failed: Counter::new(MetricDesc::counter(
                namespace,
                "group",
                "scrapes_failed",
                "Count of scrapes of group data from the Hue bridge that have failed",
            )),
        }
    }

    pub fn scrapes_failed(&self) -> u64 {
        self.scrapes_failed.get()
    }

    fn emit(&self, groups: &[GroupRecord]) -> Snapshot {
        let mut on = GaugeVec::new(self.on.clone());
        let mut brightness = GaugeVec::new(self.brightness.clone());
        let mut hue = GaugeVec::new(self.hue.clone());
        let mut saturation = GaugeVec::new(self.saturation.clone());

        for group in groups {
            let labels = LabelSet::new()
                .with(label::NAME, &group.name)
                .with(label::TYPE, &group.group_type);

            on.set(labels.clone(), on_level(group));
            brightness.set(labels.clone(), f64::from(group.action.brightness));
            hue.set(labels.clone(), f64::from(group.action.hue));
            saturation.set(labels, f64::from(group.action.saturation));
        }

        Snapshot::new(vec![
            on.into_family(),
            brightness.into_family(),
            hue.into_family(),
            saturation.into_family(),
            self.scrapes_failed.family(),
        ])
    }
}

fn on_level(group: &GroupRecord) -> f64 {
    if group.state.all_on {
        2.0
    } else if group.state.any_on {
        1.0
    } else {
        0.0
    }
}

#[async_trait]
impl ResourceCollector for GroupCollector {
    fn name(&self) -> &'static str {
        "groups"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            self.on.clone(),
            self.brightness.clone(),
            self.hue.clone(),
            self.saturation.clone(),
            self.scrapes_failed.desc().clone(),
        ]
    }

    async fn collect(&self, bridge: &dyn BridgeClient) -> Snapshot {
        let groups = match bridge.fetch_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                error!(error = %e, "Failed to update groups");
                self.scrapes_failed.inc();
                Vec::new()
            }
        };

        debug!(count = groups.len(), "Collected groups");
        self.emit(&groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huesight_bridge_client::{Failure, StubBridge};
    use huesight_common::{GroupAction, GroupState};

    fn living_room(all_on: bool, any_on: bool) -> GroupRecord {
        GroupRecord {
            action: GroupAction {
                on: any_on,
                brightness: 254,
                hue: 100,
                saturation: 80,
            },
            state: GroupState { all_on, any_on },
            group_type: "Room".to_string(),
            name: "Living room".to_string(),
            ..Default::default()
        }
    }

    fn labels() -> LabelSet {
        LabelSet::new()
            .with(label::NAME, "Living room")
            .with(label::TYPE, "Room")
    }

    #[test]
    fn test_on_level() {
        assert_eq!(on_level(&living_room(true, true)), 2.0);
        assert_eq!(on_level(&living_room(false, true)), 1.0);
        assert_eq!(on_level(&living_room(false, false)), 0.0);
    }

    #[tokio::test]
    async fn test_group_values() {
        let bridge = StubBridge::new().with_groups(vec![living_room(true, true)]);
        let snapshot = GroupCollector::new("test_hue").collect(&bridge).await;

        assert_eq!(snapshot.value("test_hue_group_on", &labels()), Some(2.0));
        assert_eq!(snapshot.value("test_hue_group_brightness", &labels()), Some(254.0));
        assert_eq!(snapshot.value("test_hue_group_hue", &labels()), Some(100.0));
        assert_eq!(snapshot.value("test_hue_group_saturation", &labels()), Some(80.0));
        assert_eq!(
            snapshot.value("test_hue_group_scrapes_failed", &LabelSet::new()),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn test_group_fetch_failure_counts() {
        let bridge = StubBridge::new().with_failure(Failure::Groups);
        let collector = GroupCollector::new("test_hue");

        collector.collect(&bridge).await;
        let snapshot = collector.collect(&bridge).await;

        assert_eq!(collector.scrapes_failed(), 2);
        assert_eq!(
            snapshot.value("test_hue_group_scrapes_failed", &LabelSet::new()),
            Some(2.0)
        );
        assert!(snapshot.family("test_hue_group_on").unwrap().samples.is_empty());
    }
}
