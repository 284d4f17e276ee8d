//! Metric registry holding the most recent snapshot of every collector.
//!
//! Collectors never mutate exposed series in place. Each scrape builds a
//! complete [`Snapshot`] which is swapped into the [`Registry`] as a whole, so
//! rendering only ever observes one collector's full previous or full next
//! state.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Name, help text and type of a metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
}

impl MetricDesc {
    /// Build a `{namespace}_{subsystem}_{name}` descriptor.
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &'static str,
        kind: MetricKind,
    ) -> Self {
        Self {
            name: format!("{}_{}_{}", namespace, subsystem, name),
            help,
            kind,
        }
    }

    pub fn gauge(namespace: &str, subsystem: &str, name: &str, help: &'static str) -> Self {
        Self::new(namespace, subsystem, name, help, MetricKind::Gauge)
    }

    pub fn counter(namespace: &str, subsystem: &str, name: &str, help: &'static str) -> Self {
        Self::new(namespace, subsystem, name, help, MetricKind::Counter)
    }
}

/// Label key-value pairs of one series, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(Vec<(&'static str, String)>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a label.
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.0.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.0[i].1 = value,
            Err(i) => self.0.insert(i, (key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Format labels for Prometheus exposition format.
    pub fn format(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect();

        format!("{{{}}}", parts.join(","))
    }
}

/// One series value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: LabelSet,
    pub value: f64,
}

/// A metric family with all its series.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub desc: MetricDesc,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Value of the series with exactly these labels.
    pub fn value(&self, labels: &LabelSet) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| &s.labels == labels)
            .map(|s| s.value)
    }
}

/// Builder for one gauge family during a scrape.
///
/// Setting the same label set twice keeps the last value.
#[derive(Debug)]
pub struct GaugeVec {
    desc: MetricDesc,
    series: BTreeMap<LabelSet, f64>,
}

impl GaugeVec {
    pub fn new(desc: MetricDesc) -> Self {
        Self {
            desc,
            series: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, labels: LabelSet, value: f64) {
        self.series.insert(labels, value);
    }

    pub fn set_bool(&mut self, labels: LabelSet, value: bool) {
        self.set(labels, if value { 1.0 } else { 0.0 });
    }

    pub fn into_family(self) -> MetricFamily {
        MetricFamily {
            desc: self.desc,
            samples: self
                .series
                .into_iter()
                .map(|(labels, value)| Sample { labels, value })
                .collect(),
        }
    }
}

/// Monotonic, process-lifetime counter without labels.
#[derive(Debug)]
pub struct Counter {
    desc: MetricDesc,
    value: AtomicU64,
}

impl Counter {
    pub fn new(desc: MetricDesc) -> Self {
        Self {
            desc,
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn desc(&self) -> &MetricDesc {
        &self.desc
    }

    pub fn family(&self) -> MetricFamily {
        MetricFamily {
            desc: self.desc.clone(),
            samples: vec![Sample {
                labels: LabelSet::new(),
                value: self.get() as f64,
            }],
        }
    }
}

/// Everything one collector exposes after one scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub families: Vec<MetricFamily>,
}

impl Snapshot {
    pub fn new(families: Vec<MetricFamily>) -> Self {
        Self { families }
    }

    pub fn family(&self, name: &str) -> Option<&MetricFamily> {
        self.families.iter().find(|f| f.desc.name == name)
    }

    /// Value of a series, looked up by family name and labels.
    pub fn value(&self, name: &str, labels: &LabelSet) -> Option<f64> {
        self.family(name).and_then(|f| f.value(labels))
    }

    /// Number of series across all families.
    pub fn series_count(&self) -> usize {
        self.families.iter().map(|f| f.samples.len()).sum()
    }

    /// Append this snapshot in Prometheus text exposition format.
    ///
    /// Families without series are omitted.
    pub fn render_into(&self, output: &mut String) {
        for family in &self.families {
            if family.samples.is_empty() {
                continue;
            }

            writeln!(output, "# HELP {} {}", family.desc.name, family.desc.help).ok();
            writeln!(
                output,
                "# TYPE {} {}",
                family.desc.name,
                family.desc.kind.as_str()
            )
            .ok();

            for sample in &family.samples {
                writeln!(
                    output,
                    "{}{} {}",
                    family.desc.name,
                    sample.labels.format(),
                    format_value(sample.value)
                )
                .ok();
            }
        }
    }
}

/// Thread-safe store of the latest snapshot per collector.
#[derive(Debug, Default)]
pub struct Registry {
    slots: RwLock<Vec<(&'static str, Arc<Snapshot>)>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a collector's snapshot. Collectors render in publish order.
    pub fn publish(&self, collector: &'static str, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut slots = self.slots.write();

        match slots.iter_mut().find(|(name, _)| *name == collector) {
            Some(slot) => slot.1 = snapshot,
            None => slots.push((collector, snapshot)),
        }
    }

    pub fn snapshot(&self, collector: &str) -> Option<Arc<Snapshot>> {
        self.slots
            .read()
            .iter()
            .find(|(name, _)| *name == collector)
            .map(|(_, snapshot)| snapshot.clone())
    }

    /// Get the current number of exposed series.
    pub fn series_count(&self) -> usize {
        self.slots
            .read()
            .iter()
            .map(|(_, snapshot)| snapshot.series_count())
            .sum()
    }

    /// Render every snapshot in Prometheus exposition format.
    pub fn render(&self) -> String {
        let snapshots: Vec<Arc<Snapshot>> = self
            .slots
            .read()
            .iter()
            .map(|(_, snapshot)| snapshot.clone())
            .collect();

        let mut output = String::with_capacity(4096);
        for snapshot in snapshots {
            snapshot.render_into(&mut output);
        }
        output
    }
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value for Prometheus.
pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
