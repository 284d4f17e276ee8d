//! Prometheus metrics exporter for Philips Hue bridges.
//!
//! Every read of the metrics endpoint runs one scrape: the lights, groups and
//! sensors are fetched from the bridge, turned into metric families and
//! rendered in the Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Hue Bridge    │────>│   Collectors    │────>│   HTTP Server   │
//! │   (REST API)    │     │ (groups/lights/ │     │   (/metrics)    │
//! └─────────────────┘     │    sensors)     │     └─────────────────┘
//!                         └─────────────────┘
//! ```
//!
//! Sensors go through the [`classify`] table, the [`identity`] resolver and
//! the two-pass [`reconcile`] step (with [`restart`] detection) before being
//! emitted. Each collector publishes a complete [`registry::Snapshot`] per
//! scrape, so readers never see a half-updated series set.
//!
//! # Usage
//!
//! ```bash
//! # Pair with the bridge and write huesight.json5
//! huesight-exporter-prometheus generate
//!
//! # Serve metrics
//! huesight-exporter-prometheus --config huesight.json5 run
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod classify;
pub mod collector;
pub mod config;
pub mod exporter;
pub mod generate;
pub mod groups;
pub mod http;
pub mod identity;
pub mod lights;
pub mod reconcile;
pub mod registry;
pub mod restart;
pub mod sensors;

pub use collector::ResourceCollector;
pub use config::ExporterConfig;
pub use exporter::{Exporter, SharedExporter};
pub use groups::GroupCollector;
pub use http::HttpServer;
pub use lights::LightCollector;
pub use registry::Registry;
pub use sensors::SensorCollector;
