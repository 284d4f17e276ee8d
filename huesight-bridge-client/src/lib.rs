//! Client for the Philips Hue bridge REST API (v1).
//!
//! The exporter only ever reads from the bridge. This crate provides:
//!
//! - [`BridgeClient`] - the fetch interface the exporter's collectors consume
//! - [`HueBridgeClient`] - the HTTP implementation, plus API-key checks and pairing
//! - [`discover`] - N-UPnP bridge discovery
//! - [`StubBridge`] - an in-memory bridge for tests
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use huesight_bridge_client::{BridgeClient, HueBridgeClient};
//!
//! let client = HueBridgeClient::new("192.168.1.10", "api-key", Duration::from_secs(5))?;
//! client.login().await?;
//! let sensors = client.fetch_sensors().await?;
//! ```

mod client;
mod discovery;
mod error;
mod stub;

pub use client::{BridgeClient, HueBridgeClient};
pub use discovery::{DEFAULT_DISCOVERY_URL, DiscoveredBridge, discover, discover_at};
pub use error::{BridgeClientError, Result};
pub use stub::{Failure, StubBridge};
