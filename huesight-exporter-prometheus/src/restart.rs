//! Bridge restart heuristic.
//!
//! A sensor whose `lastupdated` goes from a real timestamp back to "none"
//! suggests the bridge (or the device) restarted and lost its state.

use std::collections::HashMap;

use huesight_common::NO_TIMESTAMP;
use tracing::debug;

/// Tracks last-seen update timestamps per logical sensor for one scrape.
///
/// The history is not carried across scrapes, so a regression is only seen
/// when the same unique id is observed twice within one scrape.
#[derive(Debug, Default)]
pub struct RestartDetector {
    history: HashMap<String, i64>,
    restart_observed: bool,
}

impl RestartDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sensor's `lastupdated` (epoch seconds, [`NO_TIMESTAMP`] if unset).
    pub fn observe(&mut self, unique_id: &str, last_updated: i64) {
        let previous = self
            .history
            .get(unique_id)
            .copied()
            .unwrap_or(NO_TIMESTAMP);

        if previous != NO_TIMESTAMP && last_updated == NO_TIMESTAMP {
            debug!(
                unique_id,
                previous, "Sensor timestamp regressed to unset, suspecting bridge restart"
            );
            self.restart_observed = true;
        }

        self.history.insert(unique_id.to_string(), last_updated);
    }

    /// True if any observed sensor regressed to unset.
    pub fn restart_observed(&self) -> bool {
        self.restart_observed
    }
}
