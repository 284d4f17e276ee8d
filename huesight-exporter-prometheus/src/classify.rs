//! Sensor type classification.
//!
//! Maps a sensor's capability type tag to the rule used to extract its
//! primary value and to its role in device reconciliation.

use std::collections::HashSet;

use huesight_common::SensorState;

/// Which of the two ordered sensor passes handles a sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Standalone sensors and naming-authoritative sensors.
    First,
    /// Split sensors that take their name from a first-pass sensor.
    Second,
}

/// Sensor types the exporter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Bridge sunrise/sunset sensor.
    Daylight,
    /// Hue tap switch.
    ZgpSwitch,
    /// Hue dimmer switch.
    ZllSwitch,
    /// CLIP generic status variable.
    ClipGenericStatus,
    /// Motion sensor presence.
    ZllPresence,
    /// Motion sensor thermometer.
    ZllTemperature,
    /// Motion sensor ambient light level.
    ZllLightLevel,
}

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        SensorKind::Daylight,
        SensorKind::ZgpSwitch,
        SensorKind::ZllSwitch,
        SensorKind::ClipGenericStatus,
        SensorKind::ZllPresence,
        SensorKind::ZllTemperature,
        SensorKind::ZllLightLevel,
    ];

    /// Parse a bridge type tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The bridge's type tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            SensorKind::Daylight => "Daylight",
            SensorKind::ZgpSwitch => "ZGPSwitch",
            SensorKind::ZllSwitch => "ZLLSwitch",
            SensorKind::ClipGenericStatus => "ClipGenericStatus",
            SensorKind::ZllPresence => "ZLLPresence",
            SensorKind::ZllTemperature => "ZLLTemperature",
            SensorKind::ZllLightLevel => "ZLLLightLevel",
        }
    }

    /// True if this sensor shares a physical device with other logical sensors.
    pub fn is_split(&self) -> bool {
        !matches!(self, SensorKind::Daylight | SensorKind::ClipGenericStatus)
    }

    /// True if this sensor's name is canonical for its whole physical device.
    pub fn is_naming_authority(&self) -> bool {
        matches!(self, SensorKind::ZllPresence)
    }

    pub fn pass(&self) -> Pass {
        match self {
            SensorKind::ZllTemperature | SensorKind::ZllLightLevel => Pass::Second,
            _ => Pass::First,
        }
    }

    /// Extract the primary value exported as `sensor_value`.
    pub fn primary_value(&self, state: &SensorState) -> f64 {
        match self {
            SensorKind::Daylight => bool_value(state.daylight),
            SensorKind::ZgpSwitch | SensorKind::ZllSwitch => f64::from(state.button_event),
            SensorKind::ClipGenericStatus => f64::from(state.status),
            SensorKind::ZllPresence => bool_value(state.presence),
            SensorKind::ZllTemperature => f64::from(state.temperature),
            SensorKind::ZllLightLevel => f64::from(state.light_level),
        }
    }
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Result of classifying a sensor type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Listed in the configured ignore list.
    Ignored,
    /// Not a type the exporter understands.
    Unsupported,
    Supported(SensorKind),
}

/// Classify a type tag. The ignore list takes precedence over known types.
pub fn classify(tag: &str, ignore_types: &HashSet<String>) -> Classification {
    if ignore_types.contains(tag) {
        return Classification::Ignored;
    }

    match SensorKind::from_tag(tag) {
        Some(kind) => Classification::Supported(kind),
        None => Classification::Unsupported,
    }
}
