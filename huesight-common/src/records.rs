//! Raw device records as returned by the Hue bridge REST API (v1).
//!
//! Field names follow the bridge's JSON. Every state/config field tolerates
//! being absent or `null`, because the bridge omits or nulls fields that a
//! given device type does not support.

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Epoch seconds reported for a sensor that has no `lastupdated` value.
///
/// This is `0001-01-01T00:00:00Z`, the zero timestamp the bridge tooling has
/// always exposed for "none".
pub const NO_TIMESTAMP: i64 = -62_135_596_800;

/// Format used by the bridge for `lastupdated` (UTC, no offset).
const UPDATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Deserialize a value, mapping `null` to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A sensor's `lastupdated` timestamp, which may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateTime(pub Option<NaiveDateTime>);

impl UpdateTime {
    /// No timestamp available.
    pub const NONE: UpdateTime = UpdateTime(None);

    /// Build from epoch seconds. Returns [`UpdateTime::NONE`] for the sentinel
    /// or for values chrono cannot represent.
    pub fn from_epoch_seconds(secs: i64) -> Self {
        if secs == NO_TIMESTAMP {
            return Self::NONE;
        }
        Self(
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(|dt| dt.naive_utc()),
        )
    }

    /// Epoch seconds, or [`NO_TIMESTAMP`] when unset.
    pub fn epoch_seconds(&self) -> i64 {
        match self.0 {
            Some(t) => t.and_utc().timestamp(),
            None => NO_TIMESTAMP,
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl<'de> Deserialize<'de> for UpdateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("none") | Some("null") | Some("") => Ok(Self::NONE),
            Some(s) => NaiveDateTime::parse_from_str(s, UPDATE_TIME_FORMAT)
                .map(|t| Self(Some(t)))
                .map_err(|e| de::Error::custom(format!("invalid lastupdated '{}': {}", s, e))),
        }
    }
}

impl Serialize for UpdateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(t) => serializer.serialize_str(&t.format(UPDATE_TIME_FORMAT).to_string()),
            None => serializer.serialize_str("none"),
        }
    }
}

/// Sensor state block. Which fields are meaningful depends on the sensor type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    /// Daylight sensor: true between sunrise and sunset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub daylight: bool,

    #[serde(rename = "lastupdated", default)]
    pub last_updated: UpdateTime,

    /// Switches: code of the last button event.
    #[serde(rename = "buttonevent", default, deserialize_with = "null_as_default")]
    pub button_event: u32,

    /// Generic CLIP status value.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i32,

    /// Temperature in hundredths of a degree Celsius.
    #[serde(default, deserialize_with = "null_as_default")]
    pub temperature: i32,

    /// Light level, `10000 * log10(lux) + 1`.
    #[serde(rename = "lightlevel", default, deserialize_with = "null_as_default")]
    pub light_level: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dark: bool,

    /// Motion sensor: true when movement was detected.
    #[serde(default, deserialize_with = "null_as_default")]
    pub presence: bool,
}

/// Sensor configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub on: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reachable: bool,

    /// Battery level in percent. Zero for mains-powered or virtual sensors.
    #[serde(default, deserialize_with = "null_as_default")]
    pub battery: u8,
}

/// One logical sensor as reported by `GET /api/<key>/sensors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(default)]
    pub state: SensorState,

    #[serde(default)]
    pub config: SensorConfig,

    /// Capability type tag, e.g. `ZLLPresence`.
    #[serde(rename = "type", default)]
    pub sensor_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "modelid", default)]
    pub model_id: String,

    #[serde(rename = "manufacturername", default)]
    pub manufacturer_name: String,

    #[serde(rename = "productname", default)]
    pub product_name: String,

    #[serde(rename = "uniqueid", default)]
    pub unique_id: String,
}

impl SensorRecord {
    /// Create a sensor record with empty state and config.
    pub fn new(
        sensor_type: impl Into<String>,
        name: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            name: name.into(),
            unique_id: unique_id.into(),
            ..Default::default()
        }
    }
}

/// Light state block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub on: bool,

    /// Brightness, 1-254.
    #[serde(rename = "bri", default, deserialize_with = "null_as_default")]
    pub brightness: u8,

    /// Hue, 0-65535.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hue: u16,

    /// Saturation, 0-254.
    #[serde(rename = "sat", default, deserialize_with = "null_as_default")]
    pub saturation: u8,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reachable: bool,
}

/// One light as reported by `GET /api/<key>/lights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightRecord {
    #[serde(default)]
    pub state: LightState,

    #[serde(rename = "type", default)]
    pub light_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "modelid", default)]
    pub model_id: String,

    #[serde(rename = "manufacturername", default)]
    pub manufacturer_name: String,

    #[serde(rename = "productname", default)]
    pub product_name: String,

    #[serde(rename = "uniqueid", default)]
    pub unique_id: String,
}

/// The last action applied to a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupAction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub on: bool,

    #[serde(rename = "bri", default, deserialize_with = "null_as_default")]
    pub brightness: u8,

    #[serde(default, deserialize_with = "null_as_default")]
    pub hue: u16,

    #[serde(rename = "sat", default, deserialize_with = "null_as_default")]
    pub saturation: u8,
}

/// Aggregated on/off state of a group's members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub all_on: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub any_on: bool,
}

/// One group (room, zone, light group) as reported by `GET /api/<key>/groups`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub action: GroupAction,

    #[serde(default)]
    pub state: GroupState,

    #[serde(rename = "type", default)]
    pub group_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub class: String,

    /// Bridge-local ids of member lights.
    #[serde(default)]
    pub lights: Vec<String>,
}
