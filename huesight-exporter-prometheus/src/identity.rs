//! Physical device identity for logical sensors.

use thiserror::Error;

/// Length of the unique-id prefix shared by all logical sensors of one device.
///
/// This is the device's 64-bit address, e.g. `00:17:88:01:02:03:04:05` out of
/// `00:17:88:01:02:03:04:05-02-0406`.
pub const DEVICE_KEY_LEN: usize = 23;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("unique id '{unique_id}' is shorter than the {expected}-character device prefix")]
    ShortUniqueId { unique_id: String, expected: usize },
}

/// Derive the physical device key of a logical sensor.
///
/// Split sensors use the [`DEVICE_KEY_LEN`]-character prefix of their unique id;
/// other sensors are their own device.
pub fn device_key(unique_id: &str, split: bool) -> Result<&str, IdentityError> {
    if !split {
        return Ok(unique_id);
    }

    unique_id
        .get(..DEVICE_KEY_LEN)
        .ok_or_else(|| IdentityError::ShortUniqueId {
            unique_id: unique_id.to_string(),
            expected: DEVICE_KEY_LEN,
        })
}
