//! Error types for the bridge client.

use thiserror::Error;

/// Result type alias using [`BridgeClientError`].
pub type Result<T> = std::result::Result<T, BridgeClientError>;

/// Hue API error type for a username that is not whitelisted.
pub const API_ERROR_UNAUTHORIZED: u16 = 1;

/// Hue API error type returned by `POST /api` until the link button is pressed.
pub const API_ERROR_LINK_BUTTON: u16 = 101;

/// Errors that can occur while talking to the bridge.
#[derive(Error, Debug)]
pub enum BridgeClientError {
    /// Transport failure, including timeouts.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Bridge returned HTTP status {status}")]
    Status { status: u16 },

    /// Error envelope returned by the bridge API (`[{"error": {...}}]`).
    #[error("Bridge API error {kind} at {address}: {description}")]
    Api {
        kind: u16,
        address: String,
        description: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode bridge response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response was valid JSON but not in the expected shape.
    #[error("Unexpected bridge response: {0}")]
    UnexpectedResponse(String),

    /// Pairing was attempted before the link button was pressed.
    #[error("Link button not pressed")]
    LinkButtonNotPressed,

    /// The configured bridge address is unusable.
    #[error("Invalid bridge address: {0}")]
    InvalidAddress(String),
}

impl BridgeClientError {
    /// Create an API error.
    pub fn api(kind: u16, address: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Api {
            kind,
            address: address.into(),
            description: description.into(),
        }
    }

    /// True if the bridge rejected the API key.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { kind, .. } if *kind == API_ERROR_UNAUTHORIZED)
    }
}
