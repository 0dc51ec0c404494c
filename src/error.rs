//! Error types for the batch provisioner
//!
//! Provides structured error types for configuration loading, the array
//! gateway, and batch input handling.

use thiserror::Error;

/// Unified error type for the provisioner
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Fatal Errors (abort the run before the provisioning loop)
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot connect to array at {endpoint}: {reason}")]
    GatewayConnect { endpoint: String, reason: String },

    #[error("Authentication rejected for user '{username}' at {endpoint}")]
    GatewayAuth { endpoint: String, username: String },

    // =========================================================================
    // Gateway Errors (per-request, converted to outcome data in the loop)
    // =========================================================================
    #[error("Array request failed: {operation}: {reason}")]
    GatewayApi {
        operation: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Array transport error during {operation}: {source}")]
    GatewayTransport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from array during {operation}: {reason}")]
    GatewayResponse { operation: String, reason: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Capacity parse error: {0}")]
    CapacityParse(String),

    #[error("Batch input error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error must abort the whole run.
    ///
    /// Only configuration problems and connect/auth failures are fatal;
    /// everything the gateway reports mid-batch becomes per-request outcome
    /// data instead.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::GatewayConnect { .. }
                | Error::GatewayAuth { .. }
                | Error::Io(_)
                | Error::Csv(_)
                | Error::YamlParse(_)
        )
    }

    /// Whether a gateway read may be retried after this error.
    ///
    /// Transport failures and 5xx responses are transient; 4xx responses
    /// mean the request itself is wrong and will not improve on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::GatewayTransport { .. } => true,
            Error::GatewayApi { status, .. } => matches!(status, Some(s) if *s >= 500),
            _ => false,
        }
    }

    /// HTTP status carried by this error, when the array sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::GatewayApi { status, .. } => *status,
            Error::GatewayTransport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for the provisioner
pub type Result<T> = std::result::Result<T, Error>;
