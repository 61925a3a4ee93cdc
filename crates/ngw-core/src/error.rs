//! Custom error types for NextGIS Web reads.
//!
//! Every remote operation returns one of these values instead of leaving a
//! message behind in shared state. The root [`NgwError`] delegates display
//! formatting to the concern-specific enums below.

use thiserror::Error;

use crate::types::ResourceId;

/// Main error type for NGW operations.
#[derive(Debug, Error)]
pub enum NgwError {
    /// The transport could not complete a request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A list-level protocol read failed (version, resource list, metadata, features).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Resource metadata was fetched but is missing a required piece.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Connection string or unsupported driver operation.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Invalid open options.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Transport-level failures.
///
/// `Clone` so canned failures can be replayed by the in-memory transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {message}")]
    Client {
        /// Description reported by the client builder
        message: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("Request to '{url}' failed: {message}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error text
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from '{url}'")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The server answered without a body.
    #[error("Incorrect reply from '{url}': no data received")]
    EmptyReply {
        /// Requested URL
        url: String,
    },
}

/// Failure to turn a fetched reply into the expected JSON shape.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The fetch itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body was not valid JSON.
    #[error("Unable to parse JSON reply: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON parsed but failed a shape check.
    #[error("Incorrect JSON structure of server reply ({0})")]
    Shape(String),
}

impl ReplyError {
    pub(crate) fn shape(detail: impl Into<String>) -> Self {
        Self::Shape(detail.into())
    }
}

/// Errors from the four list-level reads of the protocol worker.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The version probe failed for any reason.
    #[error("Unable to determine NextGIS Web API version: {source}")]
    NoVersionInfo {
        /// What went wrong
        #[source]
        source: ReplyError,
    },

    /// The flat resource list could not be read.
    #[error("Unable to read resource list: {source}")]
    BadList {
        /// What went wrong
        #[source]
        source: ReplyError,
    },

    /// Metadata of a resource could not be read.
    #[error("Unable to read metadata of resource {resource_id}: {source}")]
    BadMeta {
        /// Resource whose metadata was requested
        resource_id: ResourceId,
        /// What went wrong
        #[source]
        source: ReplyError,
    },

    /// Feature collection of a resource could not be read.
    #[error("Unable to read features of resource {resource_id}: {source}")]
    BadFeatures {
        /// Resource whose features were requested
        resource_id: ResourceId,
        /// What went wrong
        #[source]
        source: ReplyError,
    },
}

/// Metadata arrived but lacks a piece the schema cannot do without.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Incorrect JSON with metadata of resource {resource_id}: no geometry info")]
    MissingGeometryType { resource_id: ResourceId },

    #[error("Incorrect JSON with metadata of resource {resource_id}: no SRS info")]
    MissingSpatialReference { resource_id: ResourceId },

    #[error("Incorrect JSON with metadata of resource {resource_id}: no fields info")]
    MissingFields { resource_id: ResourceId },
}

/// Driver-level errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The connection string is not an NGW connection.
    #[error("'{connection}' is not a NextGIS Web connection string")]
    UnrecognizedConnection {
        /// The rejected connection string
        connection: String,
    },

    /// The endpoint after prefix stripping is not a usable URL.
    #[error("Invalid NextGIS Web endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The stripped endpoint
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// The driver is read-only.
    #[error("{operation} is not supported by the NGW driver")]
    OperationNotSupported {
        /// The refused operation (e.g. "Update access")
        operation: &'static str,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Type alias for Results using `NgwError`.
pub type Result<T> = std::result::Result<T, NgwError>;

impl NgwError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(e) => format!("Network error: {e}"),
            Self::Protocol(e) => e.to_string(),
            Self::Schema(e) => format!("Layer schema error: {e}"),
            Self::Driver(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Protocol(ProtocolError::NoVersionInfo { .. }) => Some(
                "Check that the URL points at the root of a NextGIS Web instance, not at a single resource."
                    .to_string(),
            ),
            Self::Driver(DriverError::UnrecognizedConnection { .. }) => Some(
                "Prefix the server URL with 'NGW:', e.g. NGW:https://demo.nextgis.com".to_string(),
            ),
            Self::Driver(DriverError::OperationNotSupported { .. }) => {
                Some("Open the connection read-only.".to_string())
            },
            Self::Transport(_) => Some("Check network connectivity and the server address.".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_is_transparent() {
        let err: NgwError = TransportError::Status {
            url: "http://x/api".to_string(),
            status: 502,
        }
        .into();
        assert_eq!(err.to_string(), "HTTP 502 from 'http://x/api'");
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn protocol_error_keeps_underlying_status() {
        let err = ProtocolError::BadMeta {
            resource_id: 12,
            source: ReplyError::Transport(TransportError::Status {
                url: "http://x/api/resource/12".to_string(),
                status: 404,
            }),
        };
        let message = err.to_string();
        assert!(message.contains("resource 12"));
        assert!(message.contains("HTTP 404"));
    }

    #[test]
    fn schema_error_message() {
        let err = SchemaError::MissingGeometryType { resource_id: 3 };
        assert_eq!(
            err.to_string(),
            "Incorrect JSON with metadata of resource 3: no geometry info"
        );
    }

    #[test]
    fn not_supported_message_is_fixed() {
        let err: NgwError = DriverError::OperationNotSupported {
            operation: "Update access",
        }
        .into();
        assert_eq!(err.user_message(), "Update access is not supported by the NGW driver");
    }
}
