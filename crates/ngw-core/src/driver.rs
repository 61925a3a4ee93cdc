//! The NGW driver: connection strings, capabilities and opening catalogs.
//!
//! Connection strings carry one of the prefixes `NGW:`, `NEXTGISWEB:` or
//! `NEXTGIS:` (any case) followed by an `http://` or `https://` URL.

use log::debug;
use url::Url;

use crate::catalog::Catalog;
use crate::config::OpenOptions;
use crate::error::{DriverError, Result};

/// Recognized connection string prefixes.
pub const CONNECTION_PREFIXES: [&str; 3] = ["NGW:", "NEXTGISWEB:", "NEXTGIS:"];

/// Support status of one driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    Supported,
    NotSupported,
}

impl SupportStatus {
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Supported => "Supported",
            Self::NotSupported => "Not Supported",
        }
    }
}

/// What the driver can do with a server.
#[derive(Debug, Clone, Copy)]
pub struct DriverCapabilities {
    /// Listing layers and describing their schemas.
    pub info: SupportStatus,
    /// Reading features.
    pub read: SupportStatus,
    /// Creating or changing resources.
    pub write: SupportStatus,
}

/// Driver descriptor.
#[derive(Debug, Clone)]
pub struct Driver {
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub capabilities: DriverCapabilities,
}

/// The NextGIS Web driver.
pub const NGW_DRIVER: Driver = Driver {
    short_name: "NGW",
    long_name: "NextGIS Web",
    capabilities: DriverCapabilities {
        info: SupportStatus::Supported,
        read: SupportStatus::Supported,
        write: SupportStatus::NotSupported,
    },
};

impl Default for Driver {
    fn default() -> Self {
        NGW_DRIVER
    }
}

impl Driver {
    /// Returns `true` if `connection` is an NGW connection string.
    #[must_use]
    pub fn identify(connection: &str) -> bool {
        Self::endpoint(connection).is_some()
    }

    /// The server URL inside `connection`, with the prefix removed.
    #[must_use]
    pub fn endpoint(connection: &str) -> Option<&str> {
        let rest = CONNECTION_PREFIXES
            .iter()
            .find_map(|prefix| strip_prefix_ignore_case(connection, prefix))?;

        let is_http = strip_prefix_ignore_case(rest, "http://").is_some()
            || strip_prefix_ignore_case(rest, "https://").is_some();
        is_http.then_some(rest)
    }

    /// Open the catalog behind `connection`.
    ///
    /// # Errors
    ///
    /// Fails for update access, an unrecognized or invalid connection string,
    /// invalid options, and any error of [`Catalog::open`].
    pub fn open(&self, connection: &str, options: &OpenOptions) -> Result<Catalog> {
        if options.update {
            return Err(DriverError::OperationNotSupported {
                operation: "Update access",
            }
            .into());
        }

        let endpoint = Self::endpoint(connection).ok_or_else(|| DriverError::UnrecognizedConnection {
            connection: connection.to_string(),
        })?;

        let url = Url::parse(endpoint).map_err(|e| DriverError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(DriverError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "no host".to_string(),
            }
            .into());
        }

        debug!("Opening {} endpoint {endpoint}", self.short_name);
        let transport = options.build_transport()?;
        Catalog::open(endpoint, transport)
    }

    /// # Errors
    ///
    /// Always fails: the driver cannot create resources.
    pub fn create(&self, _connection: &str) -> Result<Catalog> {
        Err(DriverError::OperationNotSupported {
            operation: "Creation of NextGIS Web resources",
        }
        .into())
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}
