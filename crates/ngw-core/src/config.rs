//! Options for opening a NextGIS Web connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::transport::{ReqwestTransport, Transport};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for [`crate::driver::Driver::open`].
#[derive(Clone)]
pub struct OpenOptions {
    /// Per-request timeout of the HTTP transport
    pub timeout: Duration,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
    /// Transport to use instead of building an HTTP one
    pub transport: Option<Arc<dyn Transport>>,
    /// Request update access (always refused)
    pub update: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("ngw/{}", env!("CARGO_PKG_VERSION")),
            transport: None,
            update: false,
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("update", &self.update)
            .finish()
    }
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use `transport` for every request; timeout and user agent are ignored.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Check option values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero timeout or an empty
    /// user agent.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidOption {
                option: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "user_agent".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The configured transport, or a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the HTTP client construction error.
    pub fn build_transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }
        self.validate()?;
        let transport = ReqwestTransport::new(self.timeout, &self.user_agent)?;
        Ok(Arc::new(transport))
    }
}
