//! Versioned NextGIS Web API client.
//!
//! [`ProtocolWorker`] is the contract every API version implements: the four
//! remote reads and one field extractor per schema or feature concept. The set
//! of versions is closed; [`ApiWorker`] holds the one selected when a catalog
//! is opened.
//!
//! To support another API version, add a module with its worker, a variant to
//! [`ApiWorker`] and a branch in [`ApiWorker::connect`].

mod v3;

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

pub use v3::WorkerV3;

use crate::error::{ProtocolError, ReplyError};
use crate::transport::Transport;
use crate::types::ResourceId;
use crate::validator;

/// Version-independent path of the package version document.
pub const VERSION_PATH: &str = "/api/component/pyramid/pkg_version";

/// Key of the NextGIS Web version inside the version document.
pub const VERSION_KEY: &str = "nextgisweb";

/// Contract of a NextGIS Web API version.
///
/// The fetch methods return already shape-checked JSON. The extractors return
/// `None` whenever the container or the target value has the wrong shape.
pub trait ProtocolWorker {
    /// Server root all requests are made against (no trailing slash).
    fn base_url(&self) -> &str;

    /// Returns `true` if resources of this kind are exposed as layers.
    fn supports_kind(&self, kind: &str) -> bool;

    /// Fetch the flat resource list.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BadList`] unless the reply is a non-empty array.
    fn list_vector_resources(&self) -> Result<Vec<Value>, ProtocolError>;

    /// Fetch the metadata object of one resource.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BadMeta`] unless the reply is an object.
    fn fetch_resource_meta(&self, id: ResourceId) -> Result<Value, ProtocolError>;

    /// Fetch every feature of one resource.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BadFeatures`] unless the reply is a non-empty array.
    fn fetch_resource_features(&self, id: ResourceId) -> Result<Vec<Value>, ProtocolError>;

    fn resource_kind<'a>(&self, item: &'a Value) -> Option<&'a str>;
    fn resource_id(&self, item: &Value) -> Option<ResourceId>;
    fn geometry_kind<'a>(&self, meta: &'a Value) -> Option<&'a str>;
    fn srs_id(&self, meta: &Value) -> Option<i64>;
    fn fields<'a>(&self, meta: &'a Value) -> Option<&'a [Value]>;
    fn display_name<'a>(&self, meta: &'a Value) -> Option<&'a str>;
    fn field_name<'a>(&self, field: &'a Value) -> Option<&'a str>;
    fn field_kind<'a>(&self, field: &'a Value) -> Option<&'a str>;
    fn feature_id(&self, feature: &Value) -> Option<i64>;
    /// Feature geometry as Well-Known Text.
    fn feature_geometry<'a>(&self, feature: &'a Value) -> Option<&'a str>;
    fn feature_attributes<'a>(&self, feature: &'a Value) -> Option<&'a Map<String, Value>>;
}

/// The API worker selected for a catalog.
#[derive(Debug)]
pub enum ApiWorker {
    /// NextGIS Web API 3.x, the only wiring known today.
    V3(WorkerV3),
}

impl ApiWorker {
    /// Probe the server version and select a worker for it.
    ///
    /// Any successfully probed version selects [`WorkerV3`]; only a failed
    /// probe is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NoVersionInfo`] if the probe fails.
    pub fn connect(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self, ProtocolError> {
        let base_url = normalize_base_url(base_url);
        let version = probe_version(transport.as_ref(), &base_url)?;
        debug!("NextGIS Web at {base_url} reports API version {version}");

        Ok(Self::V3(WorkerV3::new(base_url, transport, version)))
    }

    /// Version number reported by the probe.
    #[must_use]
    pub fn api_version(&self) -> f64 {
        match self {
            Self::V3(worker) => worker.api_version(),
        }
    }

    fn inner(&self) -> &dyn ProtocolWorker {
        match self {
            Self::V3(worker) => worker,
        }
    }
}

impl ProtocolWorker for ApiWorker {
    fn base_url(&self) -> &str {
        self.inner().base_url()
    }

    fn supports_kind(&self, kind: &str) -> bool {
        self.inner().supports_kind(kind)
    }

    fn list_vector_resources(&self) -> Result<Vec<Value>, ProtocolError> {
        self.inner().list_vector_resources()
    }

    fn fetch_resource_meta(&self, id: ResourceId) -> Result<Value, ProtocolError> {
        self.inner().fetch_resource_meta(id)
    }

    fn fetch_resource_features(&self, id: ResourceId) -> Result<Vec<Value>, ProtocolError> {
        self.inner().fetch_resource_features(id)
    }

    fn resource_kind<'a>(&self, item: &'a Value) -> Option<&'a str> {
        self.inner().resource_kind(item)
    }

    fn resource_id(&self, item: &Value) -> Option<ResourceId> {
        self.inner().resource_id(item)
    }

    fn geometry_kind<'a>(&self, meta: &'a Value) -> Option<&'a str> {
        self.inner().geometry_kind(meta)
    }

    fn srs_id(&self, meta: &Value) -> Option<i64> {
        self.inner().srs_id(meta)
    }

    fn fields<'a>(&self, meta: &'a Value) -> Option<&'a [Value]> {
        self.inner().fields(meta)
    }

    fn display_name<'a>(&self, meta: &'a Value) -> Option<&'a str> {
        self.inner().display_name(meta)
    }

    fn field_name<'a>(&self, field: &'a Value) -> Option<&'a str> {
        self.inner().field_name(field)
    }

    fn field_kind<'a>(&self, field: &'a Value) -> Option<&'a str> {
        self.inner().field_kind(field)
    }

    fn feature_id(&self, feature: &Value) -> Option<i64> {
        self.inner().feature_id(feature)
    }

    fn feature_geometry<'a>(&self, feature: &'a Value) -> Option<&'a str> {
        self.inner().feature_geometry(feature)
    }

    fn feature_attributes<'a>(&self, feature: &'a Value) -> Option<&'a Map<String, Value>> {
        self.inner().feature_attributes(feature)
    }
}

/// Ask the server for its NextGIS Web version.
///
/// The reply must be an object with a string `nextgisweb` member whose leading
/// numeric prefix is a non-zero number (`"4.0.0"` reads as `4.0`).
///
/// # Errors
///
/// Returns [`ProtocolError::NoVersionInfo`] for transport failures, invalid
/// JSON, a wrong reply shape and unparseable or zero versions alike.
pub fn probe_version(transport: &dyn Transport, base_url: &str) -> Result<f64, ProtocolError> {
    let url = format!("{base_url}{VERSION_PATH}");
    let no_version = |source| ProtocolError::NoVersionInfo { source };

    let reply = get_json(transport, &url).map_err(no_version)?;
    if !validator::is_object(Some(&reply)) {
        return Err(no_version(ReplyError::shape("no NGW versions object")));
    }

    let raw = validator::string(validator::member(Some(&reply), VERSION_KEY))
        .ok_or_else(|| no_version(ReplyError::shape("no NGW API version")))?;

    parse_api_version(raw)
        .ok_or_else(|| no_version(ReplyError::shape(format!("unrecognized NGW API version '{raw}'"))))
}

/// Parse the leading `major[.minor]` prefix of a version string.
///
/// Returns `None` if there is no numeric prefix or it reads as zero.
#[must_use]
pub fn parse_api_version(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;

    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            '+' | '-' if idx == 0 => {},
            _ => break,
        }
        end = idx + ch.len_utf8();
    }

    if !seen_digit {
        return None;
    }

    let prefix = trimmed[..end].trim_end_matches('.');
    prefix
        .parse::<f64>()
        .ok()
        .filter(|version| version.is_finite() && *version != 0.0)
}

/// Fetch `url` and parse the body as JSON.
pub(crate) fn get_json(transport: &dyn Transport, url: &str) -> Result<Value, ReplyError> {
    let body = transport.fetch(url)?;
    Ok(serde_json::from_slice(&body)?)
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
