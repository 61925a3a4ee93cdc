//! NextGIS Web API 3.x wiring.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{ProtocolWorker, get_json};
use crate::error::{ProtocolError, ReplyError};
use crate::transport::Transport;
use crate::types::ResourceId;
use crate::validator::{self, member};

const FLAT_LIST_PATH: &str = "/resource/store/";

fn resource_path(id: ResourceId) -> String {
    format!("/api/resource/{id}")
}

fn features_path(id: ResourceId) -> String {
    format!("/api/resource/{id}/feature/")
}

/// Worker for NextGIS Web API 3.x.
#[derive(Debug)]
pub struct WorkerV3 {
    base_url: String,
    transport: Arc<dyn Transport>,
    api_version: f64,
    supported_kinds: HashSet<&'static str>,
}

impl WorkerV3 {
    pub(crate) fn new(base_url: String, transport: Arc<dyn Transport>, api_version: f64) -> Self {
        Self {
            base_url,
            transport,
            api_version,
            supported_kinds: HashSet::from(["vector_layer"]),
        }
    }

    #[must_use]
    pub fn api_version(&self) -> f64 {
        self.api_version
    }

    fn get(&self, path: &str) -> Result<Value, ReplyError> {
        get_json(self.transport.as_ref(), &format!("{}{path}", self.base_url))
    }

    fn get_array(&self, path: &str, what: &str) -> Result<Vec<Value>, ReplyError> {
        let mut reply = self.get(path)?;
        if !validator::is_non_empty_array(Some(&reply)) {
            return Err(ReplyError::shape(format!("{what} is not a non-empty array")));
        }
        Ok(reply.as_array_mut().map(std::mem::take).unwrap_or_default())
    }
}

impl ProtocolWorker for WorkerV3 {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn supports_kind(&self, kind: &str) -> bool {
        self.supported_kinds.contains(kind)
    }

    fn list_vector_resources(&self) -> Result<Vec<Value>, ProtocolError> {
        self.get_array(FLAT_LIST_PATH, "resource list")
            .map_err(|source| ProtocolError::BadList { source })
    }

    fn fetch_resource_meta(&self, id: ResourceId) -> Result<Value, ProtocolError> {
        let bad_meta = |source| ProtocolError::BadMeta {
            resource_id: id,
            source,
        };
        let meta = self.get(&resource_path(id)).map_err(bad_meta)?;
        if !validator::is_object(Some(&meta)) {
            return Err(bad_meta(ReplyError::shape("resource metadata is not an object")));
        }
        Ok(meta)
    }

    fn fetch_resource_features(&self, id: ResourceId) -> Result<Vec<Value>, ProtocolError> {
        self.get_array(&features_path(id), "feature collection")
            .map_err(|source| ProtocolError::BadFeatures {
                resource_id: id,
                source,
            })
    }

    fn resource_kind<'a>(&self, item: &'a Value) -> Option<&'a str> {
        validator::string(member(Some(item), "cls"))
    }

    fn resource_id(&self, item: &Value) -> Option<ResourceId> {
        validator::integer(member(Some(item), "id"))
    }

    fn geometry_kind<'a>(&self, meta: &'a Value) -> Option<&'a str> {
        let vector_layer = member(Some(meta), "vector_layer");
        validator::string(member(vector_layer, "geometry_type"))
    }

    fn srs_id(&self, meta: &Value) -> Option<i64> {
        let srs = member(member(Some(meta), "vector_layer"), "srs");
        validator::integer(member(srs, "id"))
    }

    fn fields<'a>(&self, meta: &'a Value) -> Option<&'a [Value]> {
        let feature_layer = member(Some(meta), "feature_layer");
        validator::non_empty_array(member(feature_layer, "fields"))
    }

    fn display_name<'a>(&self, meta: &'a Value) -> Option<&'a str> {
        let resource = member(Some(meta), "resource");
        validator::string(member(resource, "display_name"))
    }

    fn field_name<'a>(&self, field: &'a Value) -> Option<&'a str> {
        validator::string(member(Some(field), "keyname"))
    }

    fn field_kind<'a>(&self, field: &'a Value) -> Option<&'a str> {
        validator::string(member(Some(field), "datatype"))
    }

    fn feature_id(&self, feature: &Value) -> Option<i64> {
        validator::integer(member(Some(feature), "id"))
    }

    fn feature_geometry<'a>(&self, feature: &'a Value) -> Option<&'a str> {
        validator::string(member(Some(feature), "geom"))
    }

    fn feature_attributes<'a>(&self, feature: &'a Value) -> Option<&'a Map<String, Value>> {
        validator::object(member(Some(feature), "fields"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    const BASE: &str = "http://ngw.test";

    fn worker(transport: MemoryTransport) -> WorkerV3 {
        WorkerV3::new(BASE.to_string(), Arc::new(transport), 3.0)
    }

    fn meta() -> Value {
        json!({
            "resource": {"cls": "vector_layer", "id": 7, "display_name": "Roads"},
            "vector_layer": {"geometry_type": "LINESTRING", "srs": {"id": 3857}},
            "feature_layer": {"fields": [
                {"keyname": "name", "datatype": "STRING", "display_name": "Name"},
                {"keyname": "lanes", "datatype": "INTEGER"}
            ]}
        })
    }

    #[test]
    fn supported_kinds() {
        let worker = worker(MemoryTransport::new());
        assert!(worker.supports_kind("vector_layer"));
        assert!(!worker.supports_kind("postgis_layer"));
        assert!(!worker.supports_kind("resource_group"));
    }

    #[test]
    fn metadata_extractors() {
        let worker = worker(MemoryTransport::new());
        let meta = meta();

        assert_eq!(worker.geometry_kind(&meta), Some("LINESTRING"));
        assert_eq!(worker.srs_id(&meta), Some(3857));
        assert_eq!(worker.display_name(&meta), Some("Roads"));

        let fields = worker.fields(&meta).expect("fields");
        assert_eq!(fields.len(), 2);
        assert_eq!(worker.field_name(&fields[1]), Some("lanes"));
        assert_eq!(worker.field_kind(&fields[1]), Some("INTEGER"));
    }

    #[test]
    fn extractors_reject_wrong_shapes() {
        let worker = worker(MemoryTransport::new());
        let meta = json!({
            "vector_layer": {"geometry_type": 1, "srs": 3857},
            "feature_layer": {"fields": []},
            "resource": "Roads"
        });

        assert_eq!(worker.geometry_kind(&meta), None);
        assert_eq!(worker.srs_id(&meta), None);
        assert!(worker.fields(&meta).is_none());
        assert_eq!(worker.display_name(&meta), None);
        assert_eq!(worker.resource_kind(&json!("vector_layer")), None);
        assert_eq!(worker.resource_id(&json!({"id": "7"})), None);
    }

    #[test]
    fn feature_extractors() {
        let worker = worker(MemoryTransport::new());
        let feature = json!({"id": 12, "geom": "POINT (1 2)", "fields": {"name": null}});

        assert_eq!(worker.feature_id(&feature), Some(12));
        assert_eq!(worker.feature_geometry(&feature), Some("POINT (1 2)"));
        assert_eq!(worker.feature_attributes(&feature).map(Map::len), Some(1));
        assert!(worker.feature_attributes(&json!({"fields": [1]})).is_none());
    }

    #[test]
    fn list_requires_non_empty_array() {
        let empty = worker(MemoryTransport::new().with_json(format!("{BASE}{FLAT_LIST_PATH}"), "[]"));
        assert!(matches!(
            empty.list_vector_resources(),
            Err(ProtocolError::BadList { .. })
        ));

        let object = worker(MemoryTransport::new().with_json(format!("{BASE}{FLAT_LIST_PATH}"), "{}"));
        assert!(object.list_vector_resources().is_err());

        let ok = worker(MemoryTransport::new().with_json(
            format!("{BASE}{FLAT_LIST_PATH}"),
            r#"[{"cls": "vector_layer", "id": 1}]"#,
        ));
        assert_eq!(ok.list_vector_resources().unwrap().len(), 1);
    }

    #[test]
    fn meta_and_features_substitute_id() {
        let transport = MemoryTransport::new()
            .with_json(format!("{BASE}/api/resource/42"), r#"{"resource": {}}"#)
            .with_json(
                format!("{BASE}/api/resource/42/feature/"),
                r#"[{"id": 1, "geom": "POINT (0 0)", "fields": {}}]"#,
            );
        let worker = worker(transport);

        assert!(worker.fetch_resource_meta(42).is_ok());
        assert_eq!(worker.fetch_resource_features(42).unwrap().len(), 1);

        match worker.fetch_resource_meta(43) {
            Err(ProtocolError::BadMeta { resource_id, .. }) => assert_eq!(resource_id, 43),
            other => panic!("expected BadMeta, got {other:?}"),
        }
        assert!(matches!(
            worker.fetch_resource_features(43),
            Err(ProtocolError::BadFeatures { resource_id: 43, .. })
        ));
    }

    #[test]
    fn meta_must_be_object() {
        let worker = worker(MemoryTransport::new().with_json(format!("{BASE}/api/resource/5"), "[1]"));
        let err = worker.fetch_resource_meta(5).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn features_must_be_non_empty_array() {
        let transport = MemoryTransport::new()
            .with_json(format!("{BASE}/api/resource/8/feature/"), "[]")
            .with_json(format!("{BASE}/api/resource/9/feature/"), r#"{"id": 1}"#);
        let worker = worker(transport);

        for id in [8, 9] {
            let err = worker.fetch_resource_features(id).unwrap_err();
            assert!(err.to_string().contains("not a non-empty array"));
        }
    }
}
