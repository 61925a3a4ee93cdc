//! A NextGIS Web vector resource exposed as a lazily cached layer.
//!
//! A layer starts empty. The first schema request fetches the resource
//! metadata; the first read fetches every feature. Neither is fetched twice.

use std::sync::Arc;

use log::{debug, warn};

use crate::error::{DriverError, Result, SchemaError};
use crate::feature;
use crate::mapping::{AttributeKind, GeometryKind};
use crate::types::{FieldDefn, LayerSchema, Record, ResourceId, SpatialReference};
use crate::worker::{ApiWorker, ProtocolWorker};

/// How much of a layer has been fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing fetched yet
    Uncached,
    /// Schema known, features not fetched
    SchemaCached,
    /// Schema and all records in memory
    FullyCached,
}

#[derive(Debug)]
enum LayerCache {
    Uncached,
    SchemaCached(Arc<LayerSchema>),
    FullyCached {
        schema: Arc<LayerSchema>,
        records: Vec<Record>,
    },
}

/// One vector resource of a catalog.
#[derive(Debug)]
pub struct Layer {
    resource_id: ResourceId,
    name: String,
    worker: Arc<ApiWorker>,
    cache: LayerCache,
    cursor: Option<usize>,
    skipped_fields: usize,
    skipped_records: usize,
}

impl Layer {
    pub(crate) fn new(worker: Arc<ApiWorker>, resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            name: resource_id.to_string(),
            worker,
            cache: LayerCache::Uncached,
            cursor: None,
            skipped_fields: 0,
            skipped_records: 0,
        }
    }

    /// Layer name: the decimal resource id.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    #[must_use]
    pub fn cache_state(&self) -> CacheState {
        match self.cache {
            LayerCache::Uncached => CacheState::Uncached,
            LayerCache::SchemaCached(_) => CacheState::SchemaCached,
            LayerCache::FullyCached { .. } => CacheState::FullyCached,
        }
    }

    /// Cached schema, if [`Layer::cache_schema`] has succeeded.
    #[must_use]
    pub fn schema(&self) -> Option<&LayerSchema> {
        self.schema_arc().map(Arc::as_ref)
    }

    /// Shared handle to the cached schema.
    #[must_use]
    pub fn schema_arc(&self) -> Option<&Arc<LayerSchema>> {
        match &self.cache {
            LayerCache::Uncached => None,
            LayerCache::SchemaCached(schema) | LayerCache::FullyCached { schema, .. } => Some(schema),
        }
    }

    /// All materialized records, once the layer is fully cached.
    #[must_use]
    pub fn cached_records(&self) -> Option<&[Record]> {
        match &self.cache {
            LayerCache::FullyCached { records, .. } => Some(records),
            _ => None,
        }
    }

    /// Field definitions dropped while building the schema.
    #[must_use]
    pub fn skipped_fields(&self) -> usize {
        self.skipped_fields
    }

    /// Features dropped while materializing records.
    #[must_use]
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Fetch the resource metadata and build the schema.
    ///
    /// Does nothing once the schema is cached.
    ///
    /// # Errors
    ///
    /// Returns the metadata fetch error, or a [`SchemaError`] when the
    /// geometry kind, spatial reference or field list is missing. The layer
    /// stays [`CacheState::Uncached`] on error.
    pub fn cache_schema(&mut self) -> Result<()> {
        if !matches!(self.cache, LayerCache::Uncached) {
            return Ok(());
        }

        let resource_id = self.resource_id;
        let worker = Arc::clone(&self.worker);
        let meta = worker.fetch_resource_meta(resource_id)?;

        let geometry_name = worker
            .geometry_kind(&meta)
            .ok_or(SchemaError::MissingGeometryType { resource_id })?;
        let srs_id = worker
            .srs_id(&meta)
            .ok_or(SchemaError::MissingSpatialReference { resource_id })?;
        let raw_fields = worker
            .fields(&meta)
            .ok_or(SchemaError::MissingFields { resource_id })?;

        let geometry_kind = GeometryKind::from_ngw_name(geometry_name);
        if geometry_kind == GeometryKind::Unknown {
            warn!("Layer {}: unknown geometry type '{geometry_name}'", self.name);
        }

        let spatial_reference = SpatialReference::from_srs_id(srs_id);
        if !spatial_reference.is_resolved() {
            warn!(
                "Layer {}: unable to resolve spatial reference {srs_id}",
                self.name
            );
        }

        let mut fields = Vec::with_capacity(raw_fields.len());
        let mut skipped = 0;
        for raw in raw_fields {
            match (worker.field_name(raw), worker.field_kind(raw)) {
                (Some(name), Some(kind)) => {
                    fields.push(FieldDefn::new(name, AttributeKind::from_ngw_name(kind)));
                },
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(
                "Layer {}: skipped {skipped} field definition(s) because of errors during parsing of JSON",
                self.name
            );
        }

        let display_name = worker.display_name(&meta).map(str::to_string);
        if display_name.is_none() {
            warn!("Layer {}: no display name", self.name);
        }

        self.skipped_fields = skipped;
        self.cache = LayerCache::SchemaCached(Arc::new(LayerSchema {
            name: self.name.clone(),
            geometry_kind,
            spatial_reference,
            fields,
            display_name,
        }));
        debug!("Layer {}: schema cached", self.name);
        Ok(())
    }

    /// Fetch every feature and materialize the records.
    ///
    /// Does nothing until the schema is cached, and nothing once records are.
    /// Features that fail to parse are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns the feature fetch error; the layer stays
    /// [`CacheState::SchemaCached`].
    pub fn cache_features(&mut self) -> Result<()> {
        let schema = match &self.cache {
            LayerCache::Uncached => {
                debug!(
                    "Layer {}: cannot fetch features before the schema",
                    self.name
                );
                return Ok(());
            },
            LayerCache::FullyCached { .. } => return Ok(()),
            LayerCache::SchemaCached(schema) => Arc::clone(schema),
        };

        let features = self.worker.fetch_resource_features(self.resource_id)?;

        let mut records = Vec::with_capacity(features.len());
        let mut skipped = 0;
        for raw in &features {
            match feature::build_record(self.worker.as_ref(), &schema, raw) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    debug!("Layer {}: skipping feature: {reason}", self.name);
                },
            }
        }
        if skipped > 0 {
            debug!(
                "Layer {}: skipped {skipped} feature(s) because of errors during parsing of JSON",
                self.name
            );
        }

        debug!("Layer {}: {} record(s) cached", self.name, records.len());
        self.skipped_records = skipped;
        self.cache = LayerCache::FullyCached { schema, records };
        Ok(())
    }

    /// Rewind the read cursor to the first record, fetching features if needed.
    ///
    /// Without a cached schema this only logs and leaves the cursor inactive.
    ///
    /// # Errors
    ///
    /// Returns the feature fetch error from [`Layer::cache_features`].
    pub fn reset_reading(&mut self) -> Result<()> {
        self.cursor = None;
        if matches!(self.cache, LayerCache::Uncached) {
            debug!(
                "Unable to read layer {}: metadata has not been fetched",
                self.name
            );
            return Ok(());
        }

        self.cache_features()?;
        self.cursor = Some(0);
        Ok(())
    }

    /// Next record under the cursor, or `None` past the end or before
    /// [`Layer::reset_reading`].
    pub fn next_record(&mut self) -> Option<Record> {
        let idx = self.cursor?;
        let LayerCache::FullyCached { records, .. } = &self.cache else {
            return None;
        };
        let record = records.get(idx)?.clone();
        self.cursor = Some(idx + 1);
        Some(record)
    }

    /// Rewind and iterate every record.
    ///
    /// # Errors
    ///
    /// Same as [`Layer::reset_reading`].
    pub fn records(&mut self) -> Result<impl Iterator<Item = Record> + '_> {
        self.reset_reading()?;
        Ok(std::iter::from_fn(move || self.next_record()))
    }

    /// # Errors
    ///
    /// Always fails: layers are read-only.
    pub fn insert_record(&mut self, _record: Record) -> Result<()> {
        Err(not_supported())
    }

    /// # Errors
    ///
    /// Always fails: layers are read-only.
    pub fn update_record(&mut self, _record: Record) -> Result<()> {
        Err(not_supported())
    }

    /// # Errors
    ///
    /// Always fails: layers are read-only.
    pub fn delete_record(&mut self, _id: i64) -> Result<()> {
        Err(not_supported())
    }
}

fn not_supported() -> crate::error::NgwError {
    DriverError::OperationNotSupported {
        operation: "Writing features",
    }
    .into()
}
