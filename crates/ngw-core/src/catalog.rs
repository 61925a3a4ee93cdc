//! The catalog of vector layers published by one NextGIS Web server.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{DriverError, NgwError, Result};
use crate::layer::Layer;
use crate::transport::Transport;
use crate::worker::{ApiWorker, ProtocolWorker};

/// What happened to the resource list entries during [`Catalog::open`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSummary {
    /// Entries exposed as layers
    pub layers: usize,
    /// Entries of a kind the worker does not expose
    pub non_vector_skipped: usize,
    /// Entries whose kind or id could not be read
    pub parse_skipped: usize,
}

/// An opened NextGIS Web server.
#[derive(Debug)]
pub struct Catalog {
    worker: Arc<ApiWorker>,
    layers: Vec<Layer>,
    summary: OpenSummary,
}

impl Catalog {
    /// Probe the server at `base_url` and build one layer per vector resource.
    ///
    /// # Errors
    ///
    /// Fails only if the version probe or the resource list fetch fails.
    pub fn open(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let worker = ApiWorker::connect(base_url, transport)?;
        Self::from_worker(worker)
    }

    /// Build the layer list with an already connected worker.
    ///
    /// # Errors
    ///
    /// Returns the resource list fetch error.
    pub fn from_worker(worker: ApiWorker) -> Result<Self> {
        let worker = Arc::new(worker);
        let resources = worker.list_vector_resources()?;

        let mut layers = Vec::new();
        let mut summary = OpenSummary::default();
        for item in &resources {
            let Some(kind) = worker.resource_kind(item) else {
                summary.parse_skipped += 1;
                continue;
            };
            if !worker.supports_kind(kind) {
                summary.non_vector_skipped += 1;
                continue;
            }
            let Some(id) = worker.resource_id(item) else {
                summary.parse_skipped += 1;
                continue;
            };
            layers.push(Layer::new(Arc::clone(&worker), id));
        }
        summary.layers = layers.len();

        if summary.non_vector_skipped > 0 {
            debug!(
                "Skipped {} non-vector resource(s)",
                summary.non_vector_skipped
            );
        }
        if summary.parse_skipped > 0 {
            debug!(
                "Skipped {} resource(s) because of errors during parsing of JSON",
                summary.parse_skipped
            );
        }
        info!(
            "Opened NextGIS Web at {} (API {}): {} layer(s)",
            worker.base_url(),
            worker.api_version(),
            summary.layers
        );

        Ok(Self {
            worker,
            layers,
            summary,
        })
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer at `index`, with its schema cached.
    ///
    /// A schema failure is logged; the layer is still returned and stays
    /// uncached, so [`Layer::cache_schema`] reports the error again.
    pub fn layer(&mut self, index: usize) -> Option<&mut Layer> {
        let layer = self.layers.get_mut(index)?;
        prepare(layer);
        Some(layer)
    }

    /// Layer called `name` (the decimal resource id), with its schema cached.
    pub fn layer_by_name(&mut self, name: &str) -> Option<&mut Layer> {
        let layer = self.layers.iter_mut().find(|layer| layer.name() == name)?;
        prepare(layer);
        Some(layer)
    }

    /// All layers in list order, schemas untouched.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    #[must_use]
    pub fn api_version(&self) -> f64 {
        self.worker.api_version()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.worker.base_url()
    }

    #[must_use]
    pub fn summary(&self) -> OpenSummary {
        self.summary
    }

    /// # Errors
    ///
    /// Always fails: the catalog is read-only.
    pub fn create_layer(&mut self, _name: &str) -> Result<&mut Layer> {
        Err(NgwError::from(DriverError::OperationNotSupported {
            operation: "Creating layers",
        }))
    }

    /// # Errors
    ///
    /// Always fails: the catalog is read-only.
    pub fn delete_layer(&mut self, _index: usize) -> Result<()> {
        Err(DriverError::OperationNotSupported {
            operation: "Deleting layers",
        }
        .into())
    }
}

fn prepare(layer: &mut Layer) {
    if let Err(err) = layer.cache_schema() {
        warn!("Layer {}: {err}", layer.name());
    }
}
