//! `SessionContext` helpers for registering NGW layers as tables.

use std::sync::Arc;

use datafusion::datasource::MemTable;
use datafusion::error::Result;
use datafusion::prelude::SessionContext;
use log::{debug, warn};
use ngw_core::{CacheState, Catalog, Layer};

use crate::convert::layer_to_record_batch;
use crate::options::NgwFormatOptions;

/// Extension methods for registering NGW layers on a [`SessionContext`].
///
/// Layers must be fully cached before registration; the tables are
/// in-memory snapshots and never talk to the server.
pub trait SessionContextNgwExt {
    /// Register one fully cached layer under `table_name`.
    ///
    /// # Errors
    ///
    /// Fails if the layer is not fully cached, its conversion fails or the
    /// table cannot be registered.
    fn register_ngw_layer(
        &self,
        table_name: &str,
        layer: &Layer,
        options: &NgwFormatOptions,
    ) -> Result<()>;

    /// Register every fully cached layer of `catalog` as
    /// `<table_prefix><layer name>`, returning the number registered.
    ///
    /// A layer that cannot be converted or registered is logged and skipped;
    /// the others are still registered.
    ///
    /// # Errors
    ///
    /// Currently never fails; the `Result` matches [`Self::register_ngw_layer`].
    fn register_ngw_catalog(&self, catalog: &Catalog, options: &NgwFormatOptions) -> Result<usize>;
}

impl SessionContextNgwExt for SessionContext {
    fn register_ngw_layer(
        &self,
        table_name: &str,
        layer: &Layer,
        options: &NgwFormatOptions,
    ) -> Result<()> {
        let batch = layer_to_record_batch(layer, options)?;
        let table = MemTable::try_new(batch.schema(), vec![vec![batch]])?;
        self.register_table(table_name, Arc::new(table))?;
        debug!("Registered layer {} as table {table_name}", layer.name());
        Ok(())
    }

    fn register_ngw_catalog(&self, catalog: &Catalog, options: &NgwFormatOptions) -> Result<usize> {
        let mut registered = 0;
        for layer in catalog.layers() {
            if layer.cache_state() != CacheState::FullyCached {
                debug!("Layer {} is not fully cached, not registered", layer.name());
                continue;
            }
            match self.register_ngw_layer(&options.table_name(layer.name()), layer, options) {
                Ok(()) => registered += 1,
                Err(err) => warn!("Layer {} skipped: {err}", layer.name()),
            }
        }
        Ok(registered)
    }
}
