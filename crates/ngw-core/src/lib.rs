//! `ngw-core` reads the vector layers published by a NextGIS Web server.
//!
//! This crate includes:
//! - **Driver**: Connection string handling and capabilities of the NGW driver.
//! - **Catalog**: Version negotiation and discovery of vector resources.
//! - **Layer**: Lazy, two-phase caching of a resource's schema and records.
//! - **Protocol workers**: The versioned NGW API client.
//! - **Transport**: The "fetch bytes or fail" seam, over HTTP or in memory.
//!
//! ```no_run
//! use ngw_core::{NGW_DRIVER, OpenOptions};
//!
//! # fn main() -> ngw_core::Result<()> {
//! let mut catalog = NGW_DRIVER.open("NGW:https://demo.nextgis.com", &OpenOptions::new())?;
//! if let Some(layer) = catalog.layer(0) {
//!     for record in layer.records()? {
//!         println!("{record}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
mod feature;
pub mod layer;
pub mod mapping;
pub mod transport;
pub mod types;
pub mod validator;
pub mod worker;

pub use catalog::{Catalog, OpenSummary};
pub use config::OpenOptions;
pub use driver::{Driver, DriverCapabilities, NGW_DRIVER, SupportStatus};
pub use error::{NgwError, Result};
pub use layer::{CacheState, Layer};
pub use mapping::{AttributeKind, GeometryKind, NgwDateTime};
pub use transport::{MemoryTransport, ReqwestTransport, Transport};
pub use types::{FieldDefn, FieldValue, LayerSchema, Record, ResourceId, SpatialReference};
pub use worker::{ApiWorker, ProtocolWorker};
