//! Arrow and `DataFusion` exposure of NextGIS Web layers.
//!
//! A fully cached [`ngw_core::Layer`] converts to a single `RecordBatch`: an
//! `Int64` feature id column, one column per attribute field and a `GeoArrow`
//! geometry column typed by the declared geometry kind.

pub mod convert;
pub mod error;
pub mod geospatial;
pub mod options;
pub mod session;

pub use convert::{arrow_schema_for, arrow_type_for, layer_to_record_batch};
pub use error::{NgwFormatError, NgwFormatResult};
pub use geospatial::{build_geometry_column, geoarrow_type_for};
pub use options::NgwFormatOptions;
pub use session::SessionContextNgwExt;
