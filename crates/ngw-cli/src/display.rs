//! Display utilities for formatting CLI output.
//!
//! Table rows and formatting functions for drivers, layers, schemas and
//! records read from a NextGIS Web server.

use ngw_core::{Driver, Layer, LayerSchema, Record};
use tabled::builder::Builder;
use tabled::{Table, Tabled};

/// Placeholder for values that are not known.
const NOT_AVAILABLE: &str = "N/A";

/// Table row representation for displaying driver information.
#[derive(Tabled)]
pub struct DriverRow {
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    #[tabled(rename = "Info")]
    pub info: String,
    #[tabled(rename = "Read")]
    pub read: String,
    #[tabled(rename = "Write")]
    pub write: String,
}

impl From<&Driver> for DriverRow {
    fn from(driver: &Driver) -> Self {
        Self {
            short_name: driver.short_name.to_string(),
            long_name: driver.long_name.to_string(),
            info: driver.capabilities.info.as_str().to_string(),
            read: driver.capabilities.read.as_str().to_string(),
            write: driver.capabilities.write.as_str().to_string(),
        }
    }
}

/// Table row representation for one layer of a catalog.
#[derive(Tabled)]
pub struct LayerRow {
    /// Layer name (resource id).
    #[tabled(rename = "Layer")]
    pub name: String,
    #[tabled(rename = "Display Name")]
    pub display_name: String,
    #[tabled(rename = "Geometry")]
    pub geometry: String,
    #[tabled(rename = "SRS")]
    pub srs: String,
    #[tabled(rename = "Fields")]
    pub fields: String,
}

impl From<&Layer> for LayerRow {
    fn from(layer: &Layer) -> Self {
        let schema = layer.schema();
        Self {
            name: layer.name().to_string(),
            display_name: schema
                .and_then(|s| s.display_name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            geometry: schema.map_or_else(
                || NOT_AVAILABLE.to_string(),
                |s| s.geometry_kind.to_string(),
            ),
            srs: schema.map_or_else(
                || NOT_AVAILABLE.to_string(),
                |s| s.spatial_reference.to_string(),
            ),
            fields: schema.map_or_else(|| NOT_AVAILABLE.to_string(), |s| s.fields.len().to_string()),
        }
    }
}

/// Table row representation for displaying field information.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
}

/// Render the driver table.
#[must_use]
pub fn drivers_table(drivers: &[Driver]) -> String {
    let rows: Vec<DriverRow> = drivers.iter().map(DriverRow::from).collect();
    Table::new(rows).to_string()
}

/// Render the layer table of a catalog.
#[must_use]
pub fn layers_table<'a>(layers: impl Iterator<Item = &'a Layer>) -> String {
    let rows: Vec<LayerRow> = layers.map(LayerRow::from).collect();
    Table::new(rows).to_string()
}

/// Print the schema of one layer.
pub fn display_schema(schema: &LayerSchema) {
    println!("\nLayer: {}", schema.name);
    println!(
        "Display name: {}",
        schema.display_name.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    println!("Geometry: {}", schema.geometry_kind);
    println!("SRS: {}", schema.spatial_reference);

    if !schema.fields.is_empty() {
        println!("\n=== Fields ===");
        let rows: Vec<FieldRow> = schema
            .fields
            .iter()
            .map(|field| FieldRow {
                name: field.name.clone(),
                kind: field.kind.to_string(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}

/// Render records as a table: fid, every attribute, then the WKT geometry.
///
/// Unset attributes are shown empty.
#[must_use]
pub fn records_table(schema: &LayerSchema, records: &[Record]) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["fid".to_string()];
    header.extend(schema.fields.iter().map(|field| field.name.clone()));
    header.push("geometry".to_string());
    builder.push_record(header);

    for record in records {
        let mut row = vec![record.id().to_string()];
        row.extend(
            record
                .fields()
                .map(|(_, value)| value.map(ToString::to_string).unwrap_or_default()),
        );
        row.push(record.geometry_wkt().unwrap_or_default());
        builder.push_record(row);
    }

    builder.build().to_string()
}
