use arrow_array::Array;
use datafusion::prelude::*;
use datafusion::error::{DataFusionError, Result};
use datafusion_ngw::{NgwFormatOptions, SessionContextNgwExt, layer_to_record_batch};
use geo_traits::{CoordTrait, PointTrait};
use geoarrow_array::GeoArrowArrayAccessor;
use geoarrow_array::array::PointArray;
use ngw_core::worker::VERSION_PATH;
use ngw_core::{Catalog, MemoryTransport, Transport};
use std::convert::TryFrom;
use std::sync::Arc;

const BASE: &str = "http://ngw.test";

const META: &str = r#"{
    "resource": {"cls": "vector_layer", "id": 21, "display_name": "Stations"},
    "vector_layer": {"geometry_type": "POINT", "srs": {"id": 4326}},
    "feature_layer": {"fields": [
        {"keyname": "title", "datatype": "STRING"},
        {"keyname": "elevation", "datatype": "REAL"},
        {"keyname": "opened", "datatype": "DATE"}
    ]}
}"#;

const FEATURES: &str = r#"[
    {"id": 100, "geom": "POINT (37.6 55.75)", "fields": {"title": "Moscow", "elevation": 156.0, "opened": {"year": 1947, "month": 3, "day": 1}}},
    {"id": 101, "geom": "POINT (30.3 59.95)", "fields": {"title": "Saint Petersburg", "elevation": null, "opened": null}},
    {"id": 102, "geom": "POINT (bad)", "fields": {"title": "Broken"}}
]"#;

fn catalog() -> Result<Catalog> {
    let transport: Arc<dyn Transport> = Arc::new(
        MemoryTransport::new()
            .with_json(format!("{BASE}{VERSION_PATH}"), r#"{"nextgisweb": "4.0.0"}"#)
            .with_json(
                format!("{BASE}/resource/store/"),
                r#"[{"cls": "vector_layer", "id": 21}, {"cls": "vector_layer", "id": 22}]"#,
            )
            .with_json(format!("{BASE}/api/resource/21"), META)
            .with_json(format!("{BASE}/api/resource/21/feature/"), FEATURES),
    );

    let mut catalog =
        Catalog::open(BASE, transport).map_err(|err| DataFusionError::External(Box::new(err)))?;
    if let Some(layer) = catalog.layer(0) {
        layer
            .reset_reading()
            .map_err(|err| DataFusionError::External(Box::new(err)))?;
    }
    Ok(catalog)
}

/// Test registering every cached layer of a catalog and querying it with SQL
#[tokio::test]
async fn test_register_catalog_and_query() -> Result<()> {
    let catalog = catalog()?;
    let ctx = SessionContext::new();

    let registered = ctx.register_ngw_catalog(&catalog, &NgwFormatOptions::default())?;
    // layer 22 has no metadata and stays uncached
    assert_eq!(registered, 1);

    let df = ctx
        .sql("SELECT fid, title FROM layer_21 WHERE elevation IS NOT NULL")
        .await?;
    let batches = df.collect().await?;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].num_rows(), 1);

    let df = ctx.sql("SELECT count(*) AS n FROM layer_21").await?;
    let batches = df.collect().await?;
    assert_eq!(batches[0].num_rows(), 1);

    Ok(())
}

/// Test that the geometry column decodes back into `GeoArrow` points
#[tokio::test]
async fn test_geometry_column_is_geoarrow_point() -> Result<()> {
    let mut catalog = catalog()?;
    let layer = catalog.layer(0).expect("layer 21");
    let ctx = SessionContext::new();

    ctx.register_ngw_layer("stations", layer, &NgwFormatOptions::default())?;

    let df = ctx
        .sql("SELECT geometry FROM stations WHERE fid = 100")
        .await?;
    let batches = df.collect().await?;
    let batch = &batches[0];
    let schema = batch.schema();
    let field = schema
        .field_with_name("geometry")
        .expect("geometry field to exist");
    let column = batch.column(schema.index_of("geometry")?).clone();

    let points = PointArray::try_from((column.as_ref(), field))
        .map_err(|err| DataFusionError::Execution(format!("Failed to decode point geometry: {err}")))?;
    let point = points
        .value(0)
        .map_err(|err| DataFusionError::Execution(err.to_string()))?;
    let coord = point.coord().expect("point should contain coordinates");

    assert!((coord.x() - 37.6).abs() < 1e-9);
    assert!((coord.y() - 55.75).abs() < 1e-9);
    Ok(())
}

/// Test the batch layout produced for a cached layer
#[test]
fn test_layer_batch_layout() -> Result<()> {
    let mut catalog = catalog()?;
    let layer = catalog.layer(0).expect("layer 21");

    let batch = layer_to_record_batch(layer, &NgwFormatOptions::default())?;
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 5);
    assert_eq!(batch.column(2).null_count(), 1);
    assert_eq!(batch.column(3).null_count(), 1);
    Ok(())
}

/// Test that uncached layers are refused
#[test]
fn test_uncached_layer_is_refused() -> Result<()> {
    let catalog = catalog()?;
    let uncached = catalog.layers().nth(1).expect("layer 22");

    let err = layer_to_record_batch(uncached, &NgwFormatOptions::default()).unwrap_err();
    assert!(err.to_string().contains("not fully cached"));
    Ok(())
}

/// Test that a layer whose field clashes with the fid column is skipped
#[test]
fn test_catalog_registration_skips_clashing_layer() -> Result<()> {
    let clashing = r#"{
        "vector_layer": {"geometry_type": "POINT", "srs": {"id": 4326}},
        "feature_layer": {"fields": [{"keyname": "fid", "datatype": "INTEGER"}]}
    }"#;
    let transport: Arc<dyn Transport> = Arc::new(
        MemoryTransport::new()
            .with_json(format!("{BASE}{VERSION_PATH}"), r#"{"nextgisweb": "4.0.0"}"#)
            .with_json(
                format!("{BASE}/resource/store/"),
                r#"[{"cls": "vector_layer", "id": 20}, {"cls": "vector_layer", "id": 21}]"#,
            )
            .with_json(format!("{BASE}/api/resource/20"), clashing)
            .with_json(
                format!("{BASE}/api/resource/20/feature/"),
                r#"[{"id": 1, "geom": "POINT (0 0)", "fields": {"fid": 9}}]"#,
            )
            .with_json(format!("{BASE}/api/resource/21"), META)
            .with_json(format!("{BASE}/api/resource/21/feature/"), FEATURES),
    );
    let mut catalog =
        Catalog::open(BASE, transport).map_err(|err| DataFusionError::External(Box::new(err)))?;
    for index in 0..catalog.layer_count() {
        if let Some(layer) = catalog.layer(index) {
            layer
                .reset_reading()
                .map_err(|err| DataFusionError::External(Box::new(err)))?;
        }
    }

    let ctx = SessionContext::new();
    let registered = ctx.register_ngw_catalog(&catalog, &NgwFormatOptions::default())?;
    assert_eq!(registered, 1);
    assert!(ctx.table_exist("layer_21")?);
    assert!(!ctx.table_exist("layer_20")?);
    Ok(())
}

