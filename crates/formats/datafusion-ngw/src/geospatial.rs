//! Geometry column construction for NGW layers.
//!
//! Record geometries are written out as WKT and decoded into the `GeoArrow`
//! type matching the layer's declared geometry kind. The layer's spatial
//! reference travels in the type metadata as an authority code.

use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::StringBuilder;
use geoarrow_array::GeoArrowArray;
use geoarrow_array::array::WktArray;
use geoarrow_array::cast::from_wkt;
use geoarrow_schema::{
    Crs, Dimension, GeoArrowType, GeometryType, LineStringType, Metadata, MultiLineStringType,
    MultiPointType, MultiPolygonType, PointType, PolygonType, WktType,
};
use ngw_core::{GeometryKind, LayerSchema, Record};

use crate::error::{NgwFormatError, NgwFormatResult};

/// `GeoArrow` type for a layer's geometry column.
#[must_use]
pub fn geoarrow_type_for(schema: &LayerSchema) -> GeoArrowType {
    let metadata = Arc::new(match schema.spatial_reference.authority_code() {
        Some(code) => Metadata::new(Crs::from_authority_code(code), None),
        None => Metadata::default(),
    });

    match schema.geometry_kind {
        GeometryKind::Point => GeoArrowType::Point(PointType::new(Dimension::XY, metadata)),
        GeometryKind::LineString => {
            GeoArrowType::LineString(LineStringType::new(Dimension::XY, metadata))
        },
        GeometryKind::Polygon => GeoArrowType::Polygon(PolygonType::new(Dimension::XY, metadata)),
        GeometryKind::MultiPoint => {
            GeoArrowType::MultiPoint(MultiPointType::new(Dimension::XY, metadata))
        },
        GeometryKind::MultiLineString => {
            GeoArrowType::MultiLineString(MultiLineStringType::new(Dimension::XY, metadata))
        },
        GeometryKind::MultiPolygon => {
            GeoArrowType::MultiPolygon(MultiPolygonType::new(Dimension::XY, metadata))
        },
        GeometryKind::Unknown => GeoArrowType::Geometry(GeometryType::new(metadata)),
    }
}

/// Build the geometry column for `records`.
///
/// # Errors
///
/// Returns [`NgwFormatError::Geometry`] if the WKT cannot be decoded into the
/// layer's `GeoArrow` type.
pub fn build_geometry_column(schema: &LayerSchema, records: &[Record]) -> NgwFormatResult<ArrayRef> {
    let mut builder = StringBuilder::with_capacity(records.len(), records.len() * 32);
    for record in records {
        match record.geometry_wkt() {
            Some(wkt) => builder.append_value(wkt),
            None => builder.append_null(),
        }
    }

    let wkt_array = WktArray::from((builder.finish(), WktType::new(Arc::default())));
    let geometry_array =
        from_wkt(&wkt_array, geoarrow_type_for(schema)).map_err(|err| NgwFormatError::Geometry {
            layer: schema.name.clone(),
            message: err.to_string(),
        })?;

    Ok(geometry_array.into_array_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngw_core::SpatialReference;

    fn schema(kind: GeometryKind, srs: SpatialReference) -> LayerSchema {
        LayerSchema {
            name: "4".to_string(),
            geometry_kind: kind,
            spatial_reference: srs,
            fields: Vec::new(),
            display_name: None,
        }
    }

    #[test]
    fn declared_kind_selects_geoarrow_type() {
        let point = geoarrow_type_for(&schema(GeometryKind::Point, SpatialReference::Epsg(4326)));
        assert!(matches!(point, GeoArrowType::Point(_)));

        let polygons = geoarrow_type_for(&schema(
            GeometryKind::MultiPolygon,
            SpatialReference::Epsg(3857),
        ));
        assert!(matches!(polygons, GeoArrowType::MultiPolygon(_)));

        let unknown = geoarrow_type_for(&schema(
            GeometryKind::Unknown,
            SpatialReference::Unresolved(990_001),
        ));
        assert!(matches!(unknown, GeoArrowType::Geometry(_)));
    }

    #[test]
    fn resolved_srs_is_carried_as_crs() {
        let with_crs = geoarrow_type_for(&schema(GeometryKind::Point, SpatialReference::Epsg(3857)));
        let field = with_crs.to_field("geometry", true);
        let metadata = field.metadata().get("ARROW:extension:metadata").cloned();
        assert!(metadata.is_some_and(|json| json.contains("EPSG:3857")));

        let without = geoarrow_type_for(&schema(
            GeometryKind::Point,
            SpatialReference::Unresolved(1),
        ));
        let field = without.to_field("geometry", true);
        let metadata = field.metadata().get("ARROW:extension:metadata").cloned();
        assert!(!metadata.unwrap_or_default().contains("EPSG"));
    }
}
