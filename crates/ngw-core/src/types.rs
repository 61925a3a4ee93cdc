//! Data types for layers read from a NextGIS Web server.
//!
//! This module defines the layer schema, attribute values and the
//! materialized records handed out by [`crate::layer::Layer`].

use std::fmt;
use std::sync::Arc;

use geo_types::Geometry;
use geozero::ToWkt;

use crate::mapping::{AttributeKind, GeometryKind, NgwDateTime};

/// Server-side resource id. Also the name of the local layer.
pub type ResourceId = i64;

/// Smallest and largest code looked up as an EPSG reference system.
const EPSG_CODE_RANGE: std::ops::RangeInclusive<i64> = 1024..=32767;

/// Spatial reference of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpatialReference {
    /// Code resolved as an EPSG reference system.
    Epsg(i64),
    /// Code the server reported that could not be resolved.
    Unresolved(i64),
}

impl SpatialReference {
    /// Resolve an NGW `srs.id`.
    ///
    /// NGW ids for built-in systems are EPSG codes. Anything outside the EPSG
    /// code space is kept as [`SpatialReference::Unresolved`].
    #[must_use]
    pub fn from_srs_id(code: i64) -> Self {
        if EPSG_CODE_RANGE.contains(&code) {
            Self::Epsg(code)
        } else {
            Self::Unresolved(code)
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Epsg(_))
    }

    /// The code reported by the server, resolved or not.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Epsg(code) | Self::Unresolved(code) => *code,
        }
    }

    /// `"EPSG:<code>"` for resolved references.
    #[must_use]
    pub fn authority_code(&self) -> Option<String> {
        match self {
            Self::Epsg(code) => Some(format!("EPSG:{code}")),
            Self::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Unresolved(code) => write!(f, "unresolved ({code})"),
        }
    }
}

/// Definition of one attribute field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefn {
    /// Field key name as reported by the server
    pub name: String,
    /// Typed domain of the field
    pub kind: AttributeKind,
}

impl FieldDefn {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Schema of a layer: geometry, spatial reference and ordered fields.
///
/// Built once per layer and shared between the layer and its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSchema {
    /// Layer name (the decimal resource id)
    pub name: String,
    /// Declared geometry kind
    pub geometry_kind: GeometryKind,
    /// Spatial reference of the geometry
    pub spatial_reference: SpatialReference,
    /// Attribute fields in server order
    pub fields: Vec<FieldDefn>,
    /// Human-readable name, when the server provided one
    pub display_name: Option<String>,
}

impl LayerSchema {
    /// Index of the first field called `name`.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefn> {
        self.field_index(name).map(|idx| &self.fields[idx])
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer64(i64),
    Real(f64),
    /// Calendar date; the clock components are zero.
    Date(NgwDateTime),
    Time(NgwDateTime),
    DateTime(NgwDateTime),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Text(_) => AttributeKind::Text,
            Self::Integer64(_) => AttributeKind::Integer64,
            Self::Real(_) => AttributeKind::Real,
            Self::Date(_) => AttributeKind::Date,
            Self::Time(_) => AttributeKind::Time,
            Self::DateTime(_) => AttributeKind::DateTime,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer64(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date_time(&self) -> Option<NgwDateTime> {
        match self {
            Self::Date(dt) | Self::Time(dt) | Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer64(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Date(dt) => write!(f, "{:04}-{:02}-{:02}", dt.year, dt.month, dt.day),
            Self::Time(dt) => write!(f, "{:02}:{:02}:{:02}", dt.hour, dt.minute, dt.second),
            Self::DateTime(dt) => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            ),
        }
    }
}

/// A materialized feature.
///
/// `values` is aligned with the schema's fields; `None` means the field is
/// unset (the server sent JSON `null` or omitted it).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: i64,
    geometry: Geometry<f64>,
    values: Vec<Option<FieldValue>>,
    schema: Arc<LayerSchema>,
}

impl Record {
    pub(crate) fn new(
        id: i64,
        geometry: Geometry<f64>,
        values: Vec<Option<FieldValue>>,
        schema: Arc<LayerSchema>,
    ) -> Self {
        debug_assert_eq!(values.len(), schema.fields.len());
        Self {
            id,
            geometry,
            values,
            schema,
        }
    }

    /// Feature id as sent by the server.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Geometry as Well-Known Text.
    #[must_use]
    pub fn geometry_wkt(&self) -> Option<String> {
        self.geometry.to_wkt().ok()
    }

    #[must_use]
    pub fn schema(&self) -> &LayerSchema {
        &self.schema
    }

    /// Value of the field called `name`; `None` if unset or not in the schema.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .field_index(name)
            .and_then(|idx| self.values[idx].as_ref())
    }

    /// Returns `true` if the field exists and holds a value.
    #[must_use]
    pub fn is_field_set(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Values aligned with [`LayerSchema::fields`].
    #[must_use]
    pub fn values(&self) -> &[Option<FieldValue>] {
        &self.values
    }

    /// Iterate `(field, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDefn, Option<&FieldValue>)> {
        self.schema
            .fields
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.values.iter().filter(|value| value.is_some()).count();
        write!(
            f,
            "Record(id={}, geometry={}, fields={set}/{} set)",
            self.id,
            self.schema.geometry_kind,
            self.values.len()
        )
    }
}
