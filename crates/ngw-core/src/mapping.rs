//! Mapping of NextGIS Web type names onto local geometry and attribute kinds.
//!
//! Both lookups are total: names the server reports that are not listed here
//! map to [`GeometryKind::Unknown`] and [`AttributeKind::Text`] respectively.
//! These tables do not change between API versions.

use std::fmt;

use geo_types::Geometry;
use serde_json::Value;

use crate::validator;

/// Geometry kind declared by a vector resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    /// The server reported a geometry type this crate does not know.
    Unknown,
}

impl GeometryKind {
    /// Map an NGW `geometry_type` name (e.g. `"MULTIPOLYGON"`).
    #[must_use]
    pub fn from_ngw_name(name: &str) -> Self {
        match name {
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" => Self::MultiLineString,
            "MULTIPOLYGON" => Self::MultiPolygon,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` if a parsed geometry has the shape this kind declares.
    ///
    /// `Unknown` places no constraint on the shape.
    #[must_use]
    pub fn accepts(&self, geometry: &Geometry<f64>) -> bool {
        match self {
            Self::Point => matches!(geometry, Geometry::Point(_)),
            Self::LineString => matches!(geometry, Geometry::LineString(_)),
            Self::Polygon => matches!(geometry, Geometry::Polygon(_)),
            Self::MultiPoint => matches!(geometry, Geometry::MultiPoint(_)),
            Self::MultiLineString => matches!(geometry, Geometry::MultiLineString(_)),
            Self::MultiPolygon => matches!(geometry, Geometry::MultiPolygon(_)),
            Self::Unknown => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed domain of a layer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Text,
    /// NGW integers are kept at 64 bits so no value is truncated.
    Integer64,
    Real,
    Date,
    Time,
    DateTime,
}

impl AttributeKind {
    /// Map an NGW field `datatype` name (e.g. `"INTEGER"`).
    ///
    /// Unrecognized names fall back to text, never to an error.
    #[must_use]
    pub fn from_ngw_name(name: &str) -> Self {
        match name {
            "STRING" => Self::Text,
            "INTEGER" => Self::Integer64,
            "REAL" => Self::Real,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" => Self::DateTime,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Integer64 => "Integer64",
            Self::Real => "Real",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broken-down date/time as NGW sends it for `DATE`, `TIME` and `DATETIME` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NgwDateTime {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl NgwDateTime {
    /// Keep only the calendar part; the clock part is zeroed.
    #[must_use]
    pub fn date_only(self) -> Self {
        Self {
            hour: 0,
            minute: 0,
            second: 0,
            ..self
        }
    }
}

/// Read the six components of an NGW date/time object.
///
/// Sub-fields `year`, `month`, `day`, `hour`, `min` and `sec` are read
/// independently; any that is absent, not an integer or out of `i32` range
/// reads as zero. This never fails.
#[must_use]
pub fn read_date_time(value: &Value) -> NgwDateTime {
    let part = |key: &str| {
        validator::integer(validator::member(Some(value), key))
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0)
    };

    NgwDateTime {
        year: part("year"),
        month: part("month"),
        day: part("day"),
        hour: part("hour"),
        minute: part("min"),
        second: part("sec"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Point, line_string};
    use serde_json::json;

    #[test]
    fn geometry_names() {
        assert_eq!(GeometryKind::from_ngw_name("POINT"), GeometryKind::Point);
        assert_eq!(GeometryKind::from_ngw_name("MULTILINESTRING"), GeometryKind::MultiLineString);
        assert_eq!(GeometryKind::from_ngw_name("MULTIPOLYGON"), GeometryKind::MultiPolygon);
        assert_eq!(GeometryKind::from_ngw_name("POINTZ"), GeometryKind::Unknown);
        assert_eq!(GeometryKind::from_ngw_name("point"), GeometryKind::Unknown);
    }

    #[test]
    fn attribute_names_default_to_text() {
        assert_eq!(AttributeKind::from_ngw_name("INTEGER"), AttributeKind::Integer64);
        assert_eq!(AttributeKind::from_ngw_name("REAL"), AttributeKind::Real);
        assert_eq!(AttributeKind::from_ngw_name("DATETIME"), AttributeKind::DateTime);
        assert_eq!(AttributeKind::from_ngw_name("BIGINT"), AttributeKind::Text);
        assert_eq!(AttributeKind::from_ngw_name(""), AttributeKind::Text);
    }

    #[test]
    fn declared_kind_constrains_shape() {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let line: Geometry<f64> = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);

        assert!(GeometryKind::Point.accepts(&point));
        assert!(!GeometryKind::Point.accepts(&line));
        assert!(!GeometryKind::MultiPoint.accepts(&point));
        assert!(GeometryKind::Unknown.accepts(&line));
        assert!(GeometryKind::LineString.accepts(&Geometry::LineString(LineString::new(vec![]))));
    }

    #[test]
    fn read_full_date_time() {
        let value = json!({"year": 2017, "month": 3, "day": 14, "hour": 15, "min": 9, "sec": 26});
        let dt = read_date_time(&value);
        assert_eq!(
            dt,
            NgwDateTime {
                year: 2017,
                month: 3,
                day: 14,
                hour: 15,
                minute: 9,
                second: 26,
            }
        );
        assert_eq!(dt.date_only().hour, 0);
        assert_eq!(dt.date_only().day, 14);
    }

    #[test]
    fn read_date_time_defaults_missing_parts() {
        let value = json!({"year": 2020, "month": "05", "hour": 1.5});
        let dt = read_date_time(&value);
        assert_eq!(dt.year, 2020);
        assert_eq!(dt.month, 0);
        assert_eq!(dt.day, 0);
        assert_eq!(dt.hour, 0);
    }

    #[test]
    fn read_date_time_from_non_object() {
        assert_eq!(read_date_time(&json!("2020-01-01")), NgwDateTime::default());
    }
}
