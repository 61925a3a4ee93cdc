//! Turning one feature of an NGW feature collection into a [`Record`].

use std::sync::Arc;

use geo_types::Geometry;
use geozero::ToGeo;
use geozero::wkt::Wkt;
use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::mapping::{AttributeKind, GeometryKind, read_date_time};
use crate::types::{FieldValue, LayerSchema, Record};
use crate::worker::ProtocolWorker;

/// Why a feature was left out of the materialized set.
#[derive(Debug, Error)]
pub(crate) enum RecordSkip {
    #[error("no feature id")]
    MissingId,

    #[error("feature {id}: no WKT geometry")]
    MissingGeometry { id: i64 },

    #[error("feature {id}: invalid WKT geometry: {message}")]
    InvalidGeometry { id: i64, message: String },

    #[error("feature {id}: geometry does not match declared kind {declared}")]
    KindMismatch { id: i64, declared: GeometryKind },

    #[error("feature {id}: no attributes object")]
    MissingAttributes { id: i64 },
}

/// Build one record under `schema`.
///
/// The geometry must parse as WKT and have the declared kind. Attribute keys
/// not in the schema are ignored; JSON `null` leaves the field unset.
pub(crate) fn build_record(
    worker: &dyn ProtocolWorker,
    schema: &Arc<LayerSchema>,
    feature: &Value,
) -> Result<Record, RecordSkip> {
    let id = worker.feature_id(feature).ok_or(RecordSkip::MissingId)?;

    let wkt = worker
        .feature_geometry(feature)
        .ok_or(RecordSkip::MissingGeometry { id })?;
    let geometry = parse_geometry(wkt, schema.geometry_kind).map_err(|skip| match skip {
        GeometryParseError::Wkt(message) => RecordSkip::InvalidGeometry { id, message },
        GeometryParseError::KindMismatch => RecordSkip::KindMismatch {
            id,
            declared: schema.geometry_kind,
        },
    })?;

    let attributes = worker
        .feature_attributes(feature)
        .ok_or(RecordSkip::MissingAttributes { id })?;

    let mut values: Vec<Option<FieldValue>> = vec![None; schema.fields.len()];
    for (key, value) in attributes {
        let Some(idx) = schema.field_index(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let kind = schema.fields[idx].kind;
        match coerce_value(kind, value) {
            Some(coerced) => values[idx] = Some(coerced),
            None => debug!("Feature {id}: value {value} of field '{key}' is not a valid {kind}"),
        }
    }

    Ok(Record::new(id, geometry, values, Arc::clone(schema)))
}

#[derive(Debug)]
enum GeometryParseError {
    Wkt(String),
    KindMismatch,
}

fn parse_geometry(text: &str, declared: GeometryKind) -> Result<Geometry<f64>, GeometryParseError> {
    let geometry = Wkt(text)
        .to_geo()
        .map_err(|err| GeometryParseError::Wkt(err.to_string()))?;

    if declared.accepts(&geometry) {
        Ok(geometry)
    } else {
        Err(GeometryParseError::KindMismatch)
    }
}

/// Coerce a non-null JSON value by the field's declared kind.
///
/// Returns `None` (field stays unset) when a numeric field holds something
/// that does not read as a number.
pub(crate) fn coerce_value(kind: AttributeKind, value: &Value) -> Option<FieldValue> {
    match kind {
        AttributeKind::Text => Some(FieldValue::Text(match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })),
        AttributeKind::Integer64 => read_i64(value).map(FieldValue::Integer64),
        AttributeKind::Real => read_f64(value).map(FieldValue::Real),
        AttributeKind::Date => Some(FieldValue::Date(read_date_time(value).date_only())),
        AttributeKind::Time => Some(FieldValue::Time(read_date_time(value))),
        AttributeKind::DateTime => Some(FieldValue::DateTime(read_date_time(value))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn read_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        },
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

fn read_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
        _ => None,
    }
}
