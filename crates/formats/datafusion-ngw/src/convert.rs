//! Conversion of cached NGW layers into Arrow record batches.
//!
//! Column order is the feature id, the attribute fields in schema order, then
//! the geometry. Unset attributes become nulls.

use std::collections::HashSet;
use std::sync::Arc;

use arrow_array::{
    ArrayRef, Date32Array, Float64Array, Int64Array, RecordBatch, StringArray, Time32SecondArray,
    TimestampSecondArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::{NaiveDate, NaiveTime};
use ngw_core::{AttributeKind, FieldValue, Layer, LayerSchema, NgwDateTime, Record};

use crate::error::{NgwFormatError, NgwFormatResult};
use crate::geospatial::{build_geometry_column, geoarrow_type_for};
use crate::options::NgwFormatOptions;

/// Arrow type used for an attribute kind.
#[must_use]
pub fn arrow_type_for(kind: AttributeKind) -> DataType {
    match kind {
        AttributeKind::Text => DataType::Utf8,
        AttributeKind::Integer64 => DataType::Int64,
        AttributeKind::Real => DataType::Float64,
        AttributeKind::Date => DataType::Date32,
        AttributeKind::Time => DataType::Time32(TimeUnit::Second),
        AttributeKind::DateTime => DataType::Timestamp(TimeUnit::Second, None),
    }
}

/// Arrow schema for a layer.
///
/// # Errors
///
/// Returns [`NgwFormatError::DuplicateColumn`] if an attribute shares its
/// name with the fid or geometry column.
pub fn arrow_schema_for(schema: &LayerSchema, options: &NgwFormatOptions) -> NgwFormatResult<SchemaRef> {
    let mut fields = Vec::with_capacity(schema.fields.len() + 2);
    fields.push(Field::new(&options.fid_column_name, DataType::Int64, false));
    for field in &schema.fields {
        fields.push(Field::new(&field.name, arrow_type_for(field.kind), true));
    }
    fields.push(geoarrow_type_for(schema).to_field(&options.geometry_column_name, true));

    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        if !seen.insert(field.name().as_str()) {
            return Err(NgwFormatError::DuplicateColumn {
                layer: schema.name.clone(),
                column: field.name().clone(),
            });
        }
    }

    Ok(Arc::new(Schema::new(fields)))
}

/// Convert a fully cached layer into one record batch.
///
/// # Errors
///
/// Returns [`NgwFormatError::NotCached`] unless the layer's records have been
/// fetched, and any schema or geometry conversion error.
pub fn layer_to_record_batch(layer: &Layer, options: &NgwFormatOptions) -> NgwFormatResult<RecordBatch> {
    let not_cached = || NgwFormatError::NotCached {
        layer: layer.name().to_string(),
    };
    let schema = layer.schema().ok_or_else(not_cached)?;
    let records = layer.cached_records().ok_or_else(not_cached)?;

    records_to_record_batch(schema, records, options)
}

/// Convert `records` into one record batch laid out by `schema`.
///
/// Values are read by field position; a record with fewer fields than
/// `schema` yields nulls for the missing columns.
fn records_to_record_batch(
    schema: &LayerSchema,
    records: &[Record],
    options: &NgwFormatOptions,
) -> NgwFormatResult<RecordBatch> {
    let arrow_schema = arrow_schema_for(schema, options)?;

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(arrow_schema.fields().len());
    columns.push(Arc::new(Int64Array::from_iter_values(
        records.iter().map(Record::id),
    )));
    for (idx, field) in schema.fields.iter().enumerate() {
        let values = records
            .iter()
            .map(|record| record.values().get(idx).and_then(Option::as_ref));
        columns.push(attribute_column(field.kind, values));
    }
    columns.push(build_geometry_column(schema, records)?);

    Ok(RecordBatch::try_new(arrow_schema, columns)?)
}

fn attribute_column<'a>(
    kind: AttributeKind,
    values: impl Iterator<Item = Option<&'a FieldValue>>,
) -> ArrayRef {
    match kind {
        AttributeKind::Text => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_str))
                .collect::<StringArray>(),
        ),
        AttributeKind::Integer64 => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_i64))
                .collect::<Int64Array>(),
        ),
        AttributeKind::Real => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_f64))
                .collect::<Float64Array>(),
        ),
        AttributeKind::Date => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_date_time).and_then(days_since_epoch))
                .collect::<Date32Array>(),
        ),
        AttributeKind::Time => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_date_time).and_then(seconds_of_day))
                .collect::<Time32SecondArray>(),
        ),
        AttributeKind::DateTime => Arc::new(
            values
                .map(|value| value.and_then(FieldValue::as_date_time).and_then(unix_seconds))
                .collect::<TimestampSecondArray>(),
        ),
    }
}

fn naive_date(value: NgwDateTime) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        value.year,
        u32::try_from(value.month).ok()?,
        u32::try_from(value.day).ok()?,
    )
}

fn naive_time(value: NgwDateTime) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(
        u32::try_from(value.hour).ok()?,
        u32::try_from(value.minute).ok()?,
        u32::try_from(value.second).ok()?,
    )
}

/// Calendar dates that do not exist (e.g. all-zero components) become null.
fn days_since_epoch(value: NgwDateTime) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(naive_date(value)?.signed_duration_since(epoch).num_days()).ok()
}

fn seconds_of_day(value: NgwDateTime) -> Option<i32> {
    naive_time(value)?;
    Some(value.hour * 3600 + value.minute * 60 + value.second)
}

fn unix_seconds(value: NgwDateTime) -> Option<i64> {
    let date_time = naive_date(value)?.and_time(naive_time(value)?);
    Some(date_time.and_utc().timestamp())
}
