// src/load/bind.rs
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{
        Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Float32Array, Float64Array,
        Int16Array, Int32Array, Int64Array, StringArray,
    },
    compute::{cast_with_options, CastOptions},
    datatypes::{
        DataType, Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
        Time64MicrosecondType, TimestampMicrosecondType,
    },
    temporal_conversions::{date32_to_datetime, time64us_to_time, timestamp_us_to_datetime},
    util::display::{ArrayFormatter, FormatOptions},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{query_builder::Separated, Postgres};
use std::sync::Arc;

use crate::schema::PgType;

/// One column of a batch, converted to the Rust type its PostgreSQL
/// column binds from.
#[derive(Debug)]
pub enum PgColumn {
    Bool(BooleanArray),
    Int2(Int16Array),
    Int4(Int32Array),
    Int8(Int64Array),
    Float4(Float32Array),
    Float8(Float64Array),
    Text(StringArray),
    Bytea(BinaryArray),
    Date(Vec<Option<NaiveDate>>),
    Time(Vec<Option<NaiveTime>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
    TimestampTz(Vec<Option<DateTime<Utc>>>),
}

impl PgColumn {
    /// Convert `array` so its values can be bound to a `pg` column.
    /// Lossy narrowing (e.g. UInt64 above i64::MAX) is an error, not a null.
    pub fn from_array(array: &ArrayRef, pg: PgType) -> Result<Self> {
        let normalized = normalize(array, pg)?;
        let col = match pg {
            PgType::Boolean => {
                PgColumn::Bool(normalized.as_boolean_opt().cloned().context("boolean")?)
            }
            PgType::SmallInt => PgColumn::Int2(
                normalized.as_primitive_opt::<Int16Type>().cloned().context("int16")?,
            ),
            PgType::Integer => PgColumn::Int4(
                normalized.as_primitive_opt::<Int32Type>().cloned().context("int32")?,
            ),
            PgType::BigInt => PgColumn::Int8(
                normalized.as_primitive_opt::<Int64Type>().cloned().context("int64")?,
            ),
            // NaN loads as NULL
            PgType::Real => {
                let floats = normalized.as_primitive_opt::<Float32Type>().context("float32")?;
                PgColumn::Float4(floats.iter().map(|v| v.filter(|x| !x.is_nan())).collect())
            }
            PgType::Double => {
                let floats = normalized.as_primitive_opt::<Float64Type>().context("float64")?;
                PgColumn::Float8(floats.iter().map(|v| v.filter(|x| !x.is_nan())).collect())
            }
            PgType::Text => {
                PgColumn::Text(normalized.as_string_opt::<i32>().cloned().context("utf8")?)
            }
            PgType::Bytea => {
                PgColumn::Bytea(normalized.as_binary_opt::<i32>().cloned().context("binary")?)
            }
            PgType::Date => {
                let days = normalized.as_primitive_opt::<Date32Type>().context("date32")?;
                PgColumn::Date(convert(
                    days.iter(),
                    |d| date32_to_datetime(d).map(|dt| dt.date()),
                    "date",
                )?)
            }
            PgType::Time => {
                let us = normalized
                    .as_primitive_opt::<Time64MicrosecondType>()
                    .context("time64")?;
                PgColumn::Time(convert(us.iter(), time64us_to_time, "time")?)
            }
            PgType::Timestamp => {
                let us = normalized
                    .as_primitive_opt::<TimestampMicrosecondType>()
                    .context("timestamp")?;
                PgColumn::Timestamp(convert(us.iter(), timestamp_us_to_datetime, "timestamp")?)
            }
            PgType::TimestampTz => {
                let us = normalized
                    .as_primitive_opt::<TimestampMicrosecondType>()
                    .context("timestamptz")?;
                PgColumn::TimestampTz(convert(
                    us.iter(),
                    |v| timestamp_us_to_datetime(v).map(|dt| dt.and_utc()),
                    "timestamptz",
                )?)
            }
        };
        Ok(col)
    }

    /// Bind the value at `row` as the next parameter of the VALUES tuple.
    pub fn push_bind<'qb, 'args>(
        &self,
        row: usize,
        b: &mut Separated<'qb, 'args, Postgres, &'static str>,
    ) where
        'args: 'qb,
    {
        match self {
            PgColumn::Bool(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Int2(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Int4(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Int8(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Float4(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Float8(a) => b.push_bind(a.is_valid(row).then(|| a.value(row))),
            PgColumn::Text(a) => b.push_bind(a.is_valid(row).then(|| a.value(row).to_string())),
            PgColumn::Bytea(a) => b.push_bind(a.is_valid(row).then(|| a.value(row).to_vec())),
            PgColumn::Date(v) => b.push_bind(v[row]),
            PgColumn::Time(v) => b.push_bind(v[row]),
            PgColumn::Timestamp(v) => b.push_bind(v[row]),
            PgColumn::TimestampTz(v) => b.push_bind(v[row]),
        };
    }
}

/// Cast `array` to the Arrow type `pg` binds from. Non-text values headed
/// for a TEXT column (lists, structs, intervals, ...) are rendered with
/// Arrow's display formatter instead.
fn normalize(array: &ArrayRef, pg: PgType) -> Result<ArrayRef> {
    if pg == PgType::Text && !is_text_like(array.data_type()) {
        return format_as_text(array);
    }
    let target = pg.arrow_type();
    if array.data_type() == &target {
        return Ok(array.clone());
    }
    let opts = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, &target, &opts)
        .with_context(|| format!("casting {} to {}", array.data_type(), pg.sql_name()))
}

fn is_text_like(dt: &DataType) -> bool {
    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Null => true,
        DataType::Dictionary(_, value) => is_text_like(value),
        _ => false,
    }
}

fn format_as_text(array: &ArrayRef) -> Result<ArrayRef> {
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())
        .with_context(|| format!("formatting {} as text", array.data_type()))?;
    let nulls = array.logical_nulls();
    let values: StringArray = (0..array.len())
        .map(|i| match &nulls {
            Some(n) if n.is_null(i) => None,
            _ => Some(formatter.value(i).to_string()),
        })
        .collect();
    Ok(Arc::new(values))
}

fn convert<V, T, I, F>(values: I, f: F, what: &str) -> Result<Vec<Option<T>>>
where
    V: Copy + std::fmt::Display,
    I: Iterator<Item = Option<V>>,
    F: Fn(V) -> Option<T>,
{
    values
        .map(|v| match v {
            None => Ok(None),
            Some(raw) => f(raw)
                .map(Some)
                .ok_or_else(|| anyhow!("{} value {} is out of range", what, raw)),
        })
        .collect()
}
