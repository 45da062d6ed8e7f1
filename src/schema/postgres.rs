// src/schema/postgres.rs

use arrow::datatypes::{DataType, Schema, TimeUnit};
use std::sync::Arc;

/// Upper bound on bind parameters in one PostgreSQL statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Column types a loaded table can have. Every column is nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Text,
    Bytea,
    Date,
    Time,
    Timestamp,
    TimestampTz,
}

impl PgType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            PgType::Boolean => "BOOLEAN",
            PgType::SmallInt => "SMALLINT",
            PgType::Integer => "INTEGER",
            PgType::BigInt => "BIGINT",
            PgType::Real => "REAL",
            PgType::Double => "DOUBLE PRECISION",
            PgType::Text => "TEXT",
            PgType::Bytea => "BYTEA",
            PgType::Date => "DATE",
            PgType::Time => "TIME",
            PgType::Timestamp => "TIMESTAMP",
            PgType::TimestampTz => "TIMESTAMPTZ",
        }
    }

    /// The Arrow type a column is cast to before its values are bound.
    pub fn arrow_type(&self) -> DataType {
        match self {
            PgType::Boolean => DataType::Boolean,
            PgType::SmallInt => DataType::Int16,
            PgType::Integer => DataType::Int32,
            PgType::BigInt => DataType::Int64,
            PgType::Real => DataType::Float32,
            PgType::Double => DataType::Float64,
            PgType::Text => DataType::Utf8,
            PgType::Bytea => DataType::Binary,
            PgType::Date => DataType::Date32,
            PgType::Time => DataType::Time64(TimeUnit::Microsecond),
            PgType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            PgType::TimestampTz => {
                DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from("+00:00")))
            }
        }
    }
}

/// Map an Arrow DataType onto a PostgreSQL column type.
///
/// Covers:
/// - Boolean                                  → BOOLEAN
/// - Int8, Int16, UInt8                       → SMALLINT
/// - Int32, UInt16                            → INTEGER
/// - Int64, UInt32, UInt64                    → BIGINT
/// - Float16, Float32                         → REAL
/// - Float64, Decimal*                        → DOUBLE PRECISION
/// - Utf8, LargeUtf8, Utf8View, Null          → TEXT
/// - Binary, LargeBinary, FixedSizeBinary, BinaryView → BYTEA
/// - Date32, Date64                           → DATE
/// - Time32, Time64                           → TIME
/// - Timestamp without zone                   → TIMESTAMP
/// - Timestamp with zone                      → TIMESTAMPTZ
/// - Dictionary                               → mapping of its value type
/// - fallback                                 → TEXT
pub fn map_from_arrow(dt: &DataType) -> PgType {
    match dt {
        DataType::Boolean => PgType::Boolean,
        DataType::Int8 | DataType::Int16 | DataType::UInt8 => PgType::SmallInt,
        DataType::Int32 | DataType::UInt16 => PgType::Integer,
        DataType::Int64 | DataType::UInt32 | DataType::UInt64 => PgType::BigInt,
        DataType::Float16 | DataType::Float32 => PgType::Real,
        DataType::Float64 | DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => {
            PgType::Double
        }
        DataType::Binary
        | DataType::LargeBinary
        | DataType::FixedSizeBinary(_)
        | DataType::BinaryView => PgType::Bytea,
        DataType::Date32 | DataType::Date64 => PgType::Date,
        DataType::Time32(_) | DataType::Time64(_) => PgType::Time,
        DataType::Timestamp(_, None) => PgType::Timestamp,
        DataType::Timestamp(_, Some(_)) => PgType::TimestampTz,
        DataType::Dictionary(_, value) => map_from_arrow(value),
        // Utf8 variants, Null, and anything nested or exotic
        _ => PgType::Text,
    }
}

/// Double-quote an identifier so its exact spelling and case survive.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table_sql(table: &str, schema: &Schema) -> String {
    let cols: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| {
            format!(
                "{} {}",
                quote_ident(f.name()),
                map_from_arrow(f.data_type()).sql_name()
            )
        })
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), cols.join(", "))
}

/// `INSERT INTO "t" ("a", "b") `; the VALUES list is appended by the caller.
pub fn insert_prefix(table: &str, schema: &Schema) -> String {
    let cols: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| quote_ident(f.name()))
        .collect();
    format!("INSERT INTO {} ({}) ", quote_ident(table), cols.join(", "))
}

pub fn count_rows_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// How many rows fit in one multi-row INSERT without exceeding the bind limit.
pub fn rows_per_insert(num_columns: usize) -> usize {
    if num_columns == 0 {
        return 0;
    }
    (MAX_BIND_PARAMS / num_columns).max(1)
}
