// src/schema/mod.rs
pub mod postgres;

pub use postgres::{
    count_rows_sql, create_table_sql, drop_table_sql, insert_prefix, map_from_arrow, quote_ident,
    rows_per_insert, PgType, MAX_BIND_PARAMS,
};
