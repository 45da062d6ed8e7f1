// src/load/mod.rs
use anyhow::Result;

use crate::read::TabularDataset;

pub mod bind;
pub mod postgres;

pub use postgres::PgSink;

/// Where datasets end up. Implementations replace, never append.
#[allow(async_fn_in_trait)]
pub trait TableSink {
    /// Drop `table` if it exists, recreate it from the dataset's schema and
    /// insert every row. Returns the number of rows written.
    async fn replace_table(&mut self, table: &str, dataset: &TabularDataset) -> Result<u64>;

    /// `SELECT COUNT(*)` on `table`.
    async fn count_rows(&mut self, table: &str) -> Result<i64>;
}
