// src/load/postgres.rs
use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, QueryBuilder,
};
use std::time::Duration;
use tracing::{debug, warn};

use super::{bind::PgColumn, TableSink};
use crate::read::TabularDataset;
use crate::schema::{
    count_rows_sql, create_table_sql, drop_table_sql, insert_prefix, map_from_arrow,
    rows_per_insert, PgType,
};

/// PostgreSQL-backed sink. Holds a single connection for the whole run.
#[derive(Debug, Clone)]
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TableSink for PgSink {
    /// Drop, create and fill `table` in one transaction; a failure part-way
    /// leaves whatever was there before.
    #[tracing::instrument(level = "debug", skip(self, dataset), fields(rows = dataset.num_rows()))]
    async fn replace_table(&mut self, table: &str, dataset: &TabularDataset) -> Result<u64> {
        let schema = dataset.schema();
        let pg_types: Vec<PgType> = schema
            .fields()
            .iter()
            .map(|f| map_from_arrow(f.data_type()))
            .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(&drop_table_sql(table))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("dropping table {}", table))?;
        sqlx::query(&create_table_sql(table, schema))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("creating table {}", table))?;

        let per_insert = rows_per_insert(pg_types.len());
        let mut written = 0u64;

        if per_insert == 0 {
            if dataset.num_rows() > 0 {
                warn!(
                    table,
                    rows = dataset.num_rows(),
                    "dataset has no columns; created empty table"
                );
            }
        } else {
            let prefix = insert_prefix(table, schema);
            for (batch_idx, batch) in dataset.batches().iter().enumerate() {
                let columns = batch
                    .columns()
                    .iter()
                    .zip(&pg_types)
                    .zip(schema.fields())
                    .map(|((array, pg), field)| {
                        PgColumn::from_array(array, *pg)
                            .with_context(|| format!("column {}", field.name()))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let mut start = 0;
                while start < batch.num_rows() {
                    let end = (start + per_insert).min(batch.num_rows());
                    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(prefix.as_str());
                    qb.push_values(start..end, |mut b, row| {
                        for col in &columns {
                            col.push_bind(row, &mut b);
                        }
                    });
                    let res = qb
                        .build()
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("inserting into table {}", table))?;
                    written += res.rows_affected();
                    start = end;
                }
                debug!(batch = batch_idx, written, "batch inserted");
            }
        }

        tx.commit()
            .await
            .with_context(|| format!("committing table {}", table))?;
        Ok(written)
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar::<_, i64>(&count_rows_sql(table))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("counting rows of {}", table))?;
        Ok(count)
    }
}
