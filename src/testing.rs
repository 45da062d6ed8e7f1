// src/testing.rs
//! Fixtures shared by the unit tests.

use anyhow::{anyhow, bail, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::load::TableSink;
use crate::read::TabularDataset;

pub(crate) fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,taxiload=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Keeps tables in memory; `count_skew` is added to every count.
#[derive(Default)]
pub(crate) struct MemorySink {
    pub tables: HashMap<String, TabularDataset>,
    pub writes: Vec<String>,
    pub count_skew: i64,
    pub fail_writes: bool,
}

impl TableSink for MemorySink {
    async fn replace_table(&mut self, table: &str, dataset: &TabularDataset) -> Result<u64> {
        if self.fail_writes {
            bail!("permission denied for schema public");
        }
        self.writes.push(table.to_string());
        self.tables.insert(table.to_string(), dataset.clone());
        Ok(dataset.num_rows() as u64)
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64> {
        let ds = self
            .tables
            .get(table)
            .ok_or_else(|| anyhow!("relation \"{}\" does not exist", table))?;
        Ok(ds.num_rows() as i64 + self.count_skew)
    }
}

pub(crate) fn write_zones_csv(dir: &TempDir, rows: usize) -> Result<PathBuf> {
    let path = dir.path().join("taxi_zone_lookup.csv");
    let mut text = String::from("\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"\n");
    for i in 1..=rows {
        text.push_str(&format!("{},\"Queens\",\"Zone {}\",\"Boro Zone\"\n", i, i));
    }
    fs::write(&path, text)?;
    Ok(path)
}

pub(crate) fn write_trips_parquet(dir: &TempDir, rows: i64) -> Result<PathBuf> {
    let path = dir.path().join("green_tripdata_2025-11.parquet");
    let schema = Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int64, true),
        Field::new("fare_amount", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(0..rows)) as ArrayRef,
            Arc::new(Float64Array::from_iter_values((0..rows).map(|i| i as f64 * 1.25)))
                as ArrayRef,
        ],
    )?;
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(path)
}
