// src/read/mod.rs
use anyhow::Result;
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use std::path::Path;

pub mod columnar;
pub mod delimited;

/// Rows per RecordBatch handed out by both readers.
pub const BATCH_SIZE: usize = 8192;

/// Input formats recognised by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Parquet,
    Csv,
}

impl FileFormat {
    /// `.parquet` or `.csv`, case-insensitive; anything else is `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Some(FileFormat::Parquet),
            "csv" => Some(FileFormat::Csv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Parquet => "parquet",
            FileFormat::Csv => "csv",
        }
    }
}

/// A whole file held in memory: one schema, any number of batches.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl TabularDataset {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }
}

/// Load the entire file at `path` into memory.
pub fn read_dataset(path: &Path, format: FileFormat) -> Result<TabularDataset> {
    match format {
        FileFormat::Parquet => columnar::read_parquet(path),
        FileFormat::Csv => delimited::read_csv(path),
    }
}

/// Number of data rows in the file. Parquet answers from its footer.
pub fn count_file_rows(path: &Path, format: FileFormat) -> Result<u64> {
    match format {
        FileFormat::Parquet => columnar::parquet_row_count(path),
        FileFormat::Csv => Ok(delimited::read_csv(path)?.num_rows() as u64),
    }
}
