// src/read/columnar.rs
use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{fs::File, path::Path};
use tracing::debug;

use super::{TabularDataset, BATCH_SIZE};

/// Read every row group of a Parquet file, keeping the schema it embeds.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_parquet(path: &Path) -> Result<TabularDataset> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Parquet '{}'", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read Parquet footer of '{}'", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(BATCH_SIZE)
        .build()
        .with_context(|| format!("Failed to build Parquet reader for '{}'", path.display()))?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to decode Parquet '{}'", path.display()))?;

    let dataset = TabularDataset::new(schema, batches);
    debug!(
        rows = dataset.num_rows(),
        columns = dataset.num_columns(),
        batches = dataset.batches().len(),
        "decoded parquet"
    );
    Ok(dataset)
}

/// Row count from the footer metadata, without decoding any pages.
pub fn parquet_row_count(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Parquet '{}'", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("Failed to read Parquet '{}'", path.display()))?;
    Ok(reader.metadata().file_metadata().num_rows() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use parquet::file::properties::WriterProperties;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn trips_batch(start: i64, n: i64) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("VendorID", DataType::Int64, true),
            Field::new(
                "lpep_pickup_datetime",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("trip_distance", DataType::Float64, true),
            Field::new("store_and_fwd_flag", DataType::Utf8, true),
        ]));
        let ids: Vec<i64> = (start..start + n).collect();
        let ts: Vec<i64> = ids
            .iter()
            .map(|i| 1_761_955_200_000_000 + i * 60_000_000)
            .collect();
        let dist: Vec<f64> = ids.iter().map(|i| *i as f64 * 0.5).collect();
        let flags: Vec<Option<&str>> = ids
            .iter()
            .map(|i| if i % 3 == 0 { None } else { Some("N") })
            .collect();
        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)) as ArrayRef,
                Arc::new(TimestampMicrosecondArray::from(ts)) as ArrayRef,
                Arc::new(Float64Array::from(dist)) as ArrayRef,
                Arc::new(StringArray::from(flags)) as ArrayRef,
            ],
        )?)
    }

    fn write_parquet(path: &Path, batches: &[RecordBatch], row_group: usize) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_max_row_group_size(row_group)
            .build();
        let mut writer = ArrowWriter::try_new(file, batches[0].schema(), Some(props))?;
        for b in batches {
            writer.write(b)?;
        }
        writer.close()?;
        Ok(())
    }

    #[test]
    fn reads_all_row_groups() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("green_tripdata_2025-11.parquet");
        write_parquet(&path, &[trips_batch(0, 700)?, trips_batch(700, 300)?], 250)?;

        let ds = read_parquet(&path)?;
        assert_eq!(ds.num_rows(), 1_000);
        assert_eq!(
            ds.column_names(),
            vec![
                "VendorID",
                "lpep_pickup_datetime",
                "trip_distance",
                "store_and_fwd_flag"
            ]
        );
        assert_eq!(
            ds.schema().field(1).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, None)
        );
        assert_eq!(parquet_row_count(&path)?, 1_000);
        Ok(())
    }

    #[test]
    fn empty_parquet_keeps_schema() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.parquet");
        write_parquet(&path, &[trips_batch(0, 0)?], 1024)?;

        let ds = read_parquet(&path)?;
        assert_eq!(ds.num_rows(), 0);
        assert_eq!(ds.num_columns(), 4);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_parquet(Path::new("does/not/exist.parquet")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.parquet"));
    }

    #[test]
    fn garbage_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.parquet");
        std::fs::write(&path, b"definitely not parquet")?;
        assert!(read_parquet(&path).is_err());
        assert!(parquet_row_count(&path).is_err());
        Ok(())
    }
}
