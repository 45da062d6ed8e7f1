// src/verify.rs
use std::fmt;

use crate::config::FileDescriptor;
use crate::load::TableSink;
use crate::read::{count_file_rows, FileFormat};

/// What was found for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Suffix is neither `.parquet` nor `.csv`.
    Skipped,
    /// The source file could not be opened or decoded.
    FileUnreadable(String),
    TableMissing { file_rows: u64, error: String },
    Counted { file_rows: u64, table_rows: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRow {
    pub table: String,
    pub check: Check,
}

impl VerifyRow {
    /// `table_rows - file_rows`, when both sides were counted.
    pub fn delta(&self) -> Option<i64> {
        match self.check {
            Check::Counted {
                file_rows,
                table_rows,
            } => Some(table_rows - file_rows as i64),
            _ => None,
        }
    }

    pub fn is_problem(&self) -> bool {
        match &self.check {
            Check::Skipped => false,
            Check::Counted { .. } => self.delta() != Some(0),
            Check::FileUnreadable(_) | Check::TableMissing { .. } => true,
        }
    }
}

pub fn header() -> String {
    format!(
        "{: <25} {:>15} {:>15} {:>15}\n{:-<73}",
        "Table", "File rows", "Table rows", "Delta", ""
    )
}

impl fmt::Display for VerifyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.check {
            Check::Skipped => write!(
                f,
                "{: <25} {:>47}",
                self.table, "skipped (unknown file type)"
            ),
            Check::FileUnreadable(err) => {
                write!(f, "{: <25} {:>15}   {}", self.table, "unreadable", err)
            }
            Check::TableMissing { file_rows, error } => write!(
                f,
                "{: <25} {:>15} {:>15}   {}",
                self.table, file_rows, "missing", error
            ),
            Check::Counted {
                file_rows,
                table_rows,
            } => write!(
                f,
                "{: <25} {:>15} {:>15} {:>15}",
                self.table,
                file_rows,
                table_rows,
                table_rows - *file_rows as i64
            ),
        }
    }
}

/// Count rows in every source file and its table. Failures on either side
/// are recorded on that descriptor's row; the remaining rows are still checked.
pub async fn compare<S: TableSink>(files: &[FileDescriptor], sink: &mut S) -> Vec<VerifyRow> {
    let mut rows = Vec::with_capacity(files.len());
    for fd in files {
        let check = match FileFormat::from_path(&fd.path) {
            None => Check::Skipped,
            Some(format) => match count_file_rows(&fd.path, format) {
                Err(err) => Check::FileUnreadable(format!("{:#}", err)),
                Ok(file_rows) => match sink.count_rows(&fd.table).await {
                    Ok(table_rows) => Check::Counted {
                        file_rows,
                        table_rows,
                    },
                    Err(err) => Check::TableMissing {
                        file_rows,
                        error: format!("{:#}", err),
                    },
                },
            },
        };
        rows.push(VerifyRow {
            table: fd.table.clone(),
            check,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest;
    use crate::testing::{init_test_logging, write_trips_parquet, write_zones_csv, MemorySink};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_each_table_on_its_own_line() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let zones = write_zones_csv(&dir, 12)?;
        let trips = write_trips_parquet(&dir, 30)?;
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "not tabular")?;

        let mut sink = MemorySink::default();
        ingest(&[FileDescriptor::new(&zones, "taxi_zones")], &mut sink).await?;

        let files = vec![
            FileDescriptor::new(&zones, "taxi_zones"),
            FileDescriptor::new(&notes, "notes"),
            FileDescriptor::new(&trips, "green_trips"),
        ];
        let rows = compare(&files, &mut sink).await;

        assert_eq!(
            rows[0].check,
            Check::Counted {
                file_rows: 12,
                table_rows: 12
            }
        );
        assert!(!rows[0].is_problem());
        assert_eq!(rows[1].check, Check::Skipped);
        assert!(!rows[1].is_problem());
        match &rows[2].check {
            Check::TableMissing { file_rows, error } => {
                assert_eq!(*file_rows, 30);
                assert!(error.contains("green_trips"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(rows[2].is_problem());
        assert!(rows[2].to_string().contains("missing"));
        Ok(())
    }

    #[tokio::test]
    async fn skewed_count_is_a_problem() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let trips = write_trips_parquet(&dir, 30)?;
        let files = vec![FileDescriptor::new(&trips, "green_trips")];
        let mut sink = MemorySink::default();
        ingest(&files, &mut sink).await?;
        sink.count_skew = 2;

        let rows = compare(&files, &mut sink).await;
        assert_eq!(rows[0].delta(), Some(2));
        assert!(rows[0].is_problem());
        assert!(rows[0].to_string().trim_end().ends_with('2'));
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_file_does_not_stop_the_check() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let zones = write_zones_csv(&dir, 5)?;
        let missing = dir.path().join("green_tripdata_2025-12.parquet");
        let files = vec![
            FileDescriptor::new(&missing, "green_trips"),
            FileDescriptor::new(&zones, "taxi_zones"),
        ];
        let mut sink = MemorySink::default();
        ingest(&files[1..], &mut sink).await?;

        let rows = compare(&files, &mut sink).await;
        assert_eq!(rows.len(), 2);
        match &rows[0].check {
            Check::FileUnreadable(err) => assert!(err.contains("green_tripdata_2025-12.parquet")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(rows[0].is_problem());
        assert_eq!(rows[1].delta(), Some(0));
        assert!(!rows[1].is_problem());
        Ok(())
    }
}
