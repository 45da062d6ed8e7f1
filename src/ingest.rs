// src/ingest.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::FileDescriptor;
use crate::load::TableSink;
use crate::read::{self, FileFormat};

/// Outcome of one loaded descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub table: String,
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_in_table: i64,
}

impl LoadReport {
    /// The table holds as many rows as the file did.
    pub fn verified(&self) -> bool {
        u64::try_from(self.rows_in_table).is_ok_and(|n| n == self.rows_read)
    }
}

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub loaded: Vec<LoadReport>,
    pub skipped: Vec<PathBuf>,
}

/// Load every descriptor in order, replacing its table.
///
/// Unsupported suffixes are skipped with a warning. Any read or database
/// error stops the run; descriptors after it are not touched.
pub async fn ingest<S: TableSink>(files: &[FileDescriptor], sink: &mut S) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    info!("{}", "-".repeat(50));

    for fd in files {
        match ingest_one(fd, sink).await? {
            Some(report) => summary.loaded.push(report),
            None => summary.skipped.push(fd.path.clone()),
        }
        info!("{}", "-".repeat(50));
    }

    Ok(summary)
}

async fn ingest_one<S: TableSink>(
    fd: &FileDescriptor,
    sink: &mut S,
) -> Result<Option<LoadReport>> {
    info!("Loading: {}", fd.path.display());

    let Some(format) = FileFormat::from_path(&fd.path) else {
        warn!(path = %fd.path.display(), "  Skipping unknown file type");
        return Ok(None);
    };

    // ─── load the whole file off the async thread ───────────────────
    let path = fd.path.clone();
    let dataset = tokio::task::spawn_blocking(move || read::read_dataset(&path, format)).await??;
    let rows_read = dataset.num_rows() as u64;
    info!(
        format = format.name(),
        "  Read {} rows from {}",
        with_commas(rows_read as i64),
        file_name(&fd.path)
    );

    // ─── replace the table ──────────────────────────────────────────
    let rows_written = sink
        .replace_table(&fd.table, &dataset)
        .await
        .with_context(|| format!("loading {} into table {}", fd.path.display(), fd.table))?;
    drop(dataset);
    info!(
        "  Loaded {} rows into table '{}'",
        with_commas(rows_written as i64),
        fd.table
    );

    // ─── verify ─────────────────────────────────────────────────────
    let rows_in_table = sink.count_rows(&fd.table).await?;
    let report = LoadReport {
        path: fd.path.clone(),
        table: fd.table.clone(),
        rows_read,
        rows_written,
        rows_in_table,
    };
    if report.verified() {
        info!("  Success! Table has {} rows", with_commas(rows_in_table));
    } else {
        warn!(
            table = %fd.table,
            rows_read,
            rows_written,
            rows_in_table,
            "  Row count mismatch after load"
        );
    }

    Ok(Some(report))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 1234567 → "1,234,567"
pub fn with_commas(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
