// src/read/delimited.rs
use anyhow::{bail, Context, Result};
use arrow::csv::{reader::Format, ReaderBuilder};
use arrow::datatypes::{Field, Schema};
use regex::Regex;
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
    sync::Arc,
};
use tracing::debug;

use super::{TabularDataset, BATCH_SIZE};

/// Field values read as null: the empty field plus the usual dataframe NA
/// markers (`N/A`, `NA`, `NULL`, `NaN`, `None`, ...).
const NA_VALUES: &str = r"^(|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$";

/// Read a headed, comma-separated file. Column types are inferred from
/// every record; empty fields and NA markers are nulls.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_csv(path: &Path) -> Result<TabularDataset> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open CSV '{}'", path.display()))?;

    let format = Format::default()
        .with_header(true)
        .with_null_regex(Regex::new(NA_VALUES)?);
    let (inferred, records) = format
        .infer_schema(&mut file, None)
        .with_context(|| format!("Failed to infer schema of '{}'", path.display()))?;
    if inferred.fields().is_empty() {
        bail!("CSV '{}' has no header row", path.display());
    }
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(normalize_headers(&inferred));
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(BATCH_SIZE)
        .build(file)
        .with_context(|| format!("Failed to build CSV reader for '{}'", path.display()))?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("CSV parse error in '{}'", path.display()))?;

    let dataset = TabularDataset::new(schema, batches);
    debug!(
        rows = dataset.num_rows(),
        inferred_from = records,
        columns = dataset.num_columns(),
        "decoded csv"
    );
    Ok(dataset)
}

/// Give blank headers a positional name (`Unnamed: 3`) and suffix repeats
/// (`fare`, `fare.1`, `fare.2`) so every column name is unique.
fn normalize_headers(schema: &Schema) -> Schema {
    let mut taken: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let base = if field.name().trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                field.name().clone()
            };

            let mut name = base.clone();
            while taken.contains(&name) {
                let n = next_suffix.entry(base.clone()).or_insert(1);
                name = format!("{}.{}", base, n);
                *n += 1;
            }
            taken.insert(name.clone());
            field.as_ref().clone().with_name(name)
        })
        .collect();

    Schema::new_with_metadata(fields, schema.metadata().clone())
}
