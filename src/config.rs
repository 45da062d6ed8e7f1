// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Connection string used when neither the manifest nor `DATABASE_URL` set one.
pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres:postgres@db:5432/ny_taxi";

/// Env var pointing at an optional YAML manifest.
pub const MANIFEST_ENV: &str = "TAXILOAD_MANIFEST";

/// One file to load and the table it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub table: String,
}

impl FileDescriptor {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
        }
    }
}

/// The built-in file list.
pub fn default_files() -> Vec<FileDescriptor> {
    vec![
        FileDescriptor::new("data/green_tripdata_2025-11.parquet", "green_trips"),
        FileDescriptor::new("data/taxi_zone_lookup.csv", "taxi_zones"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub database_url: String,
    pub files: Vec<FileDescriptor>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            files: default_files(),
        }
    }
}

/// On-disk shape of the manifest. Every key is optional; present keys
/// replace the defaults wholesale.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    database_url: Option<String>,
    files: Option<Vec<FileDescriptor>>,
}

impl IngestConfig {
    /// Defaults, then the manifest named by `TAXILOAD_MANIFEST`, then `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(manifest) = env::var(MANIFEST_ENV) {
            cfg.apply_manifest_file(Path::new(&manifest))?;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        Ok(cfg)
    }

    pub fn apply_manifest_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        self.apply_manifest_str(&text)
            .with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn apply_manifest_str(&mut self, yaml: &str) -> Result<()> {
        let manifest: Manifest = serde_yaml::from_str(yaml)?;
        if let Some(url) = manifest.database_url {
            self.database_url = url;
        }
        if let Some(files) = manifest.files {
            self.files = files;
        }
        Ok(())
    }

    /// `host:port/db` part of the connection string, safe to log.
    pub fn database_display(&self) -> &str {
        let url = self.database_url.as_str();
        match url.rsplit_once('@') {
            Some((_, host)) => host,
            None => url.split_once("://").map_or(url, |(_, rest)| rest),
        }
    }
}
