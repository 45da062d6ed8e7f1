use anyhow::Result;
use taxiload::{config::IngestConfig, ingest::ingest, load::PgSink};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) env + logging ────────────────────────────────────────────
    dotenv::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let config = IngestConfig::from_env()?;
    info!("PostgreSQL: {}", config.database_display());

    // ─── 3) connect ──────────────────────────────────────────────────
    let mut sink = PgSink::connect(&config.database_url).await?;

    // ─── 4) load every file, one at a time ───────────────────────────
    let summary = ingest(&config.files, &mut sink).await?;

    if summary.skipped.is_empty() {
        info!("All files loaded successfully!");
    } else {
        warn!(
            loaded = summary.loaded.len(),
            skipped = summary.skipped.len(),
            "finished with skipped files"
        );
    }
    Ok(())
}
