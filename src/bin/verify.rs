// src/bin/verify.rs

use anyhow::{bail, Result};
use taxiload::{config::IngestConfig, load::PgSink, verify};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = IngestConfig::from_env()?;
    let mut sink = PgSink::connect(&config.database_url).await?;

    let rows = verify::compare(&config.files, &mut sink).await;

    println!("\n{}", verify::header());
    for row in &rows {
        println!("{}", row);
    }

    let problems = rows.iter().filter(|r| r.is_problem()).count();
    if problems > 0 {
        bail!("{} table(s) do not match their source files", problems);
    }
    Ok(())
}
