//! Crime anniversaries collector — binary entrypoint.
//! Loads settings, queries the enabled sources one after another and writes
//! the merged CSV/JSON files.

use crime_anniversaries::{config::Settings, ingest::providers, pipeline};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact human logs by default; JSON lines when LOG_FORMAT=json.
/// Level comes from RUST_LOG.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crime_anniversaries=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = Settings::load_default()?;
    tracing::info!(
        wikidata = settings.get_wikidata,
        on_this_day = settings.get_on_this_day,
        year_cutoff = settings.year_cutoff,
        output_dir = %settings.output_dir.display(),
        "settings loaded"
    );

    let providers = providers::build_enabled(&settings)?;
    let report = pipeline::run(&settings, &providers).await?;

    match &report.output {
        Some(out) => tracing::info!(
            total = out.records,
            csv = %out.csv.display(),
            json = %out.json.display(),
            "run finished"
        ),
        None => tracing::info!("run finished without output"),
    }
    Ok(())
}
