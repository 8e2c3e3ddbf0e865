// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::accumulator::{Accumulator, SourceStats};
use crate::ingest::types::SourceProvider;
use crate::record::{RowOutcome, Source};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("crime_rows_seen_total", "Raw rows/events seen per source.");
        describe_counter!(
            "crime_records_kept_total",
            "Rows normalized into event records."
        );
        describe_counter!(
            "crime_rows_skipped_total",
            "Rows discarded during normalization, by reason."
        );
        describe_counter!(
            "crime_provider_errors_total",
            "Provider fetch/parse errors (whole source or single day)."
        );
        describe_histogram!("crime_fetch_ms", "Provider fetch time in milliseconds.");
        describe_counter!(
            "crime_export_records_total",
            "Records written to the tabular export."
        );
    });
}

/// Record per-row telemetry for one source's outcomes.
pub(crate) fn record_outcome_metrics(source: Source, outcomes: &[RowOutcome]) {
    let label = source.as_str();
    counter!("crime_rows_seen_total", "source" => label).increment(outcomes.len() as u64);
    for o in outcomes {
        match o {
            RowOutcome::Accepted(_) => {
                counter!("crime_records_kept_total", "source" => label).increment(1);
            }
            RowOutcome::Skipped(reason) => {
                counter!(
                    "crime_rows_skipped_total",
                    "source" => label,
                    "reason" => reason.as_str()
                )
                .increment(1);
            }
        }
    }
}

/// Run every provider once, in order, folding their rows into `acc`.
/// A failing provider is logged and contributes nothing.
pub async fn collect_all(
    providers: &[Box<dyn SourceProvider>],
    acc: &mut Accumulator,
) -> Vec<(Source, SourceStats)> {
    ensure_metrics_described();

    let mut out = Vec::with_capacity(providers.len());
    for p in providers {
        let source = p.source();
        let stats = match p.fetch_rows().await {
            Ok(rows) => {
                record_outcome_metrics(source, &rows);
                acc.absorb(source, rows)
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("crime_provider_errors_total", "source" => source.as_str()).increment(1);
                SourceStats {
                    fetch_failed: true,
                    ..SourceStats::default()
                }
            }
        };
        out.push((source, stats));
    }
    out
}
