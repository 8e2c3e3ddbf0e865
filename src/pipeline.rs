// src/pipeline.rs
//! Collect from every provider, then export once.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::accumulator::{Accumulator, SourceStats};
use crate::config::Settings;
use crate::export::{self, ExportPaths};
use crate::ingest::{self, types::SourceProvider};
use crate::record::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Exporting,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collecting => "collecting",
            Phase::Exporting => "exporting",
            Phase::Done => "done",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: Vec<(Source, SourceStats)>,
    /// `None` when nothing qualified and no files were written.
    pub output: Option<ExportPaths>,
    pub phase: Phase,
}

impl RunReport {
    pub fn stats_for(&self, source: Source) -> Option<&SourceStats> {
        self.stats.iter().find(|(s, _)| *s == source).map(|(_, st)| st)
    }

    pub fn total_processed(&self) -> usize {
        self.stats.iter().map(|(_, s)| s.processed).sum()
    }
}

fn enter(phase: Phase) -> Phase {
    info!(phase = phase.as_str(), "pipeline phase");
    phase
}

/// Run with a caller-supplied timestamp for the output filenames.
pub async fn run_with_stamp(
    providers: &[Box<dyn SourceProvider>],
    out_dir: &Path,
    stamp: &str,
) -> Result<RunReport> {
    enter(Phase::Collecting);
    let mut acc = Accumulator::new();
    let stats = ingest::collect_all(providers, &mut acc).await;

    enter(Phase::Exporting);
    let output = export::export(acc, out_dir, stamp)?;

    let phase = enter(Phase::Done);
    Ok(RunReport {
        stats,
        output,
        phase,
    })
}

pub async fn run(settings: &Settings, providers: &[Box<dyn SourceProvider>]) -> Result<RunReport> {
    run_with_stamp(providers, &settings.output_dir, &export::timestamp_now()).await
}
