// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod accumulator;
pub mod calendar;
pub mod config;
pub mod export;
pub mod ingest;
pub mod keywords;
pub mod pipeline;
pub mod record;

// ---- Re-exports for stable public API ----
pub use crate::accumulator::{Accumulator, DateGroupMap, SourceStats};
pub use crate::config::Settings;
pub use crate::pipeline::{run, RunReport};
pub use crate::record::{EventRecord, RowOutcome, SkipReason, Source};
