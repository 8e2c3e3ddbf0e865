// src/ingest/types.rs
use anyhow::Result;

use crate::record::{RowOutcome, Source};

/// An upstream that yields one outcome per raw row it saw.
///
/// `Err` means the source as a whole could not be reached; row-level problems
/// are reported as `RowOutcome::Skipped` instead.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<RowOutcome>>;
    fn source(&self) -> Source;
    fn name(&self) -> &'static str {
        self.source().as_str()
    }
}
