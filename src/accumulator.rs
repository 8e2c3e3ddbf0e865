// src/accumulator.rs
//! Collection-phase state: the flat record list and the per-date grouping,
//! always appended together so they never drift apart.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::calendar::{self, MonthDay};
use crate::record::{EventPayload, EventRecord, RowOutcome, SkipReason, Source};

/// One `{event_text: payload}` entry under a date label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateEntry {
    pub event: String,
    pub payload: EventPayload,
}

impl Serialize for DateEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.event, &self.payload)?;
        map.end()
    }
}

/// Date label ("April 19") -> entries in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateGroupMap {
    groups: HashMap<String, Vec<DateEntry>>,
}

impl DateGroupMap {
    pub fn push(&mut self, label: String, entry: DateEntry) {
        self.groups.entry(label).or_default().push(entry);
    }

    pub fn get(&self, label: &str) -> Option<&[DateEntry]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of entries across all labels.
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Groups in chronological (month, day) order, parsed from the labels
    /// against the leap reference year. Unparsable labels go last, by name.
    pub fn sorted(&self) -> Vec<(&str, &[DateEntry])> {
        let mut out: Vec<(Option<MonthDay>, &str, &[DateEntry])> = self
            .groups
            .iter()
            .map(|(k, v)| (calendar::parse_label(k), k.as_str(), v.as_slice()))
            .collect();
        out.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(b.1)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.1.cmp(b.1),
        });
        out.into_iter().map(|(_, k, v)| (k, v)).collect()
    }
}

/// Serializes as an object whose keys are in chronological order.
impl Serialize for DateGroupMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted = self.sorted();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (label, entries) in sorted {
            map.serialize_entry(label, entries)?;
        }
        map.end()
    }
}

/// Per-source tally of what happened to the raw rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub processed: usize,
    pub skipped: usize,
    pub by_reason: BTreeMap<SkipReason, usize>,
    pub fetch_failed: bool,
}

impl SourceStats {
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }
}

/// Owned by the pipeline while collecting; handed to the exporter afterwards.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    records: Vec<EventRecord>,
    by_date: DateGroupMap,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record to both collections. Returns `false` (and stores
    /// nothing) if the record's month/day do not form a calendar date.
    pub fn accept(&mut self, record: EventRecord) -> bool {
        let Some(label) = calendar::label_from_parts(&record.month, &record.day) else {
            warn!(
                source = %record.source,
                month = %record.month,
                day = %record.day,
                "record with invalid month/day dropped"
            );
            return false;
        };
        let entry = DateEntry {
            event: record.event.clone(),
            payload: record.payload(),
        };
        self.records.push(record);
        self.by_date.push(label, entry);
        true
    }

    /// Fold a batch of row outcomes from one source into the collections.
    pub fn absorb(&mut self, source: Source, outcomes: Vec<RowOutcome>) -> SourceStats {
        let mut stats = SourceStats::default();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Accepted(rec) => {
                    if self.accept(rec) {
                        stats.processed += 1;
                    } else {
                        stats.skipped += 1;
                        *stats.by_reason.entry(SkipReason::InvalidDate).or_default() += 1;
                    }
                }
                RowOutcome::Skipped(reason) => {
                    stats.skipped += 1;
                    *stats.by_reason.entry(reason).or_default() += 1;
                }
            }
        }
        info!(
            source = %source,
            processed = stats.processed,
            skipped = stats.skipped,
            "source processing complete"
        );
        stats
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn by_date(&self) -> &DateGroupMap {
        &self.by_date
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_parts(self) -> (Vec<EventRecord>, DateGroupMap) {
        (self.records, self.by_date)
    }
}
