// src/record.rs
//! Canonical event record shared by both sources, plus per-row outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    Wikidata,
    OnThisDay,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Wikidata => "Wikidata",
            Source::OnThisDay => "OnThisDay",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dated, crime-related observation.
///
/// `month` / `day` are zero-padded ("04", "19"); `latitude` / `longitude` keep the
/// upstream numeric text verbatim or stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub source: Source,
    pub month: String,
    pub day: String,
    pub year_of_event: i32,
    pub event: String,
    pub title: String,
    pub description: String,
    pub crime_type: String,
    pub country: String,
    pub url: String,
    pub latitude: String,
    pub longitude: String,
    pub extract: String,
    pub related_topics: String,
    pub topic_page_urls: String,
}

/// Column order of the tabular export.
pub const COLUMNS: [&str; 15] = [
    "source",
    "month",
    "day",
    "year_of_event",
    "country",
    "event",
    "title",
    "description",
    "crime_type",
    "url",
    "latitude",
    "longitude",
    "extract",
    "related_topics",
    "topic_page_urls",
];

impl EventRecord {
    /// Cells in `COLUMNS` order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.source.as_str().to_string(),
            self.month.clone(),
            self.day.clone(),
            self.year_of_event.to_string(),
            self.country.clone(),
            self.event.clone(),
            self.title.clone(),
            self.description.clone(),
            self.crime_type.clone(),
            self.url.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.extract.clone(),
            self.related_topics.clone(),
            self.topic_page_urls.clone(),
        ]
    }

    /// Body stored under the event text in the date-grouped export.
    pub fn payload(&self) -> EventPayload {
        EventPayload {
            year_of_event: self.year_of_event,
            event: self.event.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            crime_type: self.crime_type.clone(),
            country: self.country.clone(),
            url: self.url.clone(),
            extract: self.extract.clone(),
            related_topics: self.related_topics.clone(),
            topic_page_urls: self.topic_page_urls.clone(),
        }
    }
}

/// Record fields minus the positional ones (`source`, `month`, `day`, coordinates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub year_of_event: i32,
    pub event: String,
    pub title: String,
    pub description: String,
    pub crime_type: String,
    pub country: String,
    pub url: String,
    pub extract: String,
    pub related_topics: String,
    pub topic_page_urls: String,
}

/// Why a raw row did not become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    MissingDate,
    InvalidDate,
    UnresolvedLabel,
    BeforeCutoff,
    MissingYear,
    NoKeyword,
    NoPages,
    MalformedEvent,
}

impl SkipReason {
    /// Stable label for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingDate => "missing_date",
            SkipReason::InvalidDate => "invalid_date",
            SkipReason::UnresolvedLabel => "unresolved_label",
            SkipReason::BeforeCutoff => "before_cutoff",
            SkipReason::MissingYear => "missing_year",
            SkipReason::NoKeyword => "no_keyword",
            SkipReason::NoPages => "no_pages",
            SkipReason::MalformedEvent => "malformed_event",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of normalizing a single upstream row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(EventRecord),
    Skipped(SkipReason),
}
