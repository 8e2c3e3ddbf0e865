// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;

use crime_anniversaries::ingest::providers::onthisday::{FeedRules, OnThisDayProvider};
use crime_anniversaries::ingest::providers::wikidata::WikidataProvider;
use crime_anniversaries::keywords::CrimeMatcher;

pub const CUTOFF: i32 = 1900;

pub fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|e| panic!("missing tests/fixtures/{name}: {e}"))
}

pub fn wikidata_provider() -> WikidataProvider {
    WikidataProvider::from_fixture_str(&fixture("wikidata_sparql.json"), CUTOFF)
}

pub fn feed_rules() -> FeedRules {
    FeedRules {
        matcher: CrimeMatcher::default(),
        year_cutoff: CUTOFF,
        max_pages: 5,
    }
}

/// Three days have feeds; the other 363 behave like failed requests.
pub fn onthisday_provider() -> OnThisDayProvider {
    let mut days = HashMap::new();
    days.insert("04/19".to_string(), fixture("onthisday_04_19.json"));
    days.insert("02/29".to_string(), fixture("onthisday_02_29.json"));
    days.insert("12/01".to_string(), fixture("onthisday_12_01.json"));
    OnThisDayProvider::from_fixtures(days, feed_rules())
}
