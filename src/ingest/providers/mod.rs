// src/ingest/providers/mod.rs
pub mod onthisday;
pub mod wikidata;

use anyhow::Result;

use crate::config::Settings;
use crate::ingest::types::SourceProvider;
use onthisday::OnThisDayProvider;
use wikidata::WikidataProvider;

/// HTTP providers for every enabled source, Wikidata first.
pub fn build_enabled(settings: &Settings) -> Result<Vec<Box<dyn SourceProvider>>> {
    let mut providers: Vec<Box<dyn SourceProvider>> = Vec::new();
    if settings.get_wikidata {
        providers.push(Box::new(WikidataProvider::from_settings(settings)?));
    }
    if settings.get_on_this_day {
        providers.push(Box::new(OnThisDayProvider::from_settings(settings)?));
    }
    if providers.is_empty() {
        tracing::warn!("all sources disabled; nothing will be collected");
    }
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    #[test]
    fn respects_enable_flags_and_order() {
        let all = build_enabled(&Settings::default()).unwrap();
        let names: Vec<Source> = all.iter().map(|p| p.source()).collect();
        assert_eq!(names, vec![Source::Wikidata, Source::OnThisDay]);

        let only_feed = Settings {
            get_wikidata: false,
            ..Settings::default()
        };
        let v = build_enabled(&only_feed).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].name(), "OnThisDay");

        let none = Settings {
            get_wikidata: false,
            get_on_this_day: false,
            ..Settings::default()
        };
        assert!(build_enabled(&none).unwrap().is_empty());
    }
}
