// src/ingest/providers/wikidata.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use metrics::histogram;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::calendar::MonthDay;
use crate::config::Settings;
use crate::ingest::types::SourceProvider;
use crate::record::{EventRecord, RowOutcome, SkipReason, Source};

/// Wikidata classes queried via `wdt:P31`.
pub const CRIME_CATEGORIES: [&str; 13] = [
    "Q475026",  // war crime
    "Q132821",  // murder
    "Q170024",  // assassination
    "Q47293",   // terrorism
    "Q1683310", // mass murder
    "Q43344",   // hijacking
    "Q423",     // arson
    "Q6498836", // hate crime
    "Q18592",   // sexual assault
    "Q1134461", // cybercrime
    "Q151921",  // kidnapping
    "Q1192135", // fraud
    "Q723148",  // organized crime
];

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: Option<SparqlResults>,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Option<Vec<HashMap<String, Binding>>>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    #[serde(default)]
    value: Option<String>,
}

type Row = HashMap<String, Binding>;

fn field<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(|b| b.value.as_deref())
}

/// SPARQL text for crime items dated in or after `year_cutoff`.
pub fn build_query(year_cutoff: i32) -> String {
    let values = CRIME_CATEGORIES
        .iter()
        .map(|id| format!("wd:{id}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"SELECT ?item ?itemLabel ?date ?crimeTypeLabel ?article ?countryLabel
WHERE {{
  VALUES ?crimeType {{ {values} }}
  ?item wdt:P31 ?crimeType.
  ?item wdt:P585|wdt:P580 ?date.
  OPTIONAL {{ ?item wdt:P17 ?country. }}
  OPTIONAL {{
    ?article schema:about ?item;
             schema:inLanguage "en";
             schema:isPartOf <https://en.wikipedia.org/>.
  }}
  FILTER(YEAR(?date) >= {year_cutoff})
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en", "en-gb". }}
}}"#
    )
}

/// True when the label service handed back a bare entity id ("Q12345").
pub fn is_unresolved_label(label: &str) -> bool {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"^Q\d+$").expect("entity id regex"));
    re.is_match(label.trim())
}

/// Accepts full RFC 3339 timestamps ("1995-04-19T00:00:00Z"), naive
/// timestamps and bare dates.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn normalize_row(row: &Row, year_cutoff: i32) -> RowOutcome {
    let Some(date_str) = field(row, "date").filter(|s| !s.trim().is_empty()) else {
        return RowOutcome::Skipped(SkipReason::MissingDate);
    };
    let Some(dt) = parse_iso_date(date_str) else {
        return RowOutcome::Skipped(SkipReason::InvalidDate);
    };

    let event_text = match field(row, "itemLabel").map(str::trim) {
        Some(l) if !l.is_empty() && !is_unresolved_label(l) => l.to_string(),
        _ => return RowOutcome::Skipped(SkipReason::UnresolvedLabel),
    };

    if dt.year() < year_cutoff {
        return RowOutcome::Skipped(SkipReason::BeforeCutoff);
    }

    let md = MonthDay::from_date(&dt);
    let crime_type = field(row, "crimeTypeLabel")
        .map(str::to_lowercase)
        .unwrap_or_else(|| "crime".to_string());

    RowOutcome::Accepted(EventRecord {
        source: Source::Wikidata,
        month: md.mm(),
        day: md.dd(),
        year_of_event: dt.year(),
        title: event_text.clone(),
        event: event_text,
        description: "Source: Wikidata".to_string(),
        crime_type,
        country: field(row, "countryLabel").unwrap_or_default().to_string(),
        url: field(row, "article").unwrap_or_default().to_string(),
        latitude: String::new(),
        longitude: String::new(),
        extract: String::new(),
        related_topics: String::new(),
        topic_page_urls: String::new(),
    })
}

/// Turn a SPARQL JSON body into row outcomes. A body without
/// `results.bindings` yields no rows.
pub fn normalize_response(body: &str, year_cutoff: i32) -> Result<Vec<RowOutcome>> {
    let resp: SparqlResponse = serde_json::from_str(body).context("parsing wikidata json")?;
    let Some(bindings) = resp.results.and_then(|r| r.bindings) else {
        tracing::warn!(provider = "Wikidata", "no results found or data is malformed");
        return Ok(Vec::new());
    };
    tracing::info!(
        provider = "Wikidata",
        raw = bindings.len(),
        "received raw results, processing"
    );
    Ok(bindings
        .iter()
        .map(|row| normalize_row(row, year_cutoff))
        .collect())
}

pub struct WikidataProvider {
    mode: Mode,
    year_cutoff: i32,
}

enum Mode {
    Fixture(String),
    Http {
        endpoint: String,
        client: reqwest::Client,
    },
}

impl WikidataProvider {
    pub fn from_fixture_str(body: &str, year_cutoff: i32) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
            year_cutoff,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.wikidata_timeout_secs))
            .build()
            .context("building wikidata http client")?;
        Ok(Self {
            mode: Mode::Http {
                endpoint: settings.wikidata_endpoint.clone(),
                client,
            },
            year_cutoff: settings.year_cutoff,
        })
    }

    async fn fetch_body(&self, endpoint: &str, client: &reqwest::Client) -> Result<String> {
        let query = build_query(self.year_cutoff);
        tracing::info!(provider = "Wikidata", "sending query to endpoint");
        let resp = client
            .get(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("query", query.as_str())])
            .send()
            .await
            .context("wikidata http get()")?
            .error_for_status()
            .context("wikidata http status")?;
        resp.text().await.context("wikidata http .text()")
    }
}

#[async_trait]
impl SourceProvider for WikidataProvider {
    async fn fetch_rows(&self) -> Result<Vec<RowOutcome>> {
        let t0 = std::time::Instant::now();
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http { endpoint, client } => self.fetch_body(endpoint, client).await?,
        };
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("crime_fetch_ms", "source" => "Wikidata").record(ms);
        normalize_response(&body, self.year_cutoff)
    }

    fn source(&self) -> Source {
        Source::Wikidata
    }
}
