// src/ingest/providers/onthisday.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::calendar::{self, month_name, MonthDay, LEAP_REFERENCE_YEAR};
use crate::config::Settings;
use crate::ingest::types::SourceProvider;
use crate::keywords::CrimeMatcher;
use crate::record::{EventRecord, RowOutcome, SkipReason, Source};

/// Explicit `null` reads as the type's default, same as a missing key.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Events stay raw until normalization so one bad entry cannot sink the day.
#[derive(Debug, Default, Deserialize)]
pub struct DayFeed {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<FeedPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub content_urls: Option<ContentUrls>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lon: Value,
}

impl Coordinates {
    /// `{}` or `{"lat": null, "lon": null}` carries no position.
    fn is_empty(&self) -> bool {
        self.lat.is_null() && self.lon.is_null()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentUrls {
    #[serde(default)]
    pub desktop: Option<PageUrls>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageUrls {
    #[serde(default)]
    pub page: Option<String>,
}

impl FeedPage {
    fn display_title(&self) -> String {
        self.title.replace('_', " ")
    }

    fn desktop_url(&self) -> &str {
        self.content_urls
            .as_ref()
            .and_then(|c| c.desktop.as_ref())
            .and_then(|d| d.page.as_deref())
            .unwrap_or_default()
    }
}

/// Upstream numbers are kept as written; strings pass through; anything else is empty.
fn raw_coordinate(v: &Value) -> String {
    match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Knobs the per-event filter needs.
#[derive(Debug, Clone)]
pub struct FeedRules {
    pub matcher: CrimeMatcher,
    pub year_cutoff: i32,
    pub max_pages: usize,
}

impl FeedRules {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            matcher: settings.matcher()?,
            year_cutoff: settings.year_cutoff,
            max_pages: settings.max_pages.max(1),
        })
    }
}

fn normalize_event(ev: &FeedEvent, date: MonthDay, rules: &FeedRules) -> RowOutcome {
    let Some(crime_type) = rules.matcher.classify(&ev.text) else {
        return RowOutcome::Skipped(SkipReason::NoKeyword);
    };
    let Some(year) = ev.year else {
        return RowOutcome::Skipped(SkipReason::MissingYear);
    };
    let year = match i32::try_from(year) {
        Ok(y) if y >= rules.year_cutoff => y,
        _ => return RowOutcome::Skipped(SkipReason::BeforeCutoff),
    };
    let Some(primary) = ev.pages.first() else {
        return RowOutcome::Skipped(SkipReason::NoPages);
    };

    let (latitude, longitude) = ev
        .pages
        .iter()
        .take(rules.max_pages)
        .find_map(|p| p.coordinates.as_ref().filter(|c| !c.is_empty()))
        .map(|c| (raw_coordinate(&c.lat), raw_coordinate(&c.lon)))
        .unwrap_or_default();

    let related: Vec<&FeedPage> = ev.pages.iter().take(rules.max_pages).skip(1).collect();
    let related_topics = related
        .iter()
        .map(|p| p.display_title())
        .collect::<Vec<_>>()
        .join(", ");
    let topic_page_urls = related
        .iter()
        .map(|p| format!("{}: {}", p.display_title(), p.desktop_url()))
        .collect::<Vec<_>>()
        .join(", ");

    RowOutcome::Accepted(EventRecord {
        source: Source::OnThisDay,
        month: date.mm(),
        day: date.dd(),
        year_of_event: year,
        event: ev.text.clone(),
        title: primary.display_title(),
        description: primary.description.clone().unwrap_or_default(),
        crime_type,
        country: String::new(),
        url: primary.desktop_url().to_string(),
        latitude,
        longitude,
        extract: primary.extract.clone().unwrap_or_default(),
        related_topics,
        topic_page_urls,
    })
}

/// Filter and reshape one day's feed. An entry that does not fit the event
/// shape is skipped on its own.
pub fn normalize_day(feed: &DayFeed, date: MonthDay, rules: &FeedRules) -> Vec<RowOutcome> {
    feed.events
        .iter()
        .map(|raw| match FeedEvent::deserialize(raw) {
            Ok(ev) => normalize_event(&ev, date, rules),
            Err(e) => {
                tracing::debug!(provider = "OnThisDay", date = %date.label(), error = %e, "malformed event");
                RowOutcome::Skipped(SkipReason::MalformedEvent)
            }
        })
        .collect()
}

/// Parse a feed body and normalize it for `date`.
pub fn normalize_day_body(body: &str, date: MonthDay, rules: &FeedRules) -> Result<Vec<RowOutcome>> {
    let feed: DayFeed = serde_json::from_str(body).context("parsing onthisday json")?;
    Ok(normalize_day(&feed, date, rules))
}

/// Path suffix for a day, e.g. "04/19".
pub fn day_key(date: MonthDay) -> String {
    format!("{}/{}", date.mm(), date.dd())
}

pub struct OnThisDayProvider {
    mode: Mode,
    rules: FeedRules,
    pause: Duration,
}

enum Mode {
    /// Bodies keyed by "MM/DD"; missing days behave like failed requests.
    Fixture(HashMap<String, String>),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl OnThisDayProvider {
    pub fn from_fixtures(days: HashMap<String, String>, rules: FeedRules) -> Self {
        Self {
            mode: Mode::Fixture(days),
            rules,
            pause: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.onthisday_timeout_secs))
            .build()
            .context("building onthisday http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: settings.onthisday_base_url.trim_end_matches('/').to_string(),
                client,
            },
            rules: FeedRules::from_settings(settings)?,
            pause: settings.pause(),
        })
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    async fn fetch_day(&self, date: MonthDay) -> Result<String> {
        let key = day_key(date);
        match &self.mode {
            Mode::Fixture(days) => days
                .get(&key)
                .cloned()
                .ok_or_else(|| anyhow!("no fixture for {key}")),
            Mode::Http { base_url, client } => {
                let url = format!("{base_url}/{key}");
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("onthisday http get({url})"))?
                    .error_for_status()
                    .with_context(|| format!("onthisday http status ({url})"))?;
                resp.text().await.context("onthisday http .text()")
            }
        }
    }
}

#[async_trait]
impl SourceProvider for OnThisDayProvider {
    async fn fetch_rows(&self) -> Result<Vec<RowOutcome>> {
        tracing::info!(provider = "OnThisDay", "starting daily feed query");
        let days = calendar::days_of_year(LEAP_REFERENCE_YEAR);
        let mut out = Vec::new();
        let mut failed_days = 0usize;

        for (i, date) in days.iter().copied().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            if date.day == 1 {
                tracing::info!(provider = "OnThisDay", month = month_name(date.month), "processing month");
            }

            let t0 = std::time::Instant::now();
            let parsed = match self.fetch_day(date).await {
                Ok(body) => normalize_day_body(&body, date, &self.rules),
                Err(e) => Err(e),
            };
            let ms = t0.elapsed().as_secs_f64() * 1_000.0;
            histogram!("crime_fetch_ms", "source" => "OnThisDay").record(ms);

            match parsed {
                Ok(mut rows) => out.append(&mut rows),
                Err(e) => {
                    failed_days += 1;
                    counter!("crime_provider_errors_total", "source" => "OnThisDay").increment(1);
                    tracing::warn!(
                        provider = "OnThisDay",
                        date = %date.label(),
                        error = ?e,
                        "could not fetch day, skipping"
                    );
                }
            }
        }

        tracing::info!(
            provider = "OnThisDay",
            days = days.len(),
            failed_days,
            rows = out.len(),
            "feed processing complete"
        );
        Ok(out)
    }

    fn source(&self) -> Source {
        Source::OnThisDay
    }
}
