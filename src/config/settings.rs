// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::keywords::{CrimeMatcher, DEFAULT_CRIME_PATTERN};

pub const ENV_CONFIG_PATH: &str = "CRIME_ANNIV_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/crime_anniversaries.toml";
pub const DEFAULT_JSON_PATH: &str = "config/crime_anniversaries.json";

pub const ENV_GET_WIKIDATA: &str = "CRIME_ANNIV_GET_WIKIDATA";
pub const ENV_GET_ON_THIS_DAY: &str = "CRIME_ANNIV_GET_ON_THIS_DAY";
pub const ENV_YEAR_CUTOFF: &str = "CRIME_ANNIV_YEAR_CUTOFF";
pub const ENV_MAX_PAGES: &str = "CRIME_ANNIV_MAX_PAGES";
pub const ENV_PAUSE_MS: &str = "CRIME_ANNIV_PAUSE_MS";
pub const ENV_OUTPUT_DIR: &str = "CRIME_ANNIV_OUTPUT_DIR";
pub const ENV_USER_AGENT: &str = "CRIME_ANNIV_USER_AGENT";

pub const DEFAULT_WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_ONTHISDAY_BASE_URL: &str =
    "https://api.wikimedia.org/feed/v1/wikipedia/en/onthisday/events";

/// Run configuration. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub get_wikidata: bool,
    pub get_on_this_day: bool,
    /// Regex applied to feed event text; group 1 (if any) becomes `crime_type`.
    pub crime_pattern: String,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
    pub year_cutoff: i32,
    /// Leading pages scanned for coordinates / related topics. Clamped to >= 1.
    pub max_pages: usize,
    pub pause_ms: u64,
    pub output_dir: PathBuf,
    pub wikidata_endpoint: String,
    pub onthisday_base_url: String,
    pub wikidata_timeout_secs: u64,
    pub onthisday_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            get_wikidata: true,
            get_on_this_day: true,
            crime_pattern: DEFAULT_CRIME_PATTERN.to_string(),
            user_agent: "CrimeAnnivBot/0.8 (StandaloneScript)".to_string(),
            year_cutoff: 1900,
            max_pages: 5,
            pause_ms: 1_000,
            output_dir: PathBuf::from("files"),
            wikidata_endpoint: DEFAULT_WIKIDATA_ENDPOINT.to_string(),
            onthisday_base_url: DEFAULT_ONTHISDAY_BASE_URL.to_string(),
            wikidata_timeout_secs: 90,
            onthisday_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Load from an explicit TOML or JSON file (format picked by extension,
    /// then by sniffing).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_settings(&content, ext.as_str())
            .with_context(|| format!("parsing settings from {}", path.display()))?;
        cfg.sanitized()
    }

    /// Lookup order:
    /// 1) $CRIME_ANNIV_CONFIG_PATH
    /// 2) config/crime_anniversaries.toml
    /// 3) config/crime_anniversaries.json
    /// 4) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_TOML_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_TOML_PATH))?
        } else if Path::new(DEFAULT_JSON_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_JSON_PATH))?
        } else {
            Self::default()
        };
        base.with_env_overrides().sanitized()
    }

    /// Apply `CRIME_ANNIV_*` variables. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = parse_bool_env(env::var(ENV_GET_WIKIDATA).ok()) {
            self.get_wikidata = v;
        }
        if let Some(v) = parse_bool_env(env::var(ENV_GET_ON_THIS_DAY).ok()) {
            self.get_on_this_day = v;
        }
        if let Some(v) = parse_env(env::var(ENV_YEAR_CUTOFF).ok()) {
            self.year_cutoff = v;
        }
        if let Some(v) = parse_env(env::var(ENV_MAX_PAGES).ok()) {
            self.max_pages = v;
        }
        if let Some(v) = parse_env(env::var(ENV_PAUSE_MS).ok()) {
            self.pause_ms = v;
        }
        if let Ok(v) = env::var(ENV_OUTPUT_DIR) {
            if !v.trim().is_empty() {
                self.output_dir = PathBuf::from(v.trim());
            }
        }
        if let Ok(v) = env::var(ENV_USER_AGENT) {
            if !v.trim().is_empty() {
                self.user_agent = v.trim().to_string();
            }
        }
        self
    }

    /// Clamp ranges and make sure the keyword pattern compiles.
    pub fn sanitized(mut self) -> Result<Self> {
        if self.max_pages == 0 {
            self.max_pages = 1;
        }
        self.matcher()?;
        Ok(self)
    }

    pub fn matcher(&self) -> Result<CrimeMatcher> {
        CrimeMatcher::new(&self.crime_pattern)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            toml::from_str(s).map_err(|e| anyhow!("unsupported settings format: {e}"))
        }
    }
}

fn parse_env<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse::<T>().ok())
}

fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    let s = raw?;
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = parse_settings("year_cutoff = 1950\nget_wikidata = false\n", "toml").unwrap();
        assert_eq!(s.year_cutoff, 1950);
        assert!(!s.get_wikidata);
        assert!(s.get_on_this_day);
        assert_eq!(s.max_pages, 5);
        assert_eq!(s.crime_pattern, DEFAULT_CRIME_PATTERN);
    }

    #[test]
    fn json_is_sniffed_without_extension() {
        let s = parse_settings(r#"{"pause_ms": 0, "max_pages": 3}"#, "").unwrap();
        assert_eq!(s.pause_ms, 0);
        assert_eq!(s.max_pages, 3);
    }

    #[test]
    fn sanitize_clamps_and_validates() {
        let s = Settings {
            max_pages: 0,
            ..Settings::default()
        };
        assert_eq!(s.sanitized().unwrap().max_pages, 1);

        let bad = Settings {
            crime_pattern: "(".into(),
            ..Settings::default()
        };
        assert!(bad.sanitized().is_err());
    }

    #[test]
    fn bool_env_parsing() {
        assert_eq!(parse_bool_env(Some(" Yes ".into())), Some(true));
        assert_eq!(parse_bool_env(Some("0".into())), Some(false));
        assert_eq!(parse_bool_env(Some("maybe".into())), None);
        assert_eq!(parse_bool_env(None), None);
        assert_eq!(parse_env::<i32>(Some(" 1990 ".into())), Some(1990));
        assert_eq!(parse_env::<i32>(Some("soon".into())), None);
    }
}
