// src/keywords.rs
//! Crime keyword classifier for free-text event descriptions.

use anyhow::{Context, Result};
use regex::Regex;

/// Default crime/violence vocabulary. Verbose mode, case-insensitive, and word
/// bounded; group 1 carries the matched keyword.
pub const DEFAULT_CRIME_PATTERN: &str = r"(?ix)
    \b(
        murder|assassin(?:ation)?|shooting|robbery|kidnap(?:ping)?|hijack|
        massacre|bomb(?:ing)?|terror(?:ism|ist)|serial\ killer|strangler|
        ripper|fraud|embezzl(?:e|ement)|money\ laundering|insider\ trading|
        tax\ evasion|bribery|corruption|extortion|ponzi|scam|securities\ fraud|
        pyramid\ scheme|price\ fixing|racketeering|manslaughter|assault|rape|arson
    )\b
";

#[derive(Debug, Clone)]
pub struct CrimeMatcher {
    re: Regex,
}

impl CrimeMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .with_context(|| format!("compiling crime keyword pattern {pattern:?}"))?;
        Ok(Self { re })
    }

    /// First keyword found in `text`, lowercased. Falls back to the whole match
    /// when the pattern has no capture group.
    pub fn classify(&self, text: &str) -> Option<String> {
        let caps = self.re.captures(text)?;
        let m = caps.get(1).or_else(|| caps.get(0))?;
        Some(m.as_str().to_lowercase())
    }
}

impl Default for CrimeMatcher {
    fn default() -> Self {
        Self {
            re: Regex::new(DEFAULT_CRIME_PATTERN).expect("default crime pattern"),
        }
    }
}
