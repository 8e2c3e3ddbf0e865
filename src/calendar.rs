// src/calendar.rs
//! Year-agnostic date helpers: labels like "April 19", zero-padded parts, and
//! the day-of-year walk used by the daily feed.

use chrono::{Datelike, Month, NaiveDate};

/// Leap year used to enumerate every calendar day (including Feb 29) and to
/// order date labels.
pub const LEAP_REFERENCE_YEAR: i32 = 2024;

/// A (month, day) pair without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// Validated against the leap reference year, so Feb 29 is accepted.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day).map(|_| Self { month, day })
    }

    pub fn from_date<D: Datelike>(d: &D) -> Self {
        Self {
            month: d.month(),
            day: d.day(),
        }
    }

    pub fn mm(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn dd(&self) -> String {
        format!("{:02}", self.day)
    }

    /// Full English month name plus unpadded day, e.g. "February 29".
    pub fn label(&self) -> String {
        format!("{} {}", month_name(self.month), self.day)
    }
}

pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or_default()
}

/// Parse a label produced by [`MonthDay::label`] back into a (month, day).
/// Month names are matched case-insensitively.
pub fn parse_label(label: &str) -> Option<MonthDay> {
    let (name, day) = label.trim().rsplit_once(' ')?;
    let month: Month = name.trim().parse().ok()?;
    let day: u32 = day.parse().ok()?;
    MonthDay::new(month.number_from_month(), day)
}

/// Build a label from zero-padded record parts ("04", "19" -> "April 19").
pub fn label_from_parts(mm: &str, dd: &str) -> Option<String> {
    let month = mm.parse().ok()?;
    let day = dd.parse().ok()?;
    MonthDay::new(month, day).map(|md| md.label())
}

/// Every calendar day of `year` in order, by day-of-year index 1..=366.
/// Ordinal 366 only exists in leap years; it is dropped for other years.
pub fn days_of_year(year: i32) -> Vec<MonthDay> {
    (1..=366)
        .filter_map(|ordinal| NaiveDate::from_yo_opt(year, ordinal))
        .map(|d| MonthDay::from_date(&d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_reference_has_366_days_with_feb_29() {
        let days = days_of_year(LEAP_REFERENCE_YEAR);
        assert_eq!(days.len(), 366);
        assert_eq!(days[59], MonthDay { month: 2, day: 29 });
        assert_eq!(days[0].label(), "January 1");
        assert_eq!(days[365].label(), "December 31");
    }

    #[test]
    fn non_leap_year_skips_feb_29_but_keeps_labels_right() {
        let days = days_of_year(2023);
        assert_eq!(days.len(), 365);
        assert_eq!(days[59], MonthDay { month: 3, day: 1 });
        assert!(!days.contains(&MonthDay { month: 2, day: 29 }));
    }

    #[test]
    fn labels_round_trip() {
        for md in days_of_year(LEAP_REFERENCE_YEAR) {
            assert_eq!(parse_label(&md.label()), Some(md));
        }
        assert_eq!(parse_label("february 29"), MonthDay::new(2, 29));
        assert_eq!(parse_label("Smarch 3"), None);
        assert_eq!(parse_label("April 31"), None);
    }

    #[test]
    fn padded_parts() {
        let md = MonthDay::new(4, 9).unwrap();
        assert_eq!(md.mm(), "04");
        assert_eq!(md.dd(), "09");
        assert_eq!(label_from_parts("04", "09").as_deref(), Some("April 9"));
    }
}
