// src/export.rs
//! Final pass: sort the collected records and write the CSV table plus the
//! date-grouped JSON document.

use anyhow::{Context, Result};
use metrics::counter;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::accumulator::Accumulator;
use crate::record::{EventRecord, COLUMNS};

pub const FILE_STEM_PREFIX: &str = "crime_anniversaries_merged";

/// Paths written by a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub records: usize,
}

/// Local-time stamp used in output filenames, e.g. "20240419_153000".
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Stable sort by (month, day, year_of_event). Month/day are zero-padded, so
/// string order is calendar order.
pub fn sort_records(records: &mut [EventRecord]) {
    records.sort_by(|a, b| {
        (a.month.as_str(), a.day.as_str(), a.year_of_event).cmp(&(
            b.month.as_str(),
            b.day.as_str(),
            b.year_of_event,
        ))
    });
}

/// Write one row with every field quoted and inner quotes doubled.
pub fn write_quoted_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            w.write_all(b",")?;
        } else {
            first = false;
        }
        let escaped = cell.as_ref().replace('"', "\"\"");
        write!(w, "\"{}\"", escaped)?;
    }
    w.write_all(b"\n")
}

pub fn write_csv<W: Write>(mut w: W, records: &[EventRecord]) -> io::Result<()> {
    write_quoted_row(&mut w, &COLUMNS)?;
    for r in records {
        write_quoted_row(&mut w, &r.to_row())?;
    }
    w.flush()
}

/// Pretty JSON with 4-space indent; non-ASCII stays literal.
pub fn write_json<W: Write, T: Serialize>(w: W, value: &T) -> Result<()> {
    let fmt = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(w, fmt);
    value.serialize(&mut ser).context("serializing grouped json")?;
    let mut w = ser.into_inner();
    w.flush()?;
    Ok(())
}

fn ensure_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating output dir {}", dir.display()))
}

/// Consume the accumulator and write both artifacts into `out_dir`.
/// Returns `None` (and writes nothing) when no records were collected.
pub fn export(acc: Accumulator, out_dir: &Path, stamp: &str) -> Result<Option<ExportPaths>> {
    if acc.is_empty() {
        info!("no data was collected, nothing to save");
        return Ok(None);
    }
    info!(records = acc.len(), "merging and saving all data");

    let (mut records, by_date) = acc.into_parts();
    sort_records(&mut records);

    ensure_directory(out_dir)?;
    let base = format!("{FILE_STEM_PREFIX}_{stamp}");
    let csv_path = out_dir.join(format!("{base}.csv"));
    let json_path = out_dir.join(format!("{base}.json"));

    let csv_file = File::create(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    write_csv(BufWriter::new(csv_file), &records)
        .with_context(|| format!("writing {}", csv_path.display()))?;

    let written = File::create(&json_path)
        .with_context(|| format!("creating {}", json_path.display()))
        .and_then(|f| {
            write_json(BufWriter::new(f), &by_date)
                .with_context(|| format!("writing {}", json_path.display()))
        });
    if let Err(e) = written {
        // The two files are one export; drop the CSV rather than leave half of it.
        if let Err(rm) = fs::remove_file(&csv_path) {
            warn!(path = %csv_path.display(), error = %rm, "could not remove partial export");
        }
        return Err(e);
    }

    counter!("crime_export_records_total").increment(records.len() as u64);
    info!(
        csv = %csv_path.display(),
        json = %json_path.display(),
        total = records.len(),
        "files saved"
    );

    Ok(Some(ExportPaths {
        csv: csv_path,
        json: json_path,
        records: records.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    fn rec(mm: &str, dd: &str, year: i32, event: &str) -> EventRecord {
        EventRecord {
            source: Source::OnThisDay,
            month: mm.into(),
            day: dd.into(),
            year_of_event: year,
            event: event.into(),
            title: event.into(),
            description: String::new(),
            crime_type: "murder".into(),
            country: String::new(),
            url: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            extract: String::new(),
            related_topics: String::new(),
            topic_page_urls: String::new(),
        }
    }

    #[test]
    fn json_failure_removes_the_csv() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = "20240419_120000";
        // A directory where the JSON file should go makes File::create fail.
        fs::create_dir(dir.path().join(format!("{FILE_STEM_PREFIX}_{stamp}.json"))).unwrap();

        let mut acc = Accumulator::new();
        assert!(acc.accept(rec("04", "19", 1995, "bombing")));

        let err = export(acc, dir.path(), stamp).unwrap_err();
        assert!(format!("{err:#}").contains(".json"));
        assert!(!dir.path().join(format!("{FILE_STEM_PREFIX}_{stamp}.csv")).exists());
    }

    #[test]
    fn quoted_row_doubles_inner_quotes() {
        let mut buf = Vec::new();
        write_quoted_row(&mut buf, &["a", "say \"hi\"", ""]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\"a\",\"say \"\"hi\"\"\",\"\"\n");
    }

    #[test]
    fn sort_is_month_day_year_and_stable() {
        let mut v = vec![
            rec("12", "01", 1950, "a"),
            rec("02", "10", 1990, "b"),
            rec("02", "10", 1920, "c"),
            rec("02", "09", 2001, "d"),
            rec("02", "10", 1920, "e"),
        ];
        sort_records(&mut v);
        let order: Vec<&str> = v.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(order, vec!["d", "c", "e", "b", "a"]);
    }

    #[test]
    fn csv_has_header_and_all_quoted_fields() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[rec("01", "02", 1999, "Café, robbery")]).unwrap();
        let s = String::from_utf8(buf).unwrap();
        let mut lines = s.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"source\",\"month\",\"day\",\"year_of_event\",\"country\",\"event\",\"title\",\"description\",\"crime_type\",\"url\",\"latitude\",\"longitude\",\"extract\",\"related_topics\",\"topic_page_urls\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"OnThisDay\",\"01\",\"02\",\"1999\",\"\",\"Café, robbery\""));
    }

    #[test]
    fn json_keeps_non_ascii_and_indents_four_spaces() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({ "k": "Zürich" })).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(s, "{\n    \"k\": \"Zürich\"\n}");
    }
}
