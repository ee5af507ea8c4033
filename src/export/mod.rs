pub mod pdf;

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::store::{EmissionRecord, ParseError};
use crate::view::StatusFilter;

pub const DEFAULT_FILE_NAME: &str = "carbon-emission-report.pdf";
pub const DEFAULT_TITLE: &str = "CarbonWise - Emission Report";
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";
pub const DEFAULT_UNIT: &str = "kg";

pub const COLUMN_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Json,
    Text,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
            ExportFormat::Text => "text",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError {
            kind: "output format",
            value: s.to_string(),
            expected: "pdf, json, text",
        })
    }
}

pub fn infer_format_from_path(path: &str) -> Option<ExportFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".pdf") {
        return Some(ExportFormat::Pdf);
    }
    if lower.ends_with(".json") {
        return Some(ExportFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(ExportFormat::Text);
    }
    None
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize report: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid date format '{format}'")]
    InvalidDateFormat { format: String },

    #[error("failed to create temporary file in {dir}: {source}")]
    TempFile {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save report: {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub title: String,
    pub unit: Option<String>,
    pub date_format: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Pdf,
            title: DEFAULT_TITLE.to_string(),
            unit: Some(DEFAULT_UNIT.to_string()),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_on: String,
    pub status_filter: String,
    pub columns: [String; COLUMN_COUNT],
    pub rows: Vec<[String; COLUMN_COUNT]>,
}

impl ReportDocument {
    pub fn subtitle(&self) -> String {
        format!("Generated on: {}", self.generated_on)
    }

    pub fn filter_line(&self) -> String {
        format!("Applied Filters - Status: {}", self.status_filter)
    }
}

pub fn emission_header(unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(unit) => format!("Emission ({unit})"),
        None => "Emission".to_string(),
    }
}

pub fn column_headers(unit: Option<&str>) -> [String; COLUMN_COUNT] {
    [
        "Date".to_string(),
        "Source Type".to_string(),
        "Location".to_string(),
        emission_header(unit),
        "Status".to_string(),
    ]
}

pub fn format_row(record: &EmissionRecord) -> [String; COLUMN_COUNT] {
    [
        record.date.to_string(),
        record.category.label().to_string(),
        record.location.clone(),
        record.emission.to_string(),
        record.status.label().to_string(),
    ]
}

/// Snapshot of the visible rows, in the order given.
pub fn build_document(
    visible: &[&EmissionRecord],
    status_filter: StatusFilter,
    options: &ExportOptions,
    generated_on: &str,
) -> ReportDocument {
    ReportDocument {
        title: options.title.clone(),
        generated_on: generated_on.to_string(),
        status_filter: status_filter.label().to_string(),
        columns: column_headers(options.unit.as_deref()),
        rows: visible.iter().map(|r| format_row(r)).collect(),
    }
}

/// Widest cell per column, header included, counted in chars.
pub fn text_widths(
    columns: &[String; COLUMN_COUNT],
    rows: &[[String; COLUMN_COUNT]],
) -> [usize; COLUMN_COUNT] {
    let mut widths = columns.clone().map(|c| c.chars().count());
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    widths
}

pub fn pad_cells<'a>(
    cells: &'a [String; COLUMN_COUNT],
    widths: &'a [usize; COLUMN_COUNT],
) -> impl Iterator<Item = String> + 'a {
    cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, &w)| format!("{cell:<w$}"))
}

pub fn rule_line(widths: &[usize; COLUMN_COUNT]) -> String {
    widths.iter().map(|w| "-".repeat(*w)).join("  ")
}

pub fn render_text(doc: &ReportDocument) -> Vec<u8> {
    let widths = text_widths(&doc.columns, &doc.rows);
    let line = |cells: &[String; COLUMN_COUNT]| {
        pad_cells(cells, &widths).join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&doc.title);
    out.push('\n');
    out.push_str(&doc.subtitle());
    out.push('\n');
    out.push_str(&doc.filter_line());
    out.push_str("\n\n");
    out.push_str(&line(&doc.columns));
    out.push('\n');
    out.push_str(&rule_line(&widths));
    out.push('\n');
    for row in doc.rows.iter() {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(doc: &ReportDocument) -> Result<Vec<u8>, ExportError> {
    let mut out =
        serde_json::to_vec_pretty(doc).map_err(|source| ExportError::Serialize { source })?;
    out.push(b'\n');
    Ok(out)
}

pub fn render(doc: &ReportDocument, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Pdf => Ok(pdf::render_pdf(doc)),
        ExportFormat::Json => render_json(doc),
        ExportFormat::Text => Ok(render_text(doc)),
    }
}

/// Writes `bytes` next to `path` first and renames it into place, so a
/// failed export never leaves a truncated file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp =
        tempfile::NamedTempFile::new_in(&dir).map_err(|source| ExportError::TempFile {
            dir: dir.display().to_string(),
            source,
        })?;
    tmp.write_all(bytes)
        .and_then(|_| set_report_mode(tmp.as_file(), path))
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|source| ExportError::Write {
            path: path.display().to_string(),
            source,
        })?;
    tmp.persist(path).map_err(|e| ExportError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}

// temp files are created 0600; an existing report keeps its mode, a new one
// gets the usual 0644
#[cfg(unix)]
fn set_report_mode(file: &std::fs::File, path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644);
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_report_mode(_file: &std::fs::File, _path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn format_date(at: &DateTime<Local>, date_format: &str) -> Result<String, ExportError> {
    // chrono signals unformattable items with fmt::Error, which to_string() panics on
    let mut out = String::new();
    write!(out, "{}", at.format(date_format)).map_err(|_| ExportError::InvalidDateFormat {
        format: date_format.to_string(),
    })?;
    Ok(out)
}

pub fn check_date_format(date_format: &str) -> Result<(), ExportError> {
    format_date(&Local::now(), date_format).map(|_| ())
}

pub fn local_date(date_format: &str) -> Result<String, ExportError> {
    format_date(&Local::now(), date_format)
}

/// Renders the visible rows and saves them to `path`. The generation date
/// is read from the local clock at call time.
pub fn export(
    visible: &[&EmissionRecord],
    status_filter: StatusFilter,
    options: &ExportOptions,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    let generated_on = local_date(&options.date_format)?;
    let doc = build_document(visible, status_filter, options, &generated_on);
    let bytes = render(&doc, options.format)?;
    write_atomic(path, &bytes)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{sample_records, Status};
    use crate::view::{compute, SortDirection, SortKey};

    #[test]
    fn format_parse_and_inference() {
        assert_eq!(ExportFormat::parse("PDF"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::parse("txt"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::parse("xml"), None);
        assert_eq!(
            infer_format_from_path("out/report.JSON"),
            Some(ExportFormat::Json)
        );
        assert_eq!(infer_format_from_path("report"), None);
    }

    #[test]
    fn date_format_is_checked_before_formatting() {
        assert!(check_date_format(DEFAULT_DATE_FORMAT).is_ok());
        assert!(check_date_format("%Y-%m-%d").is_ok());
        assert!(matches!(
            local_date("%Q"),
            Err(ExportError::InvalidDateFormat { .. })
        ));
    }

    #[test]
    fn parse_only_date_items_are_rejected() {
        // %#z parses as a valid item but chrono refuses to format it
        assert!(check_date_format("%#z").is_err());
        assert!(matches!(
            local_date("%#z"),
            Err(ExportError::InvalidDateFormat { .. })
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let options = ExportOptions {
            format: ExportFormat::Text,
            date_format: "%#z".to_string(),
            ..ExportOptions::default()
        };
        let err = export(&[], StatusFilter::All, &options, &path).unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateFormat { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn emission_header_carries_unit() {
        assert_eq!(emission_header(Some("kg")), "Emission (kg)");
        assert_eq!(emission_header(Some("tCO2e")), "Emission (tCO2e)");
        assert_eq!(emission_header(Some("  ")), "Emission");
        assert_eq!(emission_header(None), "Emission");
    }

    #[test]
    fn document_keeps_visible_order_and_filter_label() {
        let records = sample_records();
        let visible = compute(
            &records,
            "",
            StatusFilter::Only(Status::Low),
            SortKey::Emission,
            SortDirection::Descending,
        );
        let doc = build_document(
            &visible,
            StatusFilter::Only(Status::Low),
            &ExportOptions::default(),
            "2/20/2026",
        );
        assert_eq!(doc.status_filter, "Low");
        assert_eq!(doc.filter_line(), "Applied Filters - Status: Low");
        assert_eq!(doc.subtitle(), "Generated on: 2/20/2026");
        let locations: Vec<&str> = doc.rows.iter().map(|r| r[2].as_str()).collect();
        assert_eq!(
            locations,
            vec!["Processing Plant C", "Kisii Campus", "Nyali Bridge"]
        );
        assert!(doc.rows.iter().all(|r| r[4] == "Low"));
    }

    #[test]
    fn document_for_all_filter_reads_all() {
        let records = sample_records();
        let visible: Vec<&EmissionRecord> = records.iter().collect();
        let doc = build_document(
            &visible,
            StatusFilter::All,
            &ExportOptions::default(),
            "x",
        );
        assert_eq!(doc.filter_line(), "Applied Filters - Status: All");
        assert_eq!(
            doc.columns,
            ["Date", "Source Type", "Location", "Emission (kg)", "Status"].map(String::from)
        );
        assert_eq!(
            doc.rows[0],
            ["2026-02-18", "Vehicle", "Mombasa Rd", "12.5", "High"].map(String::from)
        );
    }

    #[test]
    fn text_render_aligns_columns() {
        let records = sample_records();
        let visible: Vec<&EmissionRecord> = records.iter().take(2).collect();
        let doc = build_document(
            &visible,
            StatusFilter::All,
            &ExportOptions::default(),
            "1/1/2026",
        );
        let text = String::from_utf8(render_text(&doc)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], DEFAULT_TITLE);
        assert_eq!(lines[2], "Applied Filters - Status: All");
        assert!(lines[4].starts_with("Date        Source Type  Location"));
        assert!(lines[6].starts_with("2026-02-18  Vehicle      Mombasa Rd"));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn json_render_round_trips_rows() {
        let records = sample_records();
        let visible: Vec<&EmissionRecord> = records.iter().collect();
        let doc = build_document(
            &visible,
            StatusFilter::All,
            &ExportOptions::default(),
            "1/1/2026",
        );
        let bytes = render_json(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status_filter"], "All");
        assert_eq!(value["rows"].as_array().unwrap().len(), 7);
        assert_eq!(value["rows"][1][2], "Factory Zone A");
    }

    #[test]
    fn export_writes_file_and_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        std::fs::write(&path, b"stale").unwrap();

        let records = sample_records();
        let visible: Vec<&EmissionRecord> = records.iter().collect();
        let saved = export(
            &visible,
            StatusFilter::All,
            &ExportOptions::default(),
            &path,
        )
        .unwrap();
        assert_eq!(saved, path);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn export_into_missing_directory_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.pdf");
        let err = export(&[], StatusFilter::All, &ExportOptions::default(), &path).unwrap_err();
        assert!(matches!(err, ExportError::TempFile { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn export_onto_directory_fails_at_persist_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adir");
        std::fs::create_dir(&path).unwrap();
        let err = export(&[], StatusFilter::All, &ExportOptions::default(), &path).unwrap_err();
        assert!(matches!(err, ExportError::Persist { .. }));
        assert!(path.is_dir());
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["adir".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn exported_report_gets_regular_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.pdf");
        export(&[], StatusFilter::All, &ExportOptions::default(), &fresh).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        let existing = dir.path().join("existing.pdf");
        std::fs::write(&existing, b"old").unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o640)).unwrap();
        export(&[], StatusFilter::All, &ExportOptions::default(), &existing).unwrap();
        let mode = std::fs::metadata(&existing).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
