// src/ingest/csv_input.rs
//! Profile batch CSV: header aliases, identifier normalization, baseline columns

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::types::{RoleSnapshot, RowError};
use crate::utils::{non_blank, normalize_identifier};

const ID_COLUMNS: &[&str] = &["id", "profile_id", "linkedin_url", "profile_url", "url"];
const NAME_COLUMNS: &[&str] = &["name", "full_name"];
const TITLE_COLUMNS: &[&str] = &["title", "current_title", "previous_title"];
const COMPANY_COLUMNS: &[&str] = &["company", "current_company", "previous_company"];

/// One usable CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    /// 1-based line number, header is line 1
    pub line: u64,
    pub id: String,
    pub name: Option<String>,
    pub baseline_title: Option<String>,
    pub baseline_company: Option<String>,
}

impl ProfileRow {
    /// Prior role carried by the CSV, if any
    pub fn baseline(&self) -> Option<RoleSnapshot> {
        if self.baseline_title.is_none() && self.baseline_company.is_none() {
            return None;
        }
        Some(RoleSnapshot::new(
            self.baseline_title.as_deref(),
            self.baseline_company.as_deref(),
        ))
    }
}

#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub rows: Vec<ProfileRow>,
    pub invalid: Vec<RowError>,
}

impl ParsedCsv {
    pub fn total(&self) -> usize {
        self.rows.len() + self.invalid.len()
    }
}

struct Columns {
    id: usize,
    name: usize,
    title: Option<usize>,
    company: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(alias))
    })
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns> {
    let id = find_column(headers, ID_COLUMNS);
    let name = find_column(headers, NAME_COLUMNS);

    match (id, name) {
        (Some(id), Some(name)) => Ok(Columns {
            id,
            name,
            title: find_column(headers, TITLE_COLUMNS),
            company: find_column(headers, COMPANY_COLUMNS),
        }),
        (id, name) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push(format!("identifier ({})", ID_COLUMNS.join("/")));
            }
            if name.is_none() {
                missing.push(format!("name ({})", NAME_COLUMNS.join("/")));
            }
            anyhow::bail!("CSV is missing required column(s): {}", missing.join(", "))
        }
    }
}

/// Parse a profile batch.
///
/// Structural problems (unreadable header, missing required columns) are
/// errors; bad rows are collected in `ParsedCsv::invalid`.
pub fn parse_profiles<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let columns = resolve_columns(&headers)?;

    let mut parsed = ParsedCsv::default();
    for (index, result) in reader.records().enumerate() {
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                parsed
                    .invalid
                    .push(RowError::new(line, None, format!("Unreadable row: {}", e)));
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let raw_id = record.get(columns.id).unwrap_or_default();
        let Some(id) = normalize_identifier(raw_id) else {
            parsed.invalid.push(RowError::new(
                line,
                non_blank(Some(raw_id)).as_deref(),
                "Missing or invalid profile identifier",
            ));
            continue;
        };

        let field = |index: Option<usize>| non_blank(index.and_then(|i| record.get(i)));
        parsed.rows.push(ProfileRow {
            line,
            id,
            name: field(Some(columns.name)),
            baseline_title: field(columns.title),
            baseline_company: field(columns.company),
        });
    }

    if !parsed.invalid.is_empty() {
        warn!("{} CSV row(s) rejected", parsed.invalid.len());
    }
    Ok(parsed)
}

pub fn load_profiles(path: &Path) -> Result<ParsedCsv> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let parsed = parse_profiles(file)
        .with_context(|| format!("Invalid CSV file: {}", path.display()))?;

    info!(
        "Loaded {} profile row(s) from {}",
        parsed.rows.len(),
        path.display()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_aliases_and_baseline_columns() {
        let csv = "LinkedIn_URL,Full_Name,Current_Title,Current_Company\n\
                   https://linkedin.com/in/jane/,Jane Doe,Software Engineer,BigTech\n\
                   42,,,\n";
        let parsed = parse_profiles(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        let jane = &parsed.rows[0];
        assert_eq!(jane.id, "https://www.linkedin.com/in/jane");
        assert_eq!(jane.line, 2);
        assert_eq!(
            jane.baseline(),
            Some(RoleSnapshot::new(Some("Software Engineer"), Some("BigTech")))
        );

        let opaque = &parsed.rows[1];
        assert_eq!(opaque.id, "42");
        assert_eq!(opaque.name, None);
        assert_eq!(opaque.baseline(), None);
    }

    #[test]
    fn test_missing_required_columns_are_fatal() {
        let err = parse_profiles("name,title\nJane,CTO\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("identifier"));

        let err = parse_profiles("id,title\n42,CTO\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_blank_identifier_is_a_row_error() {
        let csv = "id,name\n,Nobody\n7,Someone\n\n";
        let parsed = parse_profiles(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.invalid.len(), 1);
        assert_eq!(parsed.invalid[0].row, 2);
        assert_eq!(parsed.total(), 2);
    }

    #[test]
    fn test_load_profiles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile_id,name,title").unwrap();
        writeln!(file, "42,Ada,Software Engineer").unwrap();

        let parsed = load_profiles(file.path()).unwrap();
        assert_eq!(parsed.rows[0].baseline_title.as_deref(), Some("Software Engineer"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_profiles(Path::new("/nonexistent/profiles.csv")).is_err());
    }
}
