// 📥 Roster Feed - where the incoming snapshot comes from
// The published spreadsheet (HTML) in production, a CSV export for offline runs.
// Both go through the same row filter.

use crate::record::{League, Record, COLUMN_COUNT};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Produces a complete incoming snapshot or fails; never a partial one
pub trait RosterSource {
    fn fetch(&self) -> Result<Vec<Record>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Fixed snapshot, handy for replaying a known state
impl RosterSource for Vec<Record> {
    fn fetch(&self) -> Result<Vec<Record>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.len())
    }
}

// ============================================================================
// ROW FILTER
// ============================================================================

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"20\d{2}").expect("valid year pattern"))
}

/// A row is a roster line when it is long enough, starts with a known league
/// code and names the person (first and family name present).
pub fn is_roster_row<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.len() >= COLUMN_COUNT
        && League::from_code(cells[0].as_ref()).is_some()
        && !cells[4].as_ref().is_empty()
        && !cells[5].as_ref().is_empty()
}

/// The contract year embedded anywhere in the cell ("Dec 2025*" → "2025"), else "0"
pub fn extract_end_year(cell: &str) -> String {
    year_pattern()
        .find(cell)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "0".to_string())
}

/// Turn raw table rows into records, dropping headers, blanks and malformed lines
pub fn parse_rows<I>(rows: I) -> Vec<Record>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let mut cells: Vec<String> = row.into_iter().map(|c| c.trim_end().to_string()).collect();
        if !is_roster_row(&cells) {
            skipped += 1;
            continue;
        }
        cells[6] = extract_end_year(&cells[6]);
        cells.truncate(COLUMN_COUNT);
        if let Some(record) = Record::from_fields(&cells) {
            records.push(record);
        }
    }

    debug!(kept = records.len(), skipped, "parsed feed rows");
    records
}

// ============================================================================
// CSV FEED
// ============================================================================

/// Headerless CSV with the 11 roster columns in feed order
#[derive(Debug, Clone)]
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFeed { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterSource for CsvFeed {
    fn fetch(&self) -> Result<Vec<Record>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open CSV feed {}", self.path.display()))?;

        let rows = rdr
            .records()
            .map(|row| row.map(|r| r.iter().map(str::to_string).collect::<Vec<String>>()))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read CSV feed row")?;

        Ok(parse_rows(rows))
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }
}

// ============================================================================
// SPREADSHEET FEED (published HTML)
// ============================================================================

#[cfg(feature = "net")]
pub use spreadsheet::SpreadsheetFeed;

#[cfg(feature = "net")]
mod spreadsheet {
    use super::{parse_rows, RosterSource};
    use crate::record::Record;
    use anyhow::{anyhow, Context, Result};
    use scraper::{Html, Selector};
    use std::time::Duration;
    use tracing::info;

    const TIMEOUT: Duration = Duration::from_secs(10);

    pub struct SpreadsheetFeed {
        url: String,
        http: reqwest::blocking::Client,
    }

    impl SpreadsheetFeed {
        pub fn new(url: impl Into<String>) -> Result<Self> {
            let http = reqwest::blocking::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .context("Failed to create HTTP client")?;
            Ok(SpreadsheetFeed { url: url.into(), http })
        }
    }

    /// Every `<tr>` becomes one row of its `<td>` texts
    pub fn table_rows(html: &str) -> Result<Vec<Vec<String>>> {
        let document = Html::parse_document(html);
        let tr = Selector::parse("tr").map_err(|e| anyhow!("invalid selector: {e}"))?;
        let td = Selector::parse("td").map_err(|e| anyhow!("invalid selector: {e}"))?;

        Ok(document
            .select(&tr)
            .map(|row| row.select(&td).map(|cell| cell.text().collect::<String>()).collect())
            .collect())
    }

    impl RosterSource for SpreadsheetFeed {
        fn fetch(&self) -> Result<Vec<Record>> {
            let body = self
                .http
                .get(&self.url)
                .send()
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Failed to fetch roster feed {}", self.url))?
                .text()
                .context("Failed to read roster feed body")?;

            let records = parse_rows(table_rows(&body)?);
            info!(count = records.len(), "roster feed fetched");
            Ok(records)
        }

        fn describe(&self) -> String {
            format!("spreadsheet {}", self.url)
        }
    }

}

// ============================================================================
// TESTS
// ============================================================================
