use std::fmt;

use serde::{Deserialize, Serialize};

/// A single spreadsheet cell. CSV exports only ever produce text; integers
/// come from JSON endpoints such as the sprint listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Integer literal, written to the sheet as a number.
    Integer(i64),
    /// Plain text, written verbatim.
    Text(String),
}

impl Cell {
    /// The empty text cell used to pad narrower field groups.
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Text(value) => f.write_str(value),
        }
    }
}

/// Ordered sequence of cells.
pub type Row = Vec<Cell>;

/// One export page: the header line followed by its data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Page {
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }
}

/// Header plus data rows in which every row is exactly as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedTable {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl UnifiedTable {
    /// Width of the table in columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Whether the table carries no data rows. A header alone counts as empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Workbook URL plus tab title identifying where a table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_url: String,
    pub sheet_name: String,
}

impl SheetTarget {
    pub fn new(spreadsheet_url: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_url: spreadsheet_url.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

/// Persisted properties of one tab as reported by the spreadsheet API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    pub row_count: u64,
    pub column_count: u64,
}
