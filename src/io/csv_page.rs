use csv::ReaderBuilder;

use crate::error::{Result, ToolError};
use crate::model::{Cell, Page};

/// Field separator requested from the JIRA CSV export.
pub const DELIMITER: u8 = b'|';

/// Parses one export page into its header and data rows.
///
/// Lines may differ in length; padding them is the job of
/// [`reconcile`](crate::reconcile). Quote characters in the middle of a field
/// are kept literally. `origin` is only used to give errors some context.
pub fn parse_page(data: &[u8], origin: &str) -> Result<Page> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = reader.byte_records();
    let header = match records.next() {
        Some(record) => record
            .map_err(|source| malformed(origin, source))?
            .iter()
            .map(decode)
            .collect(),
        None => return Ok(Page::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|source| malformed(origin, source))?;
        rows.push(record.iter().map(|field| Cell::Text(decode(field))).collect());
    }

    Ok(Page::new(header, rows))
}

// Invalid UTF-8 sequences become U+FFFD instead of failing the page.
fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn malformed(origin: &str, source: csv::Error) -> ToolError {
    ToolError::MalformedInput {
        origin: origin.to_string(),
        source,
    }
}
