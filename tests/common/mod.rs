#![allow(dead_code)]

pub mod http;

use std::collections::{HashMap, VecDeque};

use jira2sheets::io::jira::JiraSource;
use jira2sheets::io::sheets::{Request, SheetsApi, ValueRange};
use jira2sheets::model::{Cell, SheetProperties};
use jira2sheets::{Result, ToolError};

/// Canned reply served by [`FakeJira`].
pub enum Reply {
    Body(Vec<u8>),
    Status(u16, &'static str),
}

/// Serves queued replies in order and remembers every requested URL.
#[derive(Default)]
pub struct FakeJira {
    replies: VecDeque<Reply>,
    pub requests: Vec<String>,
}

impl FakeJira {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    /// One CSV page per entry, each with `count` data rows.
    pub fn with_page_sizes(header: &[&str], counts: &[usize]) -> Self {
        Self::new(
            counts
                .iter()
                .enumerate()
                .map(|(page, &count)| Reply::Body(csv_page(header, page, count).into_bytes())),
        )
    }
}

impl JiraSource for FakeJira {
    fn get(&mut self, url: &str) -> Result<Vec<u8>> {
        self.requests.push(url.to_string());
        match self.replies.pop_front() {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status, body)) => Err(ToolError::SourceFetch {
                url: url.to_string(),
                status,
                body: body.to_string(),
            }),
            None => panic!("unexpected request to {url}"),
        }
    }
}

/// Pipe-delimited page with `count` rows whose cells read `p<page>r<row>c<col>`.
pub fn csv_page(header: &[&str], page: usize, count: usize) -> String {
    let mut text = header.join("|");
    text.push('\n');
    for row in 0..count {
        let cells: Vec<String> = (0..header.len())
            .map(|col| format!("p{page}r{row}c{col}"))
            .collect();
        text.push_str(&cells.join("|"));
        text.push('\n');
    }
    text
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetsCall {
    Metadata(String),
    Update {
        spreadsheet_id: String,
        range: String,
        values: Vec<Vec<Cell>>,
    },
    Batch {
        spreadsheet_id: String,
        requests: Vec<Request>,
    },
}

/// In-memory workbook registry recording every API call.
#[derive(Default)]
pub struct FakeSheets {
    workbooks: HashMap<String, Vec<SheetProperties>>,
    pub calls: Vec<SheetsCall>,
    pub fail_updates: bool,
}

impl FakeSheets {
    pub fn with_sheet(mut self, spreadsheet_id: &str, title: &str, rows: u64, columns: u64) -> Self {
        let sheets = self.workbooks.entry(spreadsheet_id.to_string()).or_default();
        let sheet_id = sheets.len() as i64 * 100;
        sheets.push(SheetProperties {
            sheet_id,
            title: title.to_string(),
            row_count: rows,
            column_count: columns,
        });
        self
    }

    pub fn updates(&self) -> Vec<&SheetsCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, SheetsCall::Update { .. }))
            .collect()
    }

    pub fn batches(&self) -> Vec<&Vec<Request>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SheetsCall::Batch { requests, .. } => Some(requests),
                _ => None,
            })
            .collect()
    }
}

impl SheetsApi for FakeSheets {
    fn sheet_properties(&mut self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>> {
        self.calls.push(SheetsCall::Metadata(spreadsheet_id.to_string()));
        self.workbooks
            .get(spreadsheet_id)
            .cloned()
            .ok_or(ToolError::DestinationWrite {
                stage: "metadata read",
                status: 404,
                body: "Requested entity was not found.".to_string(),
            })
    }

    fn update_values(&mut self, spreadsheet_id: &str, values: &ValueRange<'_>) -> Result<()> {
        if self.fail_updates {
            return Err(ToolError::DestinationWrite {
                stage: "value update",
                status: 500,
                body: "backend error".to_string(),
            });
        }
        self.calls.push(SheetsCall::Update {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: values.range.clone(),
            values: values.values.iter().map(|row| row.to_vec()).collect(),
        });
        Ok(())
    }

    fn batch_update(&mut self, spreadsheet_id: &str, requests: &[Request]) -> Result<()> {
        self.calls.push(SheetsCall::Batch {
            spreadsheet_id: spreadsheet_id.to_string(),
            requests: requests.to_vec(),
        });
        Ok(())
    }
}

/// Builds a row of text cells.
pub fn row(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|cell| Cell::from(*cell)).collect()
}

pub fn labels(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}
