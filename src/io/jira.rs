use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::csv_page::parse_page;
use crate::model::{Cell, Page, Row, UnifiedTable};
use crate::reconcile::reconcile;

/// Rows requested per export page. JIRA caps `tempMax` at 1000.
pub const DEFAULT_PAGE_SIZE: usize = 999;

static FILTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.*)/issues/\?filter=(?P<id>\d+)$").expect("Hardcode regex pattern")
});

/// A saved JIRA filter, as found in the browser address bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterReference {
    pub base_url: String,
    pub filter_id: String,
}

impl FilterReference {
    /// Extracts the server base URL and filter id from
    /// `<base>/issues/?filter=<id>`.
    pub fn parse(url: &str) -> Result<Self> {
        let captures = FILTER_PATTERN
            .captures(url)
            .ok_or_else(|| ToolError::InvalidFilterReference(url.to_string()))?;
        Ok(Self {
            base_url: captures["base"].to_string(),
            filter_id: captures["id"].to_string(),
        })
    }

    /// CSV export location for the filter's current fields.
    pub fn export_url(&self) -> String {
        let Self {
            base_url,
            filter_id,
        } = self;
        format!(
            "{base_url}/sr/jira.issueviews:searchrequest-csv-current-fields/{filter_id}/SearchRequest-{filter_id}.csv"
        )
    }
}

/// URL of the page starting at row `start`.
pub fn page_url(export_url: &str, page_size: usize, start: usize) -> String {
    format!("{export_url}?delimiter=%7C&jqlQuery=&tempMax={page_size}&pager/start={start}")
}

/// Authenticated GET access to the source system.
pub trait JiraSource {
    /// Returns the body of a successful response. Non-success statuses are
    /// reported as [`ToolError::SourceFetch`].
    fn get(&mut self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client sending a personal access token as bearer credential.
pub struct JiraClient {
    client: Client,
    token: String,
}

impl JiraClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ToolError::http("<client>", source))?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl JiraSource for JiraClient {
    fn get(&mut self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "text/csv;charset=UTF-8")
            .bearer_auth(&self.token)
            .send()
            .map_err(|source| ToolError::http(url, source))?;

        let status = response.status();
        let body = response
            .bytes()
            .map_err(|source| ToolError::http(url, source))?;

        if !status.is_success() {
            return Err(ToolError::SourceFetch {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

/// Downloads every page of the filter's CSV export, in order.
///
/// Stops at the first page holding fewer than `page_size` data rows, so a
/// result that is an exact multiple of the page size costs one extra, empty
/// request. Any failed page fails the whole fetch.
#[instrument(
    level = "info",
    skip_all,
    fields(filter = %filter_url, page_size = page_size)
)]
pub fn fetch_pages<S: JiraSource>(
    source: &mut S,
    filter_url: &str,
    page_size: usize,
) -> Result<Vec<Page>> {
    let page_size = page_size.max(1);
    let filter = FilterReference::parse(filter_url)?;
    let export_url = filter.export_url();
    debug!(url = %export_url, "csv export url");

    let mut pages = Vec::new();
    let mut start = 0;
    loop {
        let url = page_url(&export_url, page_size, start);
        let body = source.get(&url)?;
        let page = parse_page(&body, &url)?;
        let row_count = page.rows.len();
        debug!(start, row_count, "fetched page");
        pages.push(page);

        if row_count < page_size {
            break;
        }
        start += page_size;
    }

    info!(page_count = pages.len(), "loaded export pages");
    Ok(pages)
}

/// Fetches all pages of a filter and aligns them into one table.
pub fn fetch_filter<S: JiraSource>(
    source: &mut S,
    filter_url: &str,
    page_size: usize,
) -> Result<UnifiedTable> {
    let pages = fetch_pages(source, filter_url, page_size)?;
    Ok(reconcile(&pages))
}

/// Header written above the active sprint listing.
pub const SPRINT_HEADER: [&str; 5] = [
    "Sprint Id",
    "Name",
    "OriginBoardId",
    "Start Date",
    "End Date",
];

#[derive(Debug, Deserialize)]
struct SprintPage {
    #[serde(default)]
    values: Vec<Sprint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sprint {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    origin_board_id: Option<i64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl Sprint {
    fn into_row(self) -> Row {
        vec![
            Cell::Integer(self.id),
            Cell::Text(self.name),
            self.origin_board_id.map(Cell::Integer).unwrap_or_default(),
            Cell::Text(self.start_date.unwrap_or_default()),
            Cell::Text(self.end_date.unwrap_or_default()),
        ]
    }
}

/// Reads an agile sprint listing (`{"values": [...]}`) into a table.
#[instrument(level = "info", skip_all, fields(endpoint = %endpoint))]
pub fn fetch_active_sprints<S: JiraSource>(
    source: &mut S,
    endpoint: &str,
) -> Result<UnifiedTable> {
    let body = source.get(endpoint)?;
    let listing: SprintPage = serde_json::from_slice(&body)?;
    info!(sprint_count = listing.values.len(), "loaded active sprints");

    Ok(UnifiedTable {
        header: SPRINT_HEADER.iter().map(|label| label.to_string()).collect(),
        rows: listing.values.into_iter().map(Sprint::into_row).collect(),
    })
}
