use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::credentials::TokenProvider;
use crate::error::{Result, ToolError};
use crate::model::{Cell, SheetProperties, SheetTarget, UnifiedTable};

/// Root of the Google Sheets v4 REST API.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

static SPREADSHEET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://docs\.google\.com/spreadsheets/d/(?P<id>[^/]+)/edit.*$")
        .expect("Hardcode regex pattern")
});

/// Extracts the workbook id from a spreadsheet's edit URL.
pub fn spreadsheet_id(url: &str) -> Result<String> {
    SPREADSHEET_PATTERN
        .captures(url)
        .map(|captures| captures["id"].to_string())
        .ok_or_else(|| ToolError::InvalidSheetReference(url.to_string()))
}

/// A1 notation covering whole rows `1..=row_count` of the named tab.
pub fn row_range(sheet_name: &str, row_count: usize) -> String {
    format!("'{}'!1:{row_count}", sheet_name.replace('\'', "''"))
}

/// Literal values for one rectangular block, major dimension rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange<'a> {
    pub range: String,
    pub major_dimension: &'static str,
    pub values: Vec<&'a [Cell]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Rows,
    Columns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    /// First index removed; the range is open-ended.
    pub start_index: u64,
}

/// Structural change sent through `spreadsheets.batchUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    DeleteDimension { range: DimensionRange },
}

impl Request {
    fn delete_from(sheet_id: i64, dimension: Dimension, start_index: u64) -> Self {
        Request::DeleteDimension {
            range: DimensionRange {
                sheet_id,
                dimension,
                start_index,
            },
        }
    }
}

/// The subset of the spreadsheet API the writer needs.
pub trait SheetsApi {
    /// Properties of every tab in the workbook.
    fn sheet_properties(&mut self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>>;

    /// Overwrites a range with raw (not formula-evaluated) values.
    fn update_values(&mut self, spreadsheet_id: &str, values: &ValueRange<'_>) -> Result<()>;

    /// Applies structural changes in one request.
    fn batch_update(&mut self, spreadsheet_id: &str, requests: &[Request]) -> Result<()>;
}

/// Requests removing the rows and columns of `sheet` that lie beyond a block
/// of `row_count` rows by `column_count` columns.
pub fn plan_trim(sheet: &SheetProperties, row_count: usize, column_count: usize) -> Vec<Request> {
    let mut requests = Vec::new();
    let (row_count, column_count) = (row_count as u64, column_count as u64);
    if sheet.row_count > row_count {
        requests.push(Request::delete_from(sheet.sheet_id, Dimension::Rows, row_count));
    }
    if sheet.column_count > column_count {
        requests.push(Request::delete_from(
            sheet.sheet_id,
            Dimension::Columns,
            column_count,
        ));
    }
    requests
}

/// Replaces the content of the target tab with `table` and shrinks the tab to
/// the table's extent. Other tabs of the workbook are left alone.
#[instrument(
    level = "info",
    skip_all,
    fields(spreadsheet = %target.spreadsheet_url, sheet = %target.sheet_name)
)]
pub fn write_table<A: SheetsApi>(
    api: &mut A,
    target: &SheetTarget,
    table: &UnifiedTable,
) -> Result<()> {
    let spreadsheet_id = spreadsheet_id(&target.spreadsheet_url)?;
    let sheet = api
        .sheet_properties(&spreadsheet_id)?
        .into_iter()
        .find(|sheet| sheet.title == target.sheet_name)
        .ok_or_else(|| ToolError::SheetNotFound {
            spreadsheet_id: spreadsheet_id.clone(),
            sheet: target.sheet_name.clone(),
        })?;
    debug!(
        sheet_id = sheet.sheet_id,
        rows = sheet.row_count,
        columns = sheet.column_count,
        "resolved sheet"
    );

    let header: Vec<Cell> = table
        .header
        .iter()
        .map(|label| Cell::from(label.as_str()))
        .collect();
    let row_count = table.rows.len() + 1;
    let values = ValueRange {
        range: row_range(&target.sheet_name, row_count),
        major_dimension: "ROWS",
        values: std::iter::once(header.as_slice())
            .chain(table.rows.iter().map(Vec::as_slice))
            .collect(),
    };
    api.update_values(&spreadsheet_id, &values)?;
    info!(row_count, column_count = table.width(), "values written");

    let requests = plan_trim(&sheet, row_count, table.width());
    if !requests.is_empty() {
        debug!(?requests, "trimming sheet");
        api.batch_update(&spreadsheet_id, &requests)?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetPropertiesJson,
}

// The API omits fields holding their default value, sheet id 0 included.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesJson {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: u64,
    #[serde(default)]
    column_count: u64,
}

impl SheetPropertiesJson {
    fn into_properties(self) -> SheetProperties {
        SheetProperties {
            sheet_id: self.sheet_id,
            title: self.title,
            row_count: self.grid_properties.row_count,
            column_count: self.grid_properties.column_count,
        }
    }
}

#[derive(Serialize)]
struct BatchUpdate<'a> {
    requests: &'a [Request],
}

/// Blocking Google Sheets client. Every request asks the token provider for
/// a current bearer token.
pub struct GoogleSheetsClient {
    client: Client,
    tokens: Box<dyn TokenProvider>,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(tokens: Box<dyn TokenProvider>) -> Result<Self> {
        Self::with_base_url(tokens, SHEETS_API_BASE)
    }

    /// Targets an alternative API root, e.g. a local emulator.
    pub fn with_base_url(
        tokens: Box<dyn TokenProvider>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ToolError::http("<client>", source))?;
        Ok(Self {
            client,
            tokens,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = |reason: String| {
            ToolError::InvalidSheetReference(format!("{}: {reason}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check(stage: &'static str, url: &Url, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .map_err(|source| ToolError::http(url.as_str(), source))?;
        Err(ToolError::DestinationWrite {
            stage,
            status: status.as_u16(),
            body,
        })
    }
}

impl fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SheetsApi for GoogleSheetsClient {
    fn sheet_properties(&mut self, spreadsheet_id: &str) -> Result<Vec<SheetProperties>> {
        let mut url = self.endpoint(&[spreadsheet_id])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");

        let token = self.tokens.access_token()?;
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .map_err(|source| ToolError::http(url.as_str(), source))?;
        let metadata: SpreadsheetMetadata = Self::check("metadata read", &url, response)?
            .json()
            .map_err(|source| ToolError::http(url.as_str(), source))?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|entry| entry.properties.into_properties())
            .collect())
    }

    fn update_values(&mut self, spreadsheet_id: &str, values: &ValueRange<'_>) -> Result<()> {
        let mut url = self.endpoint(&[spreadsheet_id, "values", values.range.as_str()])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let token = self.tokens.access_token()?;
        let response = self
            .client
            .put(url.clone())
            .bearer_auth(token)
            .json(values)
            .send()
            .map_err(|source| ToolError::http(url.as_str(), source))?;
        Self::check("value update", &url, response)?;
        Ok(())
    }

    fn batch_update(&mut self, spreadsheet_id: &str, requests: &[Request]) -> Result<()> {
        let action = format!("{spreadsheet_id}:batchUpdate");
        let url = self.endpoint(&[action.as_str()])?;

        let token = self.tokens.access_token()?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(token)
            .json(&BatchUpdate { requests })
            .send()
            .map_err(|source| ToolError::http(url.as_str(), source))?;
        Self::check("batch update", &url, response)?;
        Ok(())
    }
}
