use tracing::{info, instrument, warn};

use crate::config::{ActiveSprintsSheet, Config, Spreadsheet};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::io::jira::{self, DEFAULT_PAGE_SIZE, JiraClient, JiraSource};
use crate::io::sheets::{self, GoogleSheetsClient, SheetsApi};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Tabs that received new values.
    pub sheets_written: usize,
    /// Filters that returned no issues; their tabs were left untouched.
    pub sheets_skipped: usize,
    /// Data rows written across all tabs, headers excluded.
    pub rows_written: usize,
}

/// Runs the configured exports one after the other.
pub struct Importer<S, A> {
    source: S,
    sheets: A,
    page_size: usize,
}

impl<S: JiraSource, A: SheetsApi> Importer<S, A> {
    pub fn new(source: S, sheets: A) -> Self {
        Self {
            source,
            sheets,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Processes every configured spreadsheet, then the sprint listing. The
    /// first failing target aborts the run.
    #[instrument(
        level = "info",
        skip_all,
        fields(targets = config.spreadsheets.len())
    )]
    pub fn run(&mut self, config: &Config) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for spreadsheet in &config.spreadsheets {
            let written = self
                .import_spreadsheet(spreadsheet)
                .map_err(|err| err.for_target(&spreadsheet.url, &spreadsheet.sheet_name))?;
            summary.record(written);
        }

        if let Some(sprints) = config.active_sprints() {
            let written = self
                .export_active_sprints(sprints)
                .map_err(|err| err.for_target(&sprints.url, &sprints.sheet_name))?;
            summary.record(written);
        }

        info!(
            sheets_written = summary.sheets_written,
            sheets_skipped = summary.sheets_skipped,
            rows_written = summary.rows_written,
            "import finished"
        );
        Ok(summary)
    }

    /// Exports one filter into its tab. Returns the number of data rows
    /// written, or `None` when the filter matched nothing.
    #[instrument(
        level = "info",
        skip_all,
        fields(spreadsheet = %spreadsheet.url, sheet = %spreadsheet.sheet_name)
    )]
    pub fn import_spreadsheet(&mut self, spreadsheet: &Spreadsheet) -> Result<Option<usize>> {
        let table =
            jira::fetch_filter(&mut self.source, &spreadsheet.jira_filter, self.page_size)?;
        if table.is_empty() {
            warn!("no data loaded");
            return Ok(None);
        }
        sheets::write_table(&mut self.sheets, &spreadsheet.target(), &table)?;
        Ok(Some(table.rows.len()))
    }

    #[instrument(
        level = "info",
        skip_all,
        fields(spreadsheet = %sprints.url, sheet = %sprints.sheet_name)
    )]
    fn export_active_sprints(&mut self, sprints: &ActiveSprintsSheet) -> Result<Option<usize>> {
        let table = jira::fetch_active_sprints(&mut self.source, &sprints.jira_endpoint)?;
        if table.is_empty() {
            warn!("no active sprints");
            return Ok(None);
        }
        sheets::write_table(&mut self.sheets, &sprints.target(), &table)?;
        Ok(Some(table.rows.len()))
    }

    /// Hands back the transport halves, mostly for inspection in tests.
    pub fn into_parts(self) -> (S, A) {
        (self.source, self.sheets)
    }
}

impl ImportSummary {
    fn record(&mut self, written: Option<usize>) {
        match written {
            Some(rows) => {
                self.sheets_written += 1;
                self.rows_written += rows;
            }
            None => self.sheets_skipped += 1,
        }
    }
}

/// Runs an import against the live JIRA and Google Sheets endpoints.
pub fn import(
    config: &Config,
    credentials: &Credentials,
    page_size: usize,
) -> Result<ImportSummary> {
    let source = JiraClient::new(credentials.jira_token())?;
    let sheets = GoogleSheetsClient::new(credentials.google().token_provider()?)?;
    Importer::new(source, sheets)
        .with_page_size(page_size)
        .run(config)
}
