use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while
/// exporting issues from JIRA and writing them to a spreadsheet.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the YAML configuration cannot be decoded.
    #[error("reading {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Transport-level HTTP failure (connection refused, TLS, body decoding).
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Raised when a filter URL does not look like `<base>/issues/?filter=<id>`.
    #[error("invalid JIRA filter reference '{0}'")]
    InvalidFilterReference(String),

    /// Raised when a spreadsheet URL does not carry a workbook id.
    #[error("invalid spreadsheet reference '{0}'")]
    InvalidSheetReference(String),

    /// The source system answered with a non-success status.
    #[error("source fetch from {url} failed with HTTP {status}: {body}")]
    SourceFetch {
        url: String,
        status: u16,
        body: String,
    },

    /// Raised when an export page cannot be tokenized as CSV.
    #[error("malformed CSV input from {origin}: {source}")]
    MalformedInput {
        origin: String,
        #[source]
        source: csv::Error,
    },

    /// Raised when the workbook has no tab with the requested title.
    #[error("sheet '{sheet}' not found in spreadsheet {spreadsheet_id}")]
    SheetNotFound {
        spreadsheet_id: String,
        sheet: String,
    },

    /// The spreadsheet API answered with a non-success status.
    #[error("spreadsheet {stage} failed with HTTP {status}: {body}")]
    DestinationWrite {
        stage: &'static str,
        status: u16,
        body: String,
    },

    /// Raised when a required credential was not supplied by flag or environment.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// Raised when the spreadsheet credential cannot be turned into a token.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The OAuth2 token endpoint refused or failed to answer a token request.
    #[error("requesting a Google access token: {0}")]
    TokenRequest(#[from] yup_oauth2::Error),

    /// Attaches the failing target to an error raised while processing it.
    #[error("processing sheet '{sheet}' of {url}: {source}")]
    Target {
        url: String,
        sheet: String,
        #[source]
        source: Box<ToolError>,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Wraps the error with the spreadsheet target it was raised for.
    pub fn for_target(self, url: &str, sheet: &str) -> Self {
        ToolError::Target {
            url: url.to_string(),
            sheet: sheet.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        ToolError::Http {
            url: url.to_string(),
            source,
        }
    }
}
