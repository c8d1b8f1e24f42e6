use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ToolError};
use crate::model::SheetTarget;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "jira2sheets.yml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Filters to export, processed in file order.
    #[serde(default)]
    pub spreadsheets: Vec<Spreadsheet>,
    /// Optional destination for the active sprint listing.
    #[serde(default)]
    pub active_sprints_sheet: Option<ActiveSprintsSheet>,
}

/// One JIRA filter and the tab it is written to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub url: String,
    pub sheet_name: String,
    pub jira_filter: String,
}

impl Spreadsheet {
    pub fn target(&self) -> SheetTarget {
        SheetTarget::new(&self.url, &self.sheet_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSprintsSheet {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sheet_name: String,
    /// Agile REST endpoint returning `{"values": [...]}` sprint objects.
    #[serde(default)]
    pub jira_endpoint: String,
}

impl ActiveSprintsSheet {
    /// The export only runs when every field is filled in.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.sheet_name.is_empty() && !self.jira_endpoint.is_empty()
    }

    pub fn target(&self) -> SheetTarget {
        SheetTarget::new(&self.url, &self.sheet_name)
    }
}

impl Config {
    /// Sprint export settings, if present and complete.
    pub fn active_sprints(&self) -> Option<&ActiveSprintsSheet> {
        self.active_sprints_sheet
            .as_ref()
            .filter(|sheet| sheet.is_configured())
    }
}

/// Reads and decodes a YAML configuration file.
pub fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let source = fs::read_to_string(path)?;
    serde_yaml::from_str(&source).map_err(|source| ToolError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
