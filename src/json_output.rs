//! JSON output format for test results
//!
//! `--format json` for the `test` and `batch` subcommands

use crate::discrimination::TestResults;
use serde::{Deserialize, Serialize};

/// Results of one panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPanelResult {
    /// Panel label (batch mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    #[serde(flatten)]
    pub results: TestResults,
}

/// A panel that could not be analysed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPanelError {
    pub panel: String,
    pub error: String,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub results: Vec<JsonPanelResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonPanelError>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "thurstone-json-v1".to_string(),
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_result(&mut self, panel: Option<String>, results: TestResults) {
        self.results.push(JsonPanelResult { panel, results });
    }

    pub fn add_error(&mut self, panel: impl Into<String>, error: impl ToString) {
        self.errors.push(JsonPanelError {
            panel: panel.into(),
            error: error.to_string(),
        });
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
