//! Table documents: the JSON files the CLI reads and writes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use elt_model::{Combination, Configuration, HeaderTypes, Line, Rule};

/// A persisted lookup table with everything needed to load it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    pub configuration: Configuration,
    #[serde(default)]
    pub header_types: HeaderTypes,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Real attribute combinations, for reachability checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combinations: Option<Vec<Combination>>,
}

impl TableDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse table document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("load {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize table document")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("write {}", path.display()))
    }
}
