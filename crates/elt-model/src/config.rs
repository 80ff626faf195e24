//! Table configuration and range definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellValue, HeaderType, MatchBehavior};

/// Header name → header type.
pub type HeaderTypes = BTreeMap<String, HeaderType>;

/// A concrete attribute set (header name → value) of one entity.
pub type Combination = BTreeMap<String, CellValue>;

/// Persisted lookup table configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Headers used by the rules, in column order.
    pub selected_headers: Vec<String>,
    #[serde(default)]
    pub selected_headers_match_behavior: BTreeMap<String, MatchBehavior>,
    #[serde(default)]
    pub case_insensitive_matching: bool,
}

impl Configuration {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_behavior(mut self, header: impl Into<String>, behavior: MatchBehavior) -> Self {
        self.selected_headers_match_behavior
            .insert(header.into(), behavior);
        self
    }

    #[must_use]
    pub fn with_case_insensitive_matching(mut self, enable: bool) -> Self {
        self.case_insensitive_matching = enable;
        self
    }

    /// Behavior of a header; unlisted headers are regular.
    pub fn behavior(&self, header: &str) -> MatchBehavior {
        self.selected_headers_match_behavior
            .get(header)
            .copied()
            .unwrap_or_default()
    }
}

/// Which storage column(s) encode a header's condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDefinition {
    pub header: String,
    #[serde(rename = "type")]
    pub header_type: HeaderType,
    pub behavior: MatchBehavior,
    /// One column, or `[low, high]`.
    pub column_ids: Vec<String>,
}

impl RangeDefinition {
    pub fn is_range(&self) -> bool {
        self.column_ids.len() == 2
    }

    /// The single column, or the low column of a range.
    pub fn column(&self) -> &str {
        self.column_ids.first().map_or(&self.header, String::as_str)
    }

    pub fn low_column(&self) -> Option<&str> {
        self.is_range().then(|| self.column_ids[0].as_str())
    }

    pub fn high_column(&self) -> Option<&str> {
        self.is_range().then(|| self.column_ids[1].as_str())
    }
}

/// Range definitions of all selected headers, in header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDefinitions {
    pub definitions: Vec<RangeDefinition>,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl RangeDefinitions {
    pub fn get(&self, header: &str) -> Option<&RangeDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.header == header)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RangeDefinition> {
        self.definitions.iter()
    }

    /// Headers acting as conditions.
    pub fn regular(&self) -> impl Iterator<Item = &RangeDefinition> {
        self.definitions
            .iter()
            .filter(|definition| definition.behavior == MatchBehavior::Regular)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The interpolation header, when exactly one header interpolates.
    pub fn interpolation_header(&self) -> Option<&RangeDefinition> {
        let mut interpolating = self
            .definitions
            .iter()
            .filter(|definition| definition.behavior == MatchBehavior::Interpolation);
        let first = interpolating.next()?;
        interpolating.next().is_none().then_some(first)
    }

    /// The shared behavior when every header is ratio, or every header interpolates.
    pub fn uniform_value_behavior(&self) -> Option<MatchBehavior> {
        let first = self.definitions.first()?.behavior;
        let uniform = first != MatchBehavior::Regular
            && self
                .definitions
                .iter()
                .all(|definition| definition.behavior == first);
        uniform.then_some(first)
    }
}
