//! Validation issue types.
//!
//! Every data-shape problem is reported as an [`Issue`] attached to a row or
//! field; nothing here is fatal.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{HeaderType, PlaceholderKey, RowId};

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must fix before the table can be saved.
    Error,
    /// Should review.
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// Issue category, used for grouping in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Header value checks (ranges, types, required values).
    Header,
    /// Interpolation chain checks.
    Interpolation,
    /// Rule reachability and overlap.
    Coverage,
    /// Placeholder substitution.
    Materialization,
    /// Line template shape.
    Shape,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Header => "Header",
            Self::Interpolation => "Interpolation",
            Self::Coverage => "Coverage",
            Self::Materialization => "Materialization",
            Self::Shape => "Shape",
        }
    }
}

/// Why a required value is reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredReason {
    /// Ratio or interpolation cell left empty.
    EmptyValue,
    /// Interpolation root without any following step.
    ChainTooShort,
    /// Interpolation step without a preceding row.
    MissingPreviousPoint,
}

/// Validation issue; each variant carries only its needed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Issue {
    /// Range upper bound below its lower bound.
    HeaderRange {
        header: String,
        min: String,
        max: String,
    },
    /// Ratio/interpolation value missing.
    RequiredValue {
        header: String,
        reason: RequiredReason,
    },
    /// Interpolation step repeats the preceding step's value.
    DuplicateInterpolationValue { header: String, value: String },
    /// Ratio value of zero.
    NonZeroValue { header: String },
    /// Percent ratio outside [0, 100].
    PercentOutOfBounds { header: String, value: String },
    /// Cell not readable as the header type.
    InvalidValueType {
        header: String,
        expected: HeaderType,
        value: String,
    },
    /// No real attribute combination reaches the rule.
    InvalidCombination,
    /// Rule region intersects other rules.
    OverlappingCombination { with: Vec<RowId> },
    /// Placeholder left unresolved on a virtual line.
    MaterializationRequiredValue {
        field: String,
        placeholder: PlaceholderKey,
    },
    /// Time-series fields of one line disagree on length.
    MismatchedSeriesLength {
        field: String,
        expected: usize,
        found: usize,
    },
}

impl Issue {
    /// Stable rule identifier.
    pub fn rule_id(&self) -> &'static str {
        match self {
            Issue::HeaderRange { .. } => "ELT0001",
            Issue::RequiredValue { .. } => "ELT0002",
            Issue::DuplicateInterpolationValue { .. } => "ELT0003",
            Issue::NonZeroValue { .. } => "ELT0004",
            Issue::PercentOutOfBounds { .. } => "ELT0005",
            Issue::InvalidValueType { .. } => "ELT0006",
            Issue::InvalidCombination => "ELT0101",
            Issue::OverlappingCombination { .. } => "ELT0102",
            Issue::MaterializationRequiredValue { .. } => "ELT0201",
            Issue::MismatchedSeriesLength { .. } => "ELT0301",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Issue::HeaderRange { .. }
            | Issue::NonZeroValue { .. }
            | Issue::PercentOutOfBounds { .. }
            | Issue::InvalidValueType { .. } => Category::Header,
            Issue::RequiredValue { reason, .. } => match reason {
                RequiredReason::EmptyValue => Category::Header,
                RequiredReason::ChainTooShort | RequiredReason::MissingPreviousPoint => {
                    Category::Interpolation
                }
            },
            Issue::DuplicateInterpolationValue { .. } => Category::Interpolation,
            Issue::InvalidCombination | Issue::OverlappingCombination { .. } => {
                Category::Coverage
            }
            Issue::MaterializationRequiredValue { .. } => Category::Materialization,
            Issue::MismatchedSeriesLength { .. } => Category::Shape,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            // Rules may become reachable as the population grows.
            Issue::InvalidCombination => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Header-level issues block the coverage analysis.
    pub fn is_header_level(&self) -> bool {
        matches!(self.category(), Category::Header | Category::Interpolation)
    }

    pub fn message(&self) -> String {
        match self {
            Issue::HeaderRange { header, min, max } => {
                format!("{header}: maximum {max} is below minimum {min}")
            }
            Issue::RequiredValue { header, reason } => match reason {
                RequiredReason::EmptyValue => format!("{header}: value is required"),
                RequiredReason::ChainTooShort => {
                    format!("{header}: interpolation needs at least two points")
                }
                RequiredReason::MissingPreviousPoint => {
                    format!("{header}: interpolation step has no previous point")
                }
            },
            Issue::DuplicateInterpolationValue { header, value } => {
                format!("{header}: value {value} repeats the previous interpolation point")
            }
            Issue::NonZeroValue { header } => format!("{header}: ratio must not be zero"),
            Issue::PercentOutOfBounds { header, value } => {
                format!("{header}: {value} is outside 0-100")
            }
            Issue::InvalidValueType {
                header,
                expected,
                value,
            } => format!("{header}: '{value}' is not a valid {expected}"),
            Issue::InvalidCombination => {
                "No existing header combination matches this rule".to_string()
            }
            Issue::OverlappingCombination { with } => {
                format!("Rule overlaps with {} other rule(s)", with.len())
            }
            Issue::MaterializationRequiredValue { field, placeholder } => {
                format!("{field}: lookup value {placeholder} is required")
            }
            Issue::MismatchedSeriesLength {
                field,
                expected,
                found,
            } => format!("{field}: series has {found} steps, expected {expected}"),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id(), self.message())
    }
}

/// Validation annotations carried by a row envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowValidation {
    /// Field-scoped issues keyed by column id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<Issue>>,
    /// Row-scoped issues.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row: Vec<Issue>,
}

impl RowValidation {
    pub fn push_field(&mut self, column: impl Into<String>, issue: Issue) {
        self.fields.entry(column.into()).or_default().push(issue);
    }

    pub fn push_row(&mut self, issue: Issue) {
        self.row.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty() && self.fields.values().all(Vec::is_empty)
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.fields.values().flatten().chain(self.row.iter())
    }

    pub fn error_count(&self) -> usize {
        self.issues()
            .filter(|issue| issue.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues()
            .filter(|issue| issue.severity() == Severity::Warning)
            .count()
    }

    pub fn has_header_errors(&self) -> bool {
        self.issues().any(Issue::is_header_level)
    }
}
