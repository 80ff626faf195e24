//! Cell values and header typing.
//!
//! Lookup tables hold loosely typed grid cells. The header type decides how
//! two cells compare, so every comparison goes through [`compare_values`] or
//! [`values_equal`] with the header's [`HeaderType`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A single scalar cell, persisted as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns true for text cells holding only whitespace.
    ///
    /// Cleared grid cells arrive as empty text and are treated as absent.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Numeric view of the cell; numeric text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Calendar date view of the cell (`YYYY-MM-DD`, time suffix ignored).
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                let date_part = trimmed.get(..10).unwrap_or(trimmed);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
            }
            Self::Number(_) | Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(text) => match text.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" => Some(true),
                "false" | "no" | "n" => Some(false),
                _ => None,
            },
            Self::Number(_) => None,
        }
    }

    /// Returns true if the cell can be read as the given header type.
    pub fn conforms_to(&self, header_type: HeaderType) -> bool {
        match header_type {
            HeaderType::String => true,
            HeaderType::Number | HeaderType::Percent => self.as_f64().is_some(),
            HeaderType::Date => self.as_date().is_some(),
            HeaderType::Boolean => self.as_bool().is_some(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => f.write_str(&format_numeric(*value)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Formats a floating-point number without trailing zeros after the decimal.
///
/// ```
/// use elt_model::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Data type of a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
    #[default]
    String,
    Number,
    Percent,
    Date,
    Boolean,
}

impl HeaderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Percent => "percent",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }

    /// Ordered types can express a low/high range condition.
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Number | Self::Percent | Self::Date)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Percent)
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" => Ok(Self::String),
            "number" | "numeric" => Ok(Self::Number),
            "percent" => Ok(Self::Percent),
            "date" => Ok(Self::Date),
            "boolean" | "bool" => Ok(Self::Boolean),
            _ => Err(ModelError::UnknownHeaderType(s.to_string())),
        }
    }
}

/// Table-wide match behavior of a header.
///
/// - **Regular**: the header is a condition (equality or range).
/// - **Ratio**: the header supplies a single scaling value.
/// - **Interpolation**: the header supplies a chain of points across nested rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchBehavior {
    #[default]
    Regular,
    Ratio,
    Interpolation,
}

impl MatchBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Ratio => "ratio",
            Self::Interpolation => "interpolation",
        }
    }
}

impl fmt::Display for MatchBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchBehavior {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "ratio" => Ok(Self::Ratio),
            "interpolation" => Ok(Self::Interpolation),
            _ => Err(ModelError::UnknownMatchBehavior(s.to_string())),
        }
    }
}

/// Orders two cells under a header type.
///
/// Returns `None` when either side cannot be read as that type.
pub fn compare_values(a: &CellValue, b: &CellValue, header_type: HeaderType) -> Option<Ordering> {
    match header_type {
        HeaderType::Number | HeaderType::Percent => a.as_f64()?.partial_cmp(&b.as_f64()?),
        HeaderType::Date => Some(a.as_date()?.cmp(&b.as_date()?)),
        HeaderType::Boolean => Some(a.as_bool()?.cmp(&b.as_bool()?)),
        HeaderType::String => Some(a.to_string().cmp(&b.to_string())),
    }
}

/// Equality of two cells under a header type.
///
/// Falls back to structural equality when the typed comparison fails.
pub fn values_equal(
    a: &CellValue,
    b: &CellValue,
    header_type: HeaderType,
    case_insensitive: bool,
) -> bool {
    if header_type == HeaderType::String {
        let (left, right) = (a.to_string(), b.to_string());
        return if case_insensitive {
            left.trim().to_lowercase() == right.trim().to_lowercase()
        } else {
            left == right
        };
    }
    match compare_values(a, b, header_type) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}
