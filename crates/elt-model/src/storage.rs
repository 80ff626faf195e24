//! Persisted (flattened) shapes of lines and rules.

use serde::{Deserialize, Serialize};

use crate::{CellValue, ModelError, PlaceholderKey};

/// Value of a persisted line field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Same value on the root row only.
    Scalar(CellValue),
    /// Substituted from the matched rule.
    Lookup(PlaceholderKey),
    /// One value per time-series step; `None` marks an absent step.
    TimeSeries(Vec<Option<CellValue>>),
}

/// One field of a persisted line: `{key, value}` or `{key, lookup}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLineField", into = "RawLineField")]
pub struct LineField {
    pub key: String,
    pub value: FieldValue,
}

impl LineField {
    pub fn new(key: impl Into<String>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A persisted line: an ordered list of fields.
pub type Line = Vec<LineField>;

#[derive(Serialize, Deserialize)]
struct RawLineField {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<ValueSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lookup: Option<String>,
}

impl TryFrom<RawLineField> for LineField {
    type Error = ModelError;

    fn try_from(raw: RawLineField) -> Result<Self, Self::Error> {
        let value = match (raw.value, raw.lookup) {
            (Some(ValueSpec::Single(value)), None) => FieldValue::Scalar(value),
            (Some(ValueSpec::Series(values)), None) => FieldValue::TimeSeries(values),
            (None, Some(lookup)) => FieldValue::Lookup(PlaceholderKey::new(lookup)?),
            _ => return Err(ModelError::AmbiguousLineField { key: raw.key }),
        };
        Ok(Self {
            key: raw.key,
            value,
        })
    }
}

impl From<LineField> for RawLineField {
    fn from(field: LineField) -> Self {
        let (value, lookup) = match field.value {
            FieldValue::Scalar(value) => (Some(ValueSpec::Single(value)), None),
            FieldValue::TimeSeries(values) => (Some(ValueSpec::Series(values)), None),
            FieldValue::Lookup(key) => (None, Some(key.as_str().to_string())),
        };
        Self {
            key: field.key,
            value,
            lookup,
        }
    }
}

/// A persisted value: one scalar or one slot per placeholder key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Series(Vec<Option<CellValue>>),
    Single(CellValue),
}

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
        }
    }
}

/// One header condition of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Header name.
    pub key: String,
    pub operator: Operator,
    pub value: CellValue,
    /// Interpolation points after the root, one per nested row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_values: Option<Vec<Option<CellValue>>>,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<CellValue>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
            children_values: None,
        }
    }
}

/// One placeholder value of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleValue {
    /// Persisted placeholder key.
    pub key: PlaceholderKey,
    /// Root row value; `None` when only nested rows carry one.
    pub value: Option<ValueSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_values: Option<Vec<Option<ValueSpec>>>,
}

impl RuleValue {
    pub fn new(key: PlaceholderKey, value: ValueSpec) -> Self {
        Self {
            key,
            value: Some(value),
            children_values: None,
        }
    }

    pub fn has_children(&self) -> bool {
        self.children_values.is_some()
    }
}

/// A persisted rule: conditions → values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub values: Vec<RuleValue>,
}

impl Rule {
    /// True once interpolation points have been folded into this rule.
    pub fn has_children(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.children_values.is_some())
            || self.values.iter().any(RuleValue::has_children)
    }

    pub fn condition(&self, key: &str) -> Option<&Condition> {
        self.conditions.iter().find(|condition| condition.key == key)
    }
}
