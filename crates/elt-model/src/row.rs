//! Editable row envelopes and row groups.
//!
//! A row keeps its metadata (id, nesting tag, validation) apart from its
//! dynamic field map, so user field names can never collide with metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CellValue, PlaceholderKey, RowValidation};

/// Identifier of an editable row, stable for the lifetime of a table session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a row is nested under its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NestedBehavior {
    /// A later step of a line's time series.
    TimeSeries,
    /// A later point of a rule's interpolation chain.
    Interpolation,
}

/// A line row cell: a concrete value or a placeholder awaiting a rule value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowCell {
    Value(CellValue),
    Lookup(PlaceholderKey),
}

impl RowCell {
    pub fn as_value(&self) -> Option<&CellValue> {
        match self {
            RowCell::Value(value) => Some(value),
            RowCell::Lookup(_) => None,
        }
    }

    pub fn as_lookup(&self) -> Option<&PlaceholderKey> {
        match self {
            RowCell::Lookup(key) => Some(key),
            RowCell::Value(_) => None,
        }
    }
}

/// Row envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row<C> {
    pub id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<NestedBehavior>,
    pub fields: BTreeMap<String, C>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<RowValidation>,
}

/// A line template row.
pub type LineRow = Row<RowCell>;
/// A rule row; fields are condition columns and placeholder keys.
pub type RuleRow = Row<CellValue>;

impl<C> Row<C> {
    pub fn root() -> Self {
        Self {
            id: RowId::new(),
            behavior: None,
            fields: BTreeMap::new(),
            validation: None,
        }
    }

    pub fn nested(behavior: NestedBehavior) -> Self {
        Self {
            behavior: Some(behavior),
            ..Self::root()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, cell: impl Into<C>) -> Self {
        self.fields.insert(name.into(), cell.into());
        self
    }

    pub fn is_nested(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn get(&self, name: &str) -> Option<&C> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, cell: C) {
        self.fields.insert(name.into(), cell);
    }

    pub fn remove(&mut self, name: &str) -> Option<C> {
        self.fields.remove(name)
    }
}

impl Row<CellValue> {
    /// Present, non-blank value of a column.
    pub fn value(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column).filter(|value| !value.is_blank())
    }
}

impl From<CellValue> for RowCell {
    fn from(value: CellValue) -> Self {
        RowCell::Value(value)
    }
}

impl From<PlaceholderKey> for RowCell {
    fn from(key: PlaceholderKey) -> Self {
        RowCell::Lookup(key)
    }
}

/// A root row with its nested rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroup<C> {
    pub root: Row<C>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Row<C>>,
    /// Line fields persisted with one slot per row, absent steps included.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub series_fields: BTreeSet<String>,
}

pub type LineGroup = RowGroup<RowCell>;
pub type RuleGroup = RowGroup<CellValue>;

impl<C> RowGroup<C> {
    /// Wraps a root row; any nesting tag on it is dropped.
    pub fn new(mut root: Row<C>) -> Self {
        root.behavior = None;
        Self {
            root,
            nested: Vec::new(),
            series_fields: BTreeSet::new(),
        }
    }

    /// Appends a nested row, tagging it when untagged.
    pub fn push_nested(&mut self, mut row: Row<C>, behavior: NestedBehavior) {
        row.behavior.get_or_insert(behavior);
        self.nested.push(row);
    }

    /// Root first, then nested rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &Row<C>> {
        std::iter::once(&self.root).chain(self.nested.iter())
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row<C>> {
        std::iter::once(&mut self.root).chain(self.nested.iter_mut())
    }

    pub fn len(&self) -> usize {
        1 + self.nested.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_rows(self) -> Vec<Row<C>> {
        let mut rows = Vec::with_capacity(1 + self.nested.len());
        rows.push(self.root);
        rows.extend(self.nested);
        rows
    }
}

/// Groups a flat grid positionally: each root owns the nested rows after it.
///
/// A nested row with no preceding root starts its own group.
pub fn group_rows<C>(rows: Vec<Row<C>>) -> Vec<RowGroup<C>> {
    let mut groups: Vec<RowGroup<C>> = Vec::new();
    for row in rows {
        if row.is_nested() {
            if let Some(group) = groups.last_mut() {
                group.nested.push(row);
                continue;
            }
        }
        groups.push(RowGroup::new(row));
    }
    groups
}

/// Flattens groups back into grid order.
pub fn flatten_groups<C: Clone>(groups: &[RowGroup<C>]) -> Vec<Row<C>> {
    groups.iter().flat_map(|group| group.rows().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_rows_attaches_nested_rows_to_preceding_root() {
        let rows: Vec<RuleRow> = vec![
            Row::root(),
            Row::nested(NestedBehavior::Interpolation),
            Row::nested(NestedBehavior::Interpolation),
            Row::root(),
        ];
        let ids: Vec<RowId> = rows.iter().map(|row| row.id).collect();
        let groups = group_rows(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].root.id, ids[3]);

        let flat = flatten_groups(&groups);
        assert_eq!(flat.iter().map(|row| row.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn orphan_nested_row_becomes_root() {
        let groups = group_rows(vec![RuleRow::nested(NestedBehavior::Interpolation)]);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].root.is_nested());
    }

    #[test]
    fn blank_cells_read_as_absent() {
        let row = RuleRow::root()
            .with_field("basin", CellValue::text("  "))
            .with_field("amount", 3.0);
        assert!(row.value("basin").is_none());
        assert_eq!(row.value("amount"), Some(&CellValue::Number(3.0)));
    }
}
