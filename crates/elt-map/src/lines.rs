//! Line ↔ row mapping.
//!
//! A persisted line whose fields carry arrays is a time series: it expands
//! into a root row followed by one nested row per later step. Placeholders
//! on time-series fields get one key per step; the first step keeps the
//! persisted key, later steps get fresh ones. The [`LookupKeyMapping`]
//! remembers the ordering so rule values can be spread over the same keys.

use tracing::{debug, warn};

use elt_model::{
    CellValue, FieldValue, Issue, Line, LineField, LineGroup, LineRow, LookupKeyEntry, LookupKeyMapping,
    NestedBehavior, PlaceholderKey, Row, RowCell, RowGroup,
};

use crate::strategy::ShapingStrategy;

/// An issue found on a persisted line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineIssue {
    /// Position of the line in storage order.
    pub line_index: usize,
    pub issue: Issue,
}

/// Line rows produced from storage.
#[derive(Debug, Clone, Default)]
pub struct LineRowModel {
    pub groups: Vec<LineGroup>,
    pub key_mapping: LookupKeyMapping,
    pub issues: Vec<LineIssue>,
}

/// Expands persisted lines into line groups.
pub fn lines_to_rows(lines: &[Line], strategy: &dyn ShapingStrategy) -> LineRowModel {
    let mut model = LineRowModel::default();
    for (line_index, line) in lines.iter().enumerate() {
        let steps = series_length(line);
        for field in line {
            if let FieldValue::TimeSeries(values) = &field.value
                && values.len() != steps
            {
                warn!(line_index, field = %field.key, "time-series length mismatch");
                model.issues.push(LineIssue {
                    line_index,
                    issue: Issue::MismatchedSeriesLength {
                        field: field.key.clone(),
                        expected: steps,
                        found: values.len(),
                    },
                });
            }
        }
        let group = expand_line(line, steps, strategy, &mut model.key_mapping);
        model.groups.push(group);
    }
    debug!(
        lines = lines.len(),
        placeholders = model.key_mapping.len(),
        "expanded lines into rows"
    );
    model
}

/// Rows a line expands into: the longest series, at least one.
fn series_length(line: &Line) -> usize {
    line.iter()
        .filter_map(|field| match &field.value {
            FieldValue::TimeSeries(values) => Some(values.len()),
            FieldValue::Scalar(_) | FieldValue::Lookup(_) => None,
        })
        .max()
        .unwrap_or(1)
        .max(1)
}

fn expand_line(
    line: &Line,
    steps: usize,
    strategy: &dyn ShapingStrategy,
    key_mapping: &mut LookupKeyMapping,
) -> LineGroup {
    let mut rows: Vec<LineRow> = (0..steps)
        .map(|step| {
            if step == 0 {
                Row::root()
            } else {
                Row::nested(NestedBehavior::TimeSeries)
            }
        })
        .collect();

    for field in line {
        match &field.value {
            FieldValue::Scalar(value) => {
                rows[0].set(field.key.clone(), RowCell::Value(value.clone()));
            }
            FieldValue::TimeSeries(values) => {
                for (row, value) in rows.iter_mut().zip(values) {
                    if let Some(value) = value {
                        row.set(field.key.clone(), RowCell::Value(value.clone()));
                    }
                }
            }
            FieldValue::Lookup(key) => {
                let keys = step_keys(key, &field.key, steps, strategy);
                for (row, step_key) in rows.iter_mut().zip(&keys) {
                    row.set(field.key.clone(), RowCell::Lookup(step_key.clone()));
                }
                key_mapping.insert(
                    key.clone(),
                    LookupKeyEntry {
                        field: field.key.clone(),
                        keys,
                    },
                );
            }
        }
    }

    for row in &mut rows {
        strategy.line_to_row(row);
    }
    let mut rows = rows.into_iter();
    let mut group = RowGroup::new(rows.next().unwrap_or_else(Row::root));
    for row in rows {
        group.push_nested(row, NestedBehavior::TimeSeries);
    }
    group.series_fields = line
        .iter()
        .filter(|field| matches!(field.value, FieldValue::TimeSeries(_)))
        .map(|field| field.key.clone())
        .collect();
    group
}

fn step_keys(
    key: &PlaceholderKey,
    field: &str,
    steps: usize,
    strategy: &dyn ShapingStrategy,
) -> Vec<PlaceholderKey> {
    let mut keys = vec![key.clone()];
    if steps > 1 && strategy.allows_nested(field) {
        keys.extend((1..steps).map(|_| PlaceholderKey::generate(field)));
    }
    keys
}

/// Collapses line groups back into persisted lines.
///
/// Fields loaded as series, or present on any nested row, become series with
/// one slot per row; placeholder fields are persisted by their root key and
/// recorded in the returned mapping.
pub fn rows_to_lines(
    groups: &[LineGroup],
    strategy: &dyn ShapingStrategy,
) -> (Vec<Line>, LookupKeyMapping) {
    let mut key_mapping = LookupKeyMapping::new();
    let lines = groups
        .iter()
        .map(|group| collapse_group(group, strategy, &mut key_mapping))
        .collect();
    (lines, key_mapping)
}

fn collapse_group(
    group: &LineGroup,
    strategy: &dyn ShapingStrategy,
    key_mapping: &mut LookupKeyMapping,
) -> Line {
    let mut names: Vec<&String> = Vec::new();
    for name in group.rows().flat_map(|row| row.fields.keys()).chain(&group.series_fields) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut line = Line::with_capacity(names.len());
    for name in names {
        let cells: Vec<Option<&RowCell>> = group.rows().map(|row| row.get(name)).collect();
        let keys: Vec<PlaceholderKey> = cells
            .iter()
            .filter_map(|cell| cell.and_then(RowCell::as_lookup).cloned())
            .collect();

        let value = if let Some(first) = keys.first() {
            key_mapping.insert(
                first.clone(),
                LookupKeyEntry {
                    field: name.clone(),
                    keys: keys.clone(),
                },
            );
            FieldValue::Lookup(first.clone())
        } else if group.series_fields.contains(name) || cells.iter().skip(1).any(Option::is_some)
        {
            FieldValue::TimeSeries(series_slots(&cells))
        } else {
            match cells[0].and_then(RowCell::as_value) {
                Some(value) => FieldValue::Scalar(value.clone()),
                None => continue,
            }
        };

        line.push(LineField::new(name.clone(), value));
    }

    // Steps only survive storage through a series; keep empty step rows alive.
    if group.len() > 1
        && !line
            .iter()
            .any(|field| matches!(field.value, FieldValue::TimeSeries(_)))
        && let Some(field) = line
            .iter_mut()
            .find(|field| matches!(field.value, FieldValue::Scalar(_)))
    {
        let cells: Vec<Option<&RowCell>> = group.rows().map(|row| row.get(&field.key)).collect();
        field.value = FieldValue::TimeSeries(series_slots(&cells));
    }

    for field in &mut line {
        strategy.row_to_line(field);
    }
    line
}

/// One slot per row of the group; absent steps are `None`.
fn series_slots(cells: &[Option<&RowCell>]) -> Vec<Option<CellValue>> {
    cells
        .iter()
        .map(|cell| cell.and_then(RowCell::as_value).cloned())
        .collect()
}
