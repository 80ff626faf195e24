//! Combination matching.
//!
//! A rule row matches a combination when every regular header agrees:
//! equality on single columns, containment on `[low, high]` ranges.
//! Ratio and interpolation headers supply values, not conditions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::trace;

use elt_map::resolve_range_definitions;
use elt_model::{
    CellValue, Combination, HeaderType, HeaderTypes, MatchBehavior, RangeDefinition,
    RangeDefinitions, RuleGroup, RuleRow, compare_values, values_equal,
};

/// Returns true if the rule row accepts the combination.
pub fn matches(row: &RuleRow, combination: &Combination, definitions: &RangeDefinitions) -> bool {
    definitions
        .regular()
        .all(|definition| header_matches(row, combination, definition, definitions.case_insensitive))
}

fn header_matches(
    row: &RuleRow,
    combination: &Combination,
    definition: &RangeDefinition,
    case_insensitive: bool,
) -> bool {
    let Some(value) = combination
        .get(&definition.header)
        .filter(|value| !value.is_blank())
    else {
        return definition
            .column_ids
            .iter()
            .all(|column| row.value(column).is_none());
    };

    match (definition.low_column(), definition.high_column()) {
        (Some(low), Some(high)) => within(
            value,
            row.value(low),
            row.value(high),
            definition.header_type,
        ),
        _ => row.value(definition.column()).is_some_and(|cell| {
            values_equal(cell, value, definition.header_type, case_insensitive)
        }),
    }
}

/// Containment in a half-open-capable range; both bounds missing never matches.
fn within(
    value: &CellValue,
    low: Option<&CellValue>,
    high: Option<&CellValue>,
    header_type: HeaderType,
) -> bool {
    if low.is_none() && high.is_none() {
        return false;
    }
    let above_low = low.is_none_or(|low| {
        matches!(
            compare_values(value, low, header_type),
            Some(Ordering::Greater | Ordering::Equal)
        )
    });
    let below_high = high.is_none_or(|high| {
        matches!(
            compare_values(value, high, header_type),
            Some(Ordering::Less | Ordering::Equal)
        )
    });
    above_low && below_high
}

/// First group, in row order, whose root matches the combination.
pub fn find_matching_group<'a>(
    groups: &'a [RuleGroup],
    combination: &Combination,
    definitions: &RangeDefinitions,
) -> Option<&'a RuleGroup> {
    let found = groups
        .iter()
        .find(|group| matches(&group.root, combination, definitions));
    trace!(found = found.is_some(), "matched combination");
    found
}

/// Resolves range definitions for the headers, then finds the first matching group.
pub fn find_matching_rule<'a>(
    headers: &[String],
    groups: &'a [RuleGroup],
    header_types: &HeaderTypes,
    combination: &Combination,
    behaviors: &BTreeMap<String, MatchBehavior>,
) -> Option<&'a RuleGroup> {
    let definitions = resolve_range_definitions(headers, header_types, behaviors);
    find_matching_group(groups, combination, &definitions)
}
