//! Rule ↔ row mapping.
//!
//! Each condition lands in the column(s) its header's range definition names;
//! each placeholder value lands in the placeholder key columns recorded by
//! the lookup key mapping. Interpolation points become nested rows.

use tracing::{debug, trace, warn};

use elt_model::{
    CellValue, Condition, LookupKeyEntry, LookupKeyMapping, MatchBehavior, NestedBehavior,
    Operator, PlaceholderKey, RangeDefinition, RangeDefinitions, RowGroup, Rule, RuleGroup,
    RuleRow, RuleValue, ValueSpec, values_equal,
};

use crate::error::{MapError, Result};
use crate::strategy::ShapingStrategy;

/// Expands persisted rules into rule groups.
///
/// When exactly one header interpolates, consecutive point-rules are folded
/// into interpolation chains first (see [`fold_interpolation_rules`]).
///
/// # Errors
///
/// Returns [`MapError`] when a rule value does not fit the key mapping.
pub fn rules_to_rows(
    rules: &[Rule],
    definitions: &RangeDefinitions,
    key_mapping: &LookupKeyMapping,
    strategy: &dyn ShapingStrategy,
) -> Result<Vec<RuleGroup>> {
    let folded;
    let rules = if definitions.interpolation_header().is_some() {
        folded = fold_interpolation_rules(rules, definitions);
        folded.as_slice()
    } else {
        rules
    };
    let groups = rules
        .iter()
        .map(|rule| expand_rule(rule, definitions, key_mapping, strategy))
        .collect::<Result<Vec<_>>>()?;
    debug!(rules = groups.len(), "expanded rules into rows");
    Ok(groups)
}

fn expand_rule(
    rule: &Rule,
    definitions: &RangeDefinitions,
    key_mapping: &LookupKeyMapping,
    strategy: &dyn ShapingStrategy,
) -> Result<RuleGroup> {
    let mut root = RuleRow::root();
    let mut nested: Vec<RuleRow> = Vec::new();

    for condition in &rule.conditions {
        let Some(definition) = definitions.get(&condition.key) else {
            warn!(header = %condition.key, "ignoring condition on unselected header");
            continue;
        };
        let columns = condition_columns(definition, condition.operator);
        for column in &columns {
            root.set(*column, condition.value.clone());
        }
        for (index, child) in condition.children_values.iter().flatten().enumerate() {
            let row = nested_row(&mut nested, index);
            if let Some(value) = child {
                for column in &columns {
                    row.set(*column, value.clone());
                }
            }
        }
    }

    for value in &rule.values {
        let entry = key_mapping
            .get(&value.key)
            .ok_or_else(|| MapError::UnknownPlaceholder(value.key.clone()))?;
        if let Some(spec) = &value.value {
            assign_spec(&mut root, &value.key, entry, spec, strategy)?;
        }
        for (index, child) in value.children_values.iter().flatten().enumerate() {
            let row = nested_row(&mut nested, index);
            if let Some(spec) = child {
                assign_spec(row, &value.key, entry, spec, strategy)?;
            }
        }
    }

    let mut group = RowGroup::new(root);
    for row in nested {
        group.push_nested(row, NestedBehavior::Interpolation);
    }
    trace!(root = %group.root.id, nested = group.nested.len(), "expanded rule");
    Ok(group)
}

fn condition_columns(definition: &RangeDefinition, operator: Operator) -> Vec<&str> {
    match (definition.low_column(), definition.high_column()) {
        (Some(low), Some(high)) => match operator {
            Operator::Gte => vec![low],
            Operator::Lte => vec![high],
            Operator::Eq => vec![low, high],
        },
        _ => vec![definition.column()],
    }
}

fn nested_row(nested: &mut Vec<RuleRow>, index: usize) -> &mut RuleRow {
    while nested.len() <= index {
        nested.push(RuleRow::nested(NestedBehavior::Interpolation));
    }
    &mut nested[index]
}

fn assign_spec(
    row: &mut RuleRow,
    placeholder: &PlaceholderKey,
    entry: &LookupKeyEntry,
    spec: &ValueSpec,
    strategy: &dyn ShapingStrategy,
) -> Result<()> {
    let too_long = |found: usize| MapError::SeriesTooLong {
        placeholder: placeholder.clone(),
        expected: entry.keys.len(),
        found,
    };
    match spec {
        ValueSpec::Single(value) => {
            let key = entry.keys.first().ok_or_else(|| too_long(1))?;
            row.set(
                key.as_str(),
                strategy.rule_value_to_row(&entry.field, value.clone()),
            );
        }
        ValueSpec::Series(values) => {
            if values.len() > entry.keys.len() {
                return Err(too_long(values.len()));
            }
            for (key, value) in entry.keys.iter().zip(values) {
                if let Some(value) = value {
                    row.set(
                        key.as_str(),
                        strategy.rule_value_to_row(&entry.field, value.clone()),
                    );
                }
            }
        }
    }
    Ok(())
}

/// Folds consecutive point-rules into interpolation chains.
///
/// A run of rules without children that share every non-interpolation
/// condition and the same placeholder set becomes one rule: the first rule
/// is the chain root, later rules become its `childrenValues`. Rules that
/// already carry children are kept as they are, so folding is idempotent.
pub fn fold_interpolation_rules(rules: &[Rule], definitions: &RangeDefinitions) -> Vec<Rule> {
    let Some(interpolation) = definitions.interpolation_header() else {
        return rules.to_vec();
    };
    let header = interpolation.header.as_str();

    let mut folded: Vec<Rule> = Vec::with_capacity(rules.len());
    let mut open = false;
    for rule in rules {
        if rule.has_children() || rule.condition(header).is_none() {
            folded.push(rule.clone());
            open = false;
            continue;
        }
        if open
            && let Some(seed) = folded.last_mut()
            && can_fold(seed, rule, header)
        {
            append_point(seed, rule, header);
            continue;
        }
        folded.push(rule.clone());
        open = true;
    }
    if folded.len() != rules.len() {
        debug!(
            stored = rules.len(),
            folded = folded.len(),
            "folded interpolation points"
        );
    }
    folded
}

fn can_fold(seed: &Rule, rule: &Rule, header: &str) -> bool {
    let seed_conditions: Vec<&Condition> = seed
        .conditions
        .iter()
        .filter(|condition| condition.key != header)
        .collect();
    let rule_conditions: Vec<&Condition> = rule
        .conditions
        .iter()
        .filter(|condition| condition.key != header)
        .collect();
    seed_conditions.len() == rule_conditions.len()
        && rule_conditions
            .iter()
            .all(|condition| seed_conditions.contains(condition))
        && seed.values.len() == rule.values.len()
        && rule
            .values
            .iter()
            .all(|value| seed.values.iter().any(|seeded| seeded.key == value.key))
}

fn append_point(seed: &mut Rule, rule: &Rule, header: &str) {
    let point = rule.condition(header).map(|condition| condition.value.clone());
    if let Some(condition) = seed
        .conditions
        .iter_mut()
        .find(|condition| condition.key == header)
    {
        condition
            .children_values
            .get_or_insert_with(Vec::new)
            .push(point);
    }
    for value in &mut seed.values {
        let step = rule
            .values
            .iter()
            .find(|other| other.key == value.key)
            .and_then(|other| other.value.clone());
        value
            .children_values
            .get_or_insert_with(Vec::new)
            .push(step);
    }
}

/// Collapses rule groups back into persisted rules.
pub fn rows_to_rules(
    groups: &[RuleGroup],
    definitions: &RangeDefinitions,
    key_mapping: &LookupKeyMapping,
    strategy: &dyn ShapingStrategy,
) -> Vec<Rule> {
    groups
        .iter()
        .map(|group| collapse_rule(group, definitions, key_mapping, strategy))
        .collect()
}

fn collapse_rule(
    group: &RuleGroup,
    definitions: &RangeDefinitions,
    key_mapping: &LookupKeyMapping,
    strategy: &dyn ShapingStrategy,
) -> Rule {
    let mut rule = Rule::default();

    for definition in definitions.iter() {
        if let (Some(low), Some(high)) = (definition.low_column(), definition.high_column()) {
            let (low, high) = (group.root.value(low), group.root.value(high));
            // Equal bounds are stored as the equality they were loaded from.
            if let (Some(low), Some(high)) = (low, high)
                && values_equal(low, high, definition.header_type, false)
            {
                rule.conditions
                    .push(Condition::new(&definition.header, Operator::Eq, low.clone()));
                continue;
            }
            if let Some(value) = low {
                rule.conditions
                    .push(Condition::new(&definition.header, Operator::Gte, value.clone()));
            }
            if let Some(value) = high {
                rule.conditions
                    .push(Condition::new(&definition.header, Operator::Lte, value.clone()));
            }
            continue;
        }
        let column = definition.column();
        let Some(value) = group.root.value(column) else {
            continue;
        };
        let mut condition = Condition::new(&definition.header, Operator::Eq, value.clone());
        if definition.behavior == MatchBehavior::Interpolation && !group.nested.is_empty() {
            condition.children_values = Some(
                group
                    .nested
                    .iter()
                    .map(|row| row.value(column).cloned())
                    .collect(),
            );
        }
        rule.conditions.push(condition);
    }

    for (placeholder, entry) in key_mapping {
        let value = collect_spec(&group.root, entry, strategy);
        let children = if group.nested.is_empty() {
            None
        } else {
            let steps: Vec<Option<ValueSpec>> = group
                .nested
                .iter()
                .map(|row| collect_spec(row, entry, strategy))
                .collect();
            steps.iter().any(Option::is_some).then_some(steps)
        };
        if value.is_none() && children.is_none() {
            continue;
        }
        rule.values.push(RuleValue {
            key: placeholder.clone(),
            value,
            children_values: children,
        });
    }
    rule
}

fn collect_spec(
    row: &RuleRow,
    entry: &LookupKeyEntry,
    strategy: &dyn ShapingStrategy,
) -> Option<ValueSpec> {
    let read = |key: &PlaceholderKey| -> Option<CellValue> {
        row.value(key.as_str())
            .map(|value| strategy.row_value_to_rule_value(&entry.field, value.clone()))
    };
    match entry.keys.as_slice() {
        [] => None,
        [single] => read(single).map(ValueSpec::Single),
        keys => {
            let values: Vec<Option<CellValue>> = keys.iter().map(read).collect();
            if values.iter().any(Option::is_some) {
                Some(ValueSpec::Series(values))
            } else {
                None
            }
        }
    }
}
