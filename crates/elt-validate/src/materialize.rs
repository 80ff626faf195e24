//! Virtual line materialization.
//!
//! Substitutes a rule row's values into the placeholder cells of the line
//! template. The result is transient: it exists so unresolved placeholders
//! can be reported, and is never persisted.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use elt_model::{
    CellValue, Issue, LineGroup, LineRow, PlaceholderKey, RowCell, RowId, RuleGroup, RuleRow,
};

/// Caller decisions taken during materialization.
pub trait MaterializePolicy {
    /// Whether a nested rule row inherits the placeholder from its parent.
    fn use_parent(&self, _row: &RuleRow, _placeholder: &PlaceholderKey) -> bool {
        true
    }

    /// Whether an unresolved field is exempt from the required-value check.
    fn is_disabled(&self, _line: &VirtualLine, _field: &str) -> bool {
        false
    }
}

/// Inherit from parents, require every placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl MaterializePolicy for DefaultPolicy {}

/// A materialized cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VirtualCell {
    Value(CellValue),
    /// Unresolved placeholder.
    Invalid { placeholder: PlaceholderKey },
}

/// A line row with its placeholders resolved against one rule row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualLine {
    /// Line row this was built from.
    pub source: RowId,
    /// Rule row that supplied the values.
    pub rule: RowId,
    pub fields: BTreeMap<String, VirtualCell>,
}

impl VirtualLine {
    pub fn value(&self, field: &str) -> Option<&CellValue> {
        match self.fields.get(field)? {
            VirtualCell::Value(value) => Some(value),
            VirtualCell::Invalid { .. } => None,
        }
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.fields
            .iter()
            .filter_map(|(field, cell)| match cell {
                VirtualCell::Invalid { placeholder } => Some(Issue::MaterializationRequiredValue {
                    field: field.clone(),
                    placeholder: placeholder.clone(),
                }),
                VirtualCell::Value(_) => None,
            })
            .collect()
    }
}

/// Materializes every line row against a rule row.
///
/// With a parent distinct from `row`, placeholders the policy lets inherit
/// are seeded from the parent and overridden by the row's own values.
pub fn materialize(
    lines: &[&LineRow],
    row: &RuleRow,
    parent: Option<&RuleRow>,
    policy: &dyn MaterializePolicy,
) -> Vec<VirtualLine> {
    let parent = parent.filter(|parent| parent.id != row.id);
    lines
        .iter()
        .map(|line| materialize_line(line, row, parent, policy))
        .collect()
}

fn materialize_line(
    line: &LineRow,
    row: &RuleRow,
    parent: Option<&RuleRow>,
    policy: &dyn MaterializePolicy,
) -> VirtualLine {
    let mut virtual_line = VirtualLine {
        source: line.id,
        rule: row.id,
        fields: BTreeMap::new(),
    };
    let mut unresolved: Vec<(&String, &PlaceholderKey)> = Vec::new();

    for (field, cell) in &line.fields {
        let value = match cell {
            RowCell::Value(value) => Some(value),
            RowCell::Lookup(key) => {
                let own = row.value(key.as_str());
                let resolved = match parent {
                    Some(parent) if policy.use_parent(row, key) => {
                        own.or_else(|| parent.value(key.as_str()))
                    }
                    _ => own,
                };
                if resolved.is_none() {
                    unresolved.push((field, key));
                }
                resolved
            }
        };
        if let Some(value) = value {
            virtual_line
                .fields
                .insert(field.clone(), VirtualCell::Value(value.clone()));
        }
    }

    for (field, key) in unresolved {
        if !policy.is_disabled(&virtual_line, field) {
            trace!(line = %line.id, field = %field, "unresolved placeholder");
            virtual_line.fields.insert(
                field.clone(),
                VirtualCell::Invalid {
                    placeholder: key.clone(),
                },
            );
        }
    }
    virtual_line
}

/// Materializes a rule group over the whole line template.
///
/// The root row stands alone; nested rows use the root as parent.
pub fn materialize_group(
    line_groups: &[LineGroup],
    group: &RuleGroup,
    policy: &dyn MaterializePolicy,
) -> Vec<VirtualLine> {
    let lines: Vec<&LineRow> = line_groups.iter().flat_map(LineGroup::rows).collect();
    let mut virtual_lines = materialize(&lines, &group.root, None, policy);
    for nested in &group.nested {
        virtual_lines.extend(materialize(&lines, nested, Some(&group.root), policy));
    }
    virtual_lines
}

/// Required-value issues of materialized lines, with the line they came from.
pub fn virtual_line_issues(lines: &[VirtualLine]) -> Vec<(RowId, Issue)> {
    lines
        .iter()
        .flat_map(|line| line.issues().into_iter().map(|issue| (line.source, issue)))
        .collect()
}

#[cfg(test)]
mod tests {
    use elt_model::{NestedBehavior, RowGroup};

    use super::*;

    fn template(key: &PlaceholderKey) -> LineRow {
        LineRow::root()
            .with_field("description", CellValue::text("Oil"))
            .with_field("value", key.clone())
    }

    #[test]
    fn placeholder_takes_rule_value() {
        let key = PlaceholderKey::generate("value");
        let line = template(&key);
        let rule = RuleRow::root().with_field(key.as_str(), 42.0);

        let lines = materialize(&[&line], &rule, None, &DefaultPolicy);
        assert_eq!(lines[0].value("value"), Some(&CellValue::Number(42.0)));
        assert_eq!(lines[0].value("description"), Some(&CellValue::text("Oil")));
        assert!(lines[0].issues().is_empty());
    }

    #[test]
    fn missing_value_becomes_invalid_sentinel() {
        let key = PlaceholderKey::generate("value");
        let line = template(&key);
        let lines = materialize(&[&line], &RuleRow::root(), None, &DefaultPolicy);
        assert_eq!(
            lines[0].fields["value"],
            VirtualCell::Invalid {
                placeholder: key.clone()
            }
        );
        assert_eq!(
            lines[0].issues(),
            vec![Issue::MaterializationRequiredValue {
                field: "value".to_string(),
                placeholder: key,
            }]
        );
    }

    #[test]
    fn disabled_fields_stay_absent() {
        struct Optional;
        impl MaterializePolicy for Optional {
            fn is_disabled(&self, _line: &VirtualLine, field: &str) -> bool {
                field == "value"
            }
        }
        let key = PlaceholderKey::generate("value");
        let line = template(&key);
        let lines = materialize(&[&line], &RuleRow::root(), None, &Optional);
        assert!(!lines[0].fields.contains_key("value"));
        assert!(lines[0].issues().is_empty());
    }

    #[test]
    fn nested_rows_inherit_from_parent_unless_overridden() {
        let price = PlaceholderKey::generate("price");
        let unit = PlaceholderKey::generate("unit");
        let line = LineRow::root()
            .with_field("price", price.clone())
            .with_field("unit", unit.clone());
        let root = RuleRow::root()
            .with_field(price.as_str(), 10.0)
            .with_field(unit.as_str(), "bbl");
        let mut group = RowGroup::new(root);
        group.push_nested(
            RuleRow::nested(NestedBehavior::Interpolation).with_field(price.as_str(), 12.0),
            NestedBehavior::Interpolation,
        );

        let lines = materialize_group(&[RowGroup::new(line)], &group, &DefaultPolicy);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].value("price"), Some(&CellValue::Number(12.0)));
        assert_eq!(lines[1].value("unit"), Some(&CellValue::text("bbl")));
        assert!(virtual_line_issues(&lines).is_empty());
    }

    #[test]
    fn policy_can_refuse_inheritance() {
        struct NoInherit;
        impl MaterializePolicy for NoInherit {
            fn use_parent(&self, _row: &RuleRow, _placeholder: &PlaceholderKey) -> bool {
                false
            }
        }
        let unit = PlaceholderKey::generate("unit");
        let line = LineRow::root().with_field("unit", unit.clone());
        let parent = RuleRow::root().with_field(unit.as_str(), "bbl");
        let child = RuleRow::nested(NestedBehavior::Interpolation);

        let lines = materialize(&[&line], &child, Some(&parent), &NoInherit);
        let issues = virtual_line_issues(&lines);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, line.id);
    }
}
