//! Whole-table conversion between storage and rows.

use tracing::{debug, info_span};

use elt_model::{
    Configuration, HeaderTypes, Line, LineGroup, LookupKeyMapping, RangeDefinitions, Rule,
    RuleGroup,
};

use crate::error::Result;
use crate::lines::{LineIssue, lines_to_rows, rows_to_lines};
use crate::range::range_definitions_for;
use crate::rules::{rows_to_rules, rules_to_rows};
use crate::strategy::ShapingStrategy;

/// Editable view of a lookup table.
#[derive(Debug, Clone)]
pub struct RowModel {
    pub line_groups: Vec<LineGroup>,
    pub rule_groups: Vec<RuleGroup>,
    pub key_mapping: LookupKeyMapping,
    pub range_definitions: RangeDefinitions,
    /// Shape problems found on the persisted lines.
    pub line_issues: Vec<LineIssue>,
}

/// Persisted view of a lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageModel {
    pub lines: Vec<Line>,
    pub rules: Vec<Rule>,
}

/// Loads persisted lines and rules into editable rows.
///
/// # Errors
///
/// Returns [`crate::MapError`] when a rule value references a placeholder
/// the lines do not declare, or holds more steps than the line has.
pub fn to_row_model(
    lines: &[Line],
    rules: &[Rule],
    config: &Configuration,
    header_types: &HeaderTypes,
    strategy: &dyn ShapingStrategy,
) -> Result<RowModel> {
    let span = info_span!("to_row_model", lines = lines.len(), rules = rules.len());
    let _guard = span.enter();

    let range_definitions = range_definitions_for(config, header_types);
    let line_model = lines_to_rows(lines, strategy);
    let rule_groups = rules_to_rows(rules, &range_definitions, &line_model.key_mapping, strategy)?;
    debug!(
        line_groups = line_model.groups.len(),
        rule_groups = rule_groups.len(),
        line_issues = line_model.issues.len(),
        "loaded table rows"
    );
    Ok(RowModel {
        line_groups: line_model.groups,
        rule_groups,
        key_mapping: line_model.key_mapping,
        range_definitions,
        line_issues: line_model.issues,
    })
}

/// Converts editable rows back into their persisted form.
pub fn to_storage_model(
    line_groups: &[LineGroup],
    rule_groups: &[RuleGroup],
    config: &Configuration,
    header_types: &HeaderTypes,
    strategy: &dyn ShapingStrategy,
) -> StorageModel {
    let span = info_span!(
        "to_storage_model",
        lines = line_groups.len(),
        rules = rule_groups.len()
    );
    let _guard = span.enter();

    let range_definitions = range_definitions_for(config, header_types);
    let (lines, key_mapping) = rows_to_lines(line_groups, strategy);
    let rules = rows_to_rules(rule_groups, &range_definitions, &key_mapping, strategy);
    StorageModel { lines, rules }
}
