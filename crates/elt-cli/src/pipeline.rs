//! Document-level operations behind the CLI commands.
//!
//! Each function takes a loaded [`TableDocument`] and returns data; printing
//! is left to the binary.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{debug, info_span};

use elt_map::{DefaultShaping, RowModel, to_row_model, to_storage_model};
use elt_model::{
    CellValue, Combination, HeaderType, HeaderTypes, Issue, LineGroup, LineRow, LookupKeyMapping,
    PlaceholderKey, RowValidation, RuleGroup, Severity,
};
use elt_validate::{
    DefaultPolicy, RuleTable, ValidationSummary, VirtualLine, materialize, materialize_group,
};

use crate::document::TableDocument;

/// Where an issue was found. Indexes are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueLocation {
    /// A rule row; `step` is set for interpolation points after the first.
    Rule { rule: usize, step: Option<usize> },
    /// A persisted line.
    Line { line: usize },
    /// A line materialized against a rule row.
    VirtualLine {
        rule: usize,
        step: Option<usize>,
        line: usize,
        line_step: Option<usize>,
    },
}

impl fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = |step: Option<usize>| step.map(|s| format!(".{}", s + 1)).unwrap_or_default();
        match self {
            IssueLocation::Rule { rule, step: s } => write!(f, "rule {}{}", rule + 1, step(*s)),
            IssueLocation::Line { line } => write!(f, "line {}", line + 1),
            IssueLocation::VirtualLine {
                rule,
                step: s,
                line,
                line_step,
            } => write!(
                f,
                "rule {}{} / line {}{}",
                rule + 1,
                step(*s),
                line + 1,
                step(*line_step)
            ),
        }
    }
}

/// One issue with its position in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedIssue {
    pub location: IssueLocation,
    /// Column or field the issue is attached to, if field-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub issue: Issue,
}

/// Outcome of [`check`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub summary: ValidationSummary,
    pub issues: Vec<ReportedIssue>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|reported| reported.issue.severity() == severity)
            .count()
    }
}

/// Options for [`check`].
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Also materialize every rule against the line template.
    pub materialize: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { materialize: true }
    }
}

fn load_rows(document: &TableDocument) -> Result<RowModel> {
    to_row_model(
        &document.lines,
        &document.rules,
        &document.configuration,
        &document.header_types,
        &DefaultShaping,
    )
    .context("load table rows")
}

/// Loads the document into rows, validates the rules and collects every issue.
pub fn check(document: &TableDocument, options: CheckOptions) -> Result<CheckReport> {
    let span = info_span!("check", rules = document.rules.len(), lines = document.lines.len());
    let _guard = span.enter();

    let model = load_rows(document)?;
    let mut issues: Vec<ReportedIssue> = model
        .line_issues
        .iter()
        .map(|line_issue| ReportedIssue {
            location: IssueLocation::Line {
                line: line_issue.line_index,
            },
            column: None,
            issue: line_issue.issue.clone(),
        })
        .collect();

    let mut table = RuleTable::new(model.rule_groups, model.range_definitions);
    let summary = table.validate(document.combinations.as_deref());

    for (rule, group) in table.groups().iter().enumerate() {
        for (position, row) in group.rows().enumerate() {
            if let Some(validation) = &row.validation {
                let location = IssueLocation::Rule {
                    rule,
                    step: position.checked_sub(1),
                };
                collect_row_issues(location, validation, &mut issues);
            }
        }
    }

    if options.materialize {
        for (rule, group) in table.groups().iter().enumerate() {
            issues.extend(materialization_issues(rule, group, &model.line_groups));
        }
    }

    debug!(issues = issues.len(), "checked table document");
    Ok(CheckReport { summary, issues })
}

fn collect_row_issues(
    location: IssueLocation,
    validation: &RowValidation,
    issues: &mut Vec<ReportedIssue>,
) {
    for (column, field_issues) in &validation.fields {
        issues.extend(field_issues.iter().map(|issue| ReportedIssue {
            location,
            column: Some(column.clone()),
            issue: issue.clone(),
        }));
    }
    issues.extend(validation.row.iter().map(|issue| ReportedIssue {
        location,
        column: None,
        issue: issue.clone(),
    }));
}

/// Unresolved placeholders of one rule group, located per line step.
fn materialization_issues(
    rule: usize,
    group: &RuleGroup,
    line_groups: &[LineGroup],
) -> Vec<ReportedIssue> {
    let mut line_rows: Vec<&LineRow> = Vec::new();
    let mut positions: Vec<(usize, Option<usize>)> = Vec::new();
    for (line, line_group) in line_groups.iter().enumerate() {
        for (step, row) in line_group.rows().enumerate() {
            line_rows.push(row);
            positions.push((line, step.checked_sub(1)));
        }
    }

    let mut issues = Vec::new();
    for (position, row) in group.rows().enumerate() {
        let parent = (position > 0).then_some(&group.root);
        let virtual_lines = materialize(&line_rows, row, parent, &DefaultPolicy);
        for (virtual_line, (line, line_step)) in virtual_lines.iter().zip(&positions) {
            for issue in virtual_line.issues() {
                let column = match &issue {
                    Issue::MaterializationRequiredValue { field, .. } => Some(field.clone()),
                    _ => None,
                };
                issues.push(ReportedIssue {
                    location: IssueLocation::VirtualLine {
                        rule,
                        step: position.checked_sub(1),
                        line: *line,
                        line_step: *line_step,
                    },
                    column,
                    issue,
                });
            }
        }
    }
    issues
}

/// Parses a `header=value` attribute, typing the value by its header.
pub fn parse_attribute(text: &str, header_types: &HeaderTypes) -> Result<(String, CellValue)> {
    let (header, raw) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("attribute '{text}' is not of the form header=value"))?;
    let header = header.trim();
    if header.is_empty() {
        return Err(anyhow!("attribute '{text}' has an empty header"));
    }
    let raw = raw.trim();
    let header_type = header_types.get(header).copied().unwrap_or_default();
    let value = match header_type {
        HeaderType::Number | HeaderType::Percent => CellValue::Number(
            raw.parse::<f64>()
                .with_context(|| format!("attribute {header}: '{raw}' is not a number"))?,
        ),
        HeaderType::Boolean => {
            let text = CellValue::text(raw);
            let flag = text
                .as_bool()
                .ok_or_else(|| anyhow!("attribute {header}: '{raw}' is not a boolean"))?;
            CellValue::Bool(flag)
        }
        HeaderType::String | HeaderType::Date => CellValue::text(raw),
    };
    Ok((header.to_string(), value))
}

/// Builds a combination from `header=value` attributes.
pub fn parse_combination(attributes: &[String], header_types: &HeaderTypes) -> Result<Combination> {
    attributes
        .iter()
        .map(|attribute| parse_attribute(attribute, header_types))
        .collect()
}

/// A matched rule with its materialized line template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    /// Position of the rule in the document.
    pub rule: usize,
    pub group: RuleGroup,
    pub virtual_lines: Vec<VirtualLine>,
    /// Display label per rule column.
    #[serde(skip)]
    pub column_labels: BTreeMap<String, String>,
}

impl MatchOutcome {
    pub fn label<'a>(&'a self, column: &'a str) -> &'a str {
        self.column_labels.get(column).map_or(column, String::as_str)
    }
}

/// Display label of a rule column.
///
/// Placeholder key columns show the line field they substitute, with a
/// one-based step suffix when the field spans several line rows.
pub fn column_label(column: &str, key_mapping: &LookupKeyMapping) -> String {
    for entry in key_mapping.values() {
        if let Some(step) = entry.keys.iter().position(|key| key.as_str() == column) {
            return if entry.keys.len() > 1 {
                format!("{}[{}]", entry.field, step + 1)
            } else {
                entry.field.clone()
            };
        }
    }
    PlaceholderKey::parse(column)
        .ok()
        .and_then(|key| key.field_name().map(str::to_string))
        .unwrap_or_else(|| column.to_string())
}

/// Finds the first rule matching the combination and materializes it.
pub fn match_rule(
    document: &TableDocument,
    combination: &Combination,
) -> Result<Option<MatchOutcome>> {
    let span = info_span!("match", attributes = combination.len());
    let _guard = span.enter();

    let model = load_rows(document)?;
    let table = RuleTable::new(model.rule_groups, model.range_definitions);
    let Some(group) = table.find_match(combination) else {
        return Ok(None);
    };
    let rule = table
        .groups()
        .iter()
        .position(|candidate| candidate.root.id == group.root.id)
        .unwrap_or_default();
    let virtual_lines = materialize_group(&model.line_groups, group, &DefaultPolicy);
    let column_labels = group
        .rows()
        .flat_map(|row| row.fields.keys())
        .map(|column| (column.clone(), column_label(column, &model.key_mapping)))
        .collect();
    Ok(Some(MatchOutcome {
        rule,
        group: group.clone(),
        virtual_lines,
        column_labels,
    }))
}

/// Round-trips the document through rows into canonical storage form.
///
/// Point-rules of an interpolation table come back folded into chains.
pub fn normalize(document: &TableDocument) -> Result<TableDocument> {
    let span = info_span!("normalize", rules = document.rules.len());
    let _guard = span.enter();

    let model = load_rows(document)?;
    let storage = to_storage_model(
        &model.line_groups,
        &model.rule_groups,
        &document.configuration,
        &document.header_types,
        &DefaultShaping,
    );
    debug!(
        rules_in = document.rules.len(),
        rules_out = storage.rules.len(),
        "normalized table document"
    );
    Ok(TableDocument {
        lines: storage.lines,
        rules: storage.rules,
        ..document.clone()
    })
}
