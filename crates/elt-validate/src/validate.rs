//! Rule set validation.

use serde::Serialize;
use tracing::{debug, info_span};

use elt_model::{Combination, Issue, RangeDefinitions, RowValidation, RuleGroup, RuleRow};

use crate::coverage::analyze_coverage;
use crate::schema::{HeaderSchema, RowContext};

/// Issue counts over a validated rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub rows: usize,
    pub rows_with_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    /// False when header errors blocked the coverage analysis.
    pub coverage_checked: bool,
}

impl ValidationSummary {
    pub fn from_groups(groups: &[RuleGroup], coverage_checked: bool) -> Self {
        let mut summary = Self {
            coverage_checked,
            ..Self::default()
        };
        for row in groups.iter().flat_map(RuleGroup::rows) {
            summary.rows += 1;
            if let Some(validation) = row.validation.as_ref().filter(|v| !v.is_empty()) {
                summary.rows_with_issues += 1;
                summary.errors += validation.error_count();
                summary.warnings += validation.warning_count();
            }
        }
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Annotates every row of the rule set in place.
///
/// Annotations are recomputed from scratch, so running this on an already
/// annotated set yields the same result. Coverage and overlap analysis run
/// only when no row carries a header-level issue; reachability additionally
/// needs a population.
pub fn annotate_rules(
    groups: &mut [RuleGroup],
    definitions: &RangeDefinitions,
    population: Option<&[Combination]>,
) -> ValidationSummary {
    let span = info_span!("validate_rules", groups = groups.len());
    let _guard = span.enter();

    let schema = HeaderSchema::from_definitions(definitions);
    let mut validations: Vec<RowValidation> = {
        let rows: Vec<&RuleRow> = groups.iter().flat_map(RuleGroup::rows).collect();
        RowContext::sequence(&rows)
            .iter()
            .map(|context| schema.validate_row(context))
            .collect()
    };

    let coverage_checked = !validations.iter().any(RowValidation::has_header_errors);
    if coverage_checked {
        let roots: Vec<&RuleRow> = groups.iter().map(|group| &group.root).collect();
        let report = analyze_coverage(&roots, population, definitions);
        let mut position = 0;
        for group in groups.iter() {
            let validation = &mut validations[position];
            if report.unmatched.contains(&group.root.id) {
                validation.push_row(Issue::InvalidCombination);
            }
            if let Some(with) = report.overlaps.get(&group.root.id) {
                validation.push_row(Issue::OverlappingCombination { with: with.clone() });
            }
            position += group.len();
        }
    } else {
        debug!("header errors present, skipping coverage analysis");
    }

    for (row, validation) in groups
        .iter_mut()
        .flat_map(RuleGroup::rows_mut)
        .zip(validations)
    {
        row.validation = (!validation.is_empty()).then_some(validation);
    }

    let summary = ValidationSummary::from_groups(groups, coverage_checked);
    debug!(
        rows = summary.rows,
        errors = summary.errors,
        warnings = summary.warnings,
        "validated rules"
    );
    summary
}

/// Returns an annotated copy of the rule set.
pub fn validate_rules(
    groups: &[RuleGroup],
    definitions: &RangeDefinitions,
    population: Option<&[Combination]>,
) -> Vec<RuleGroup> {
    let mut annotated = groups.to_vec();
    annotate_rules(&mut annotated, definitions, population);
    annotated
}
