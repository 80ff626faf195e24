//! Editable rule table session.

use tracing::debug;

use elt_map::range_definitions_for;
use elt_model::{Combination, Configuration, HeaderTypes, RangeDefinitions, RuleGroup};

use crate::matcher::find_matching_group;
use crate::validate::{ValidationSummary, annotate_rules};

/// Rule groups under edit, with their revalidation state.
///
/// Any edit marks the table stale; only [`RuleTable::validate`] clears it.
/// Coverage and overlap analysis never run on edit.
#[derive(Debug, Clone)]
pub struct RuleTable {
    groups: Vec<RuleGroup>,
    definitions: RangeDefinitions,
    stale: bool,
    coverage_checked: bool,
}

impl RuleTable {
    /// A fresh table starts stale: it has never been validated.
    pub fn new(groups: Vec<RuleGroup>, definitions: RangeDefinitions) -> Self {
        Self {
            groups,
            definitions,
            stale: true,
            coverage_checked: false,
        }
    }

    pub fn from_config(
        groups: Vec<RuleGroup>,
        config: &Configuration,
        header_types: &HeaderTypes,
    ) -> Self {
        Self::new(groups, range_definitions_for(config, header_types))
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn definitions(&self) -> &RangeDefinitions {
        &self.definitions
    }

    /// Check if the annotations are out of date.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Mutates the groups and marks the table stale.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut Vec<RuleGroup>) -> R) -> R {
        self.stale = true;
        edit(&mut self.groups)
    }

    /// Re-annotates every row and clears the stale flag.
    pub fn validate(&mut self, population: Option<&[Combination]>) -> ValidationSummary {
        let summary = annotate_rules(&mut self.groups, &self.definitions, population);
        self.stale = false;
        self.coverage_checked = summary.coverage_checked;
        debug!(errors = summary.errors, "rule table revalidated");
        summary
    }

    /// First group whose root matches the combination.
    pub fn find_match(&self, combination: &Combination) -> Option<&RuleGroup> {
        find_matching_group(&self.groups, combination, &self.definitions)
    }

    /// Counts of the current annotations; they may be stale.
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary::from_groups(&self.groups, self.coverage_checked)
    }

    pub fn into_groups(self) -> Vec<RuleGroup> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use elt_model::{CellValue, HeaderType, MatchBehavior, RowGroup, RuleRow};

    use super::*;

    fn table() -> RuleTable {
        let config = Configuration::new(["amount"]).with_behavior("amount", MatchBehavior::Regular);
        let header_types = HeaderTypes::from([("amount".to_string(), HeaderType::Number)]);
        let groups = vec![
            RowGroup::new(RuleRow::root().with_field("amount_min", 0.0).with_field("amount_max", 9.0)),
            RowGroup::new(RuleRow::root().with_field("amount_min", 10.0)),
        ];
        RuleTable::from_config(groups, &config, &header_types)
    }

    #[test]
    fn new_table_is_stale() {
        let table = table();
        assert!(table.is_stale());
        assert_eq!(table.summary().rows, 2);
    }

    #[test]
    fn validate_clears_and_edit_sets_stale() {
        let mut table = table();
        let summary = table.validate(None);
        assert!(!table.is_stale());
        assert!(!summary.has_errors());

        table.edit(|groups| {
            groups[1].root.set("amount_min", CellValue::Number(5.0));
        });
        assert!(table.is_stale());
        // Annotations are not refreshed until the next validate.
        assert_eq!(table.summary().errors, 0);

        let summary = table.validate(None);
        assert_eq!(summary.errors, 2);
        assert!(!table.is_stale());
    }

    #[test]
    fn find_match_uses_table_definitions() {
        let table = table();
        let combination = Combination::from([("amount".to_string(), CellValue::Number(12.0))]);
        let found = table.find_match(&combination).expect("open range matches");
        assert_eq!(found.root.id, table.groups()[1].root.id);
    }
}
