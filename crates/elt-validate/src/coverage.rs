//! Rule reachability and overlap analysis.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use elt_model::{
    CellValue, Combination, HeaderType, RangeDefinition, RangeDefinitions, RowId, RuleRow,
    compare_values, values_equal,
};

use crate::matcher::matches;

/// Outcome of [`analyze_coverage`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    /// Rows no real combination reaches. Empty when no population was given.
    pub unmatched: Vec<RowId>,
    /// Row → rows whose regions intersect it, in row order.
    pub overlaps: BTreeMap<RowId, Vec<RowId>>,
}

impl CoverageReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty() && self.overlaps.is_empty()
    }
}

/// Headers whose regions decide overlap.
///
/// Regular headers, or every header when the whole table is ratio or
/// interpolation.
pub fn overlap_headers(definitions: &RangeDefinitions) -> Vec<&RangeDefinition> {
    if definitions.uniform_value_behavior().is_some() {
        definitions.iter().collect()
    } else {
        definitions.regular().collect()
    }
}

/// Checks reachability against a population and pairwise overlap of root rows.
pub fn analyze_coverage(
    roots: &[&RuleRow],
    population: Option<&[Combination]>,
    definitions: &RangeDefinitions,
) -> CoverageReport {
    let mut report = CoverageReport::default();

    if let Some(population) = population {
        let mut reached = vec![false; roots.len()];
        for combination in population {
            for (index, row) in roots.iter().enumerate() {
                if !reached[index] && matches(row, combination, definitions) {
                    reached[index] = true;
                }
            }
        }
        report.unmatched = roots
            .iter()
            .zip(&reached)
            .filter(|(_, reached)| !**reached)
            .map(|(row, _)| row.id)
            .collect();
    }

    let headers = overlap_headers(definitions);
    for (index, a) in roots.iter().enumerate() {
        for b in &roots[index + 1..] {
            if regions_overlap(a, b, &headers, definitions.case_insensitive) {
                report.overlaps.entry(a.id).or_default().push(b.id);
                report.overlaps.entry(b.id).or_default().push(a.id);
            }
        }
    }

    debug!(
        rules = roots.len(),
        unmatched = report.unmatched.len(),
        overlapping = report.overlaps.len(),
        "analyzed rule coverage"
    );
    report
}

/// Returns true if the regions of two rows intersect on every listed header.
pub fn regions_overlap(
    a: &RuleRow,
    b: &RuleRow,
    headers: &[&RangeDefinition],
    case_insensitive: bool,
) -> bool {
    headers.iter().all(|definition| {
        match (definition.low_column(), definition.high_column()) {
            (Some(low), Some(high)) => intervals_intersect(
                (a.value(low), a.value(high)),
                (b.value(low), b.value(high)),
                definition.header_type,
            ),
            _ => {
                let column = definition.column();
                match (a.value(column), b.value(column)) {
                    (Some(left), Some(right)) => {
                        values_equal(left, right, definition.header_type, case_insensitive)
                    }
                    (None, None) => true,
                    _ => false,
                }
            }
        }
    })
}

type Interval<'a> = (Option<&'a CellValue>, Option<&'a CellValue>);

/// `lowA <= highB && lowB <= highA`; a missing bound is unbounded.
fn intervals_intersect(a: Interval<'_>, b: Interval<'_>, header_type: HeaderType) -> bool {
    not_above(a.0, b.1, header_type) && not_above(b.0, a.1, header_type)
}

fn not_above(low: Option<&CellValue>, high: Option<&CellValue>, header_type: HeaderType) -> bool {
    match (low, high) {
        (Some(low), Some(high)) => compare_values(low, high, header_type) != Some(Ordering::Greater),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use elt_map::resolve_range_definitions;
    use elt_model::{HeaderTypes, MatchBehavior};

    use super::*;

    fn amount_definitions() -> RangeDefinitions {
        resolve_range_definitions(
            &["amount".to_string()],
            &HeaderTypes::from([("amount".to_string(), HeaderType::Number)]),
            &BTreeMap::new(),
        )
    }

    fn range(low: f64, high: f64) -> RuleRow {
        RuleRow::root()
            .with_field("amount_min", low)
            .with_field("amount_max", high)
    }

    #[test]
    fn touching_intervals_overlap() {
        let defs = amount_definitions();
        let headers = overlap_headers(&defs);
        assert!(regions_overlap(&range(10.0, 20.0), &range(20.0, 30.0), &headers, false));
        assert!(!regions_overlap(&range(10.0, 19.0), &range(20.0, 30.0), &headers, false));
    }

    #[test]
    fn missing_bound_is_unbounded() {
        let defs = amount_definitions();
        let headers = overlap_headers(&defs);
        let open = RuleRow::root().with_field("amount_min", 25.0);
        assert!(regions_overlap(&open, &range(20.0, 30.0), &headers, false));
        assert!(!regions_overlap(&open, &range(10.0, 20.0), &headers, false));
    }

    #[test]
    fn report_lists_unreached_and_overlapping_rows() {
        let defs = amount_definitions();
        let a = range(10.0, 20.0);
        let b = range(15.0, 30.0);
        let c = range(100.0, 200.0);
        let population = vec![Combination::from([(
            "amount".to_string(),
            CellValue::Number(12.0),
        )])];

        let report = analyze_coverage(&[&a, &b, &c], Some(population.as_slice()), &defs);
        assert_eq!(report.unmatched, vec![b.id, c.id]);
        assert_eq!(report.overlaps[&a.id], vec![b.id]);
        assert_eq!(report.overlaps[&b.id], vec![a.id]);
        assert!(!report.overlaps.contains_key(&c.id));
    }

    #[test]
    fn coverage_is_skipped_without_population() {
        let defs = amount_definitions();
        let a = range(10.0, 20.0);
        let report = analyze_coverage(&[&a], None, &defs);
        assert!(report.is_clean());
    }

    #[test]
    fn uniform_ratio_tables_compare_every_header() {
        let defs = resolve_range_definitions(
            &["wi".to_string()],
            &HeaderTypes::from([("wi".to_string(), HeaderType::Percent)]),
            &BTreeMap::from([("wi".to_string(), MatchBehavior::Ratio)]),
        );
        let headers = overlap_headers(&defs);
        assert_eq!(headers.len(), 1);
        let a = RuleRow::root().with_field("wi", 50.0);
        let b = RuleRow::root().with_field("wi", 50.0);
        let c = RuleRow::root().with_field("wi", 75.0);
        assert!(regions_overlap(&a, &b, &headers, false));
        assert!(!regions_overlap(&a, &c, &headers, false));
    }
}
