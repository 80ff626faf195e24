//! Per-header validation schema.
//!
//! Each selected header contributes one [`ColumnCheck`] derived from its
//! range definition. Checks run against a [`RowContext`] so interpolation
//! checks can see their neighbours; rows must be visited in stored order.

use std::cmp::Ordering;

use elt_model::{
    CellValue, HeaderType, Issue, MatchBehavior, RangeDefinition, RangeDefinitions,
    RequiredReason, RowValidation, RuleRow, compare_values, values_equal,
};

/// A row with its stored-order neighbours.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub current: &'a RuleRow,
    pub previous: Option<&'a RuleRow>,
    pub next: Option<&'a RuleRow>,
}

impl<'a> RowContext<'a> {
    /// Contexts for every row of a flat, stored-order slice.
    pub fn sequence(rows: &[&'a RuleRow]) -> Vec<RowContext<'a>> {
        rows.iter()
            .enumerate()
            .map(|(index, &current)| RowContext {
                current,
                previous: index.checked_sub(1).map(|prev| rows[prev]),
                next: rows.get(index + 1).copied(),
            })
            .collect()
    }
}

/// Validation rule of one header.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnCheck {
    /// Regular header on a `[low, high]` pair.
    Range {
        header: String,
        header_type: HeaderType,
        low: String,
        high: String,
    },
    /// Regular header on a single column.
    Exact {
        header: String,
        header_type: HeaderType,
    },
    Ratio {
        header: String,
        header_type: HeaderType,
    },
    Interpolation {
        header: String,
        header_type: HeaderType,
    },
}

impl ColumnCheck {
    pub fn from_definition(definition: &RangeDefinition) -> Self {
        let header = definition.header.clone();
        let header_type = definition.header_type;
        match definition.behavior {
            MatchBehavior::Ratio => ColumnCheck::Ratio {
                header,
                header_type,
            },
            MatchBehavior::Interpolation => ColumnCheck::Interpolation {
                header,
                header_type,
            },
            MatchBehavior::Regular => match (definition.low_column(), definition.high_column()) {
                (Some(low), Some(high)) => ColumnCheck::Range {
                    low: low.to_string(),
                    high: high.to_string(),
                    header,
                    header_type,
                },
                _ => ColumnCheck::Exact {
                    header,
                    header_type,
                },
            },
        }
    }

    pub fn header(&self) -> &str {
        match self {
            ColumnCheck::Range { header, .. }
            | ColumnCheck::Exact { header, .. }
            | ColumnCheck::Ratio { header, .. }
            | ColumnCheck::Interpolation { header, .. } => header,
        }
    }

    /// Regular and ratio checks look at root rows only.
    pub fn applies_to(&self, row: &RuleRow) -> bool {
        matches!(self, ColumnCheck::Interpolation { .. }) || !row.is_nested()
    }

    fn check(&self, context: &RowContext<'_>, validation: &mut RowValidation) {
        let row = context.current;
        match self {
            ColumnCheck::Range {
                header,
                header_type,
                low,
                high,
            } => {
                let low_value = typed_value(row, low, header, *header_type, validation);
                let high_value = typed_value(row, high, header, *header_type, validation);
                if let (Some(min), Some(max)) = (low_value, high_value)
                    && compare_values(max, min, *header_type) == Some(Ordering::Less)
                {
                    validation.push_field(
                        high.as_str(),
                        Issue::HeaderRange {
                            header: header.clone(),
                            min: min.to_string(),
                            max: max.to_string(),
                        },
                    );
                }
            }
            ColumnCheck::Exact {
                header,
                header_type,
            } => {
                typed_value(row, header, header, *header_type, validation);
            }
            ColumnCheck::Ratio {
                header,
                header_type,
            } => {
                let Some(value) = required_value(row, header, validation) else {
                    return;
                };
                if !conforms(value, header, *header_type, header, validation) {
                    return;
                }
                if let Some(number) = value.as_f64().filter(|_| header_type.is_numeric()) {
                    if number == 0.0 {
                        validation.push_field(
                            header.as_str(),
                            Issue::NonZeroValue {
                                header: header.clone(),
                            },
                        );
                    }
                    if *header_type == HeaderType::Percent && !(0.0..=100.0).contains(&number) {
                        validation.push_field(
                            header.as_str(),
                            Issue::PercentOutOfBounds {
                                header: header.clone(),
                                value: value.to_string(),
                            },
                        );
                    }
                }
            }
            ColumnCheck::Interpolation {
                header,
                header_type,
            } => {
                if let Some(value) = required_value(row, header, validation) {
                    conforms(value, header, *header_type, header, validation);
                }
                if row.is_nested() {
                    check_previous_point(context, header, *header_type, validation);
                } else if !context.next.is_some_and(RuleRow::is_nested) {
                    validation.push_field(
                        header.as_str(),
                        Issue::RequiredValue {
                            header: header.clone(),
                            reason: RequiredReason::ChainTooShort,
                        },
                    );
                }
            }
        }
    }
}

fn check_previous_point(
    context: &RowContext<'_>,
    header: &str,
    header_type: HeaderType,
    validation: &mut RowValidation,
) {
    let Some(previous) = context.previous else {
        validation.push_field(
            header,
            Issue::RequiredValue {
                header: header.to_string(),
                reason: RequiredReason::MissingPreviousPoint,
            },
        );
        return;
    };
    if let (Some(current), Some(before)) =
        (context.current.value(header), previous.value(header))
        && values_equal(current, before, header_type, false)
    {
        validation.push_field(
            header,
            Issue::DuplicateInterpolationValue {
                header: header.to_string(),
                value: current.to_string(),
            },
        );
    }
}

fn required_value<'a>(
    row: &'a RuleRow,
    header: &str,
    validation: &mut RowValidation,
) -> Option<&'a CellValue> {
    let value = row.value(header);
    if value.is_none() {
        validation.push_field(
            header,
            Issue::RequiredValue {
                header: header.to_string(),
                reason: RequiredReason::EmptyValue,
            },
        );
    }
    value
}

/// Present value of a column, if it reads as the header type.
fn typed_value<'a>(
    row: &'a RuleRow,
    column: &str,
    header: &str,
    header_type: HeaderType,
    validation: &mut RowValidation,
) -> Option<&'a CellValue> {
    row.value(column)
        .filter(|value| conforms(value, column, header_type, header, validation))
}

fn conforms(
    value: &CellValue,
    column: &str,
    header_type: HeaderType,
    header: &str,
    validation: &mut RowValidation,
) -> bool {
    let ok = value.conforms_to(header_type);
    if !ok {
        validation.push_field(
            column,
            Issue::InvalidValueType {
                header: header.to_string(),
                expected: header_type,
                value: value.to_string(),
            },
        );
    }
    ok
}

/// Column checks for every selected header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSchema {
    checks: Vec<ColumnCheck>,
}

impl HeaderSchema {
    pub fn from_definitions(definitions: &RangeDefinitions) -> Self {
        Self {
            checks: definitions.iter().map(ColumnCheck::from_definition).collect(),
        }
    }

    pub fn checks(&self) -> &[ColumnCheck] {
        &self.checks
    }

    /// Runs every applicable check on the context's current row.
    pub fn validate_row(&self, context: &RowContext<'_>) -> RowValidation {
        let mut validation = RowValidation::default();
        for check in &self.checks {
            if check.applies_to(context.current) {
                check.check(context, &mut validation);
            }
        }
        validation
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use elt_map::resolve_range_definitions;
    use elt_model::{HeaderTypes, NestedBehavior};

    use super::*;

    fn schema(entries: &[(&str, HeaderType, MatchBehavior)]) -> HeaderSchema {
        let headers: Vec<String> = entries.iter().map(|(h, _, _)| h.to_string()).collect();
        let types: HeaderTypes = entries.iter().map(|(h, t, _)| (h.to_string(), *t)).collect();
        let behaviors: BTreeMap<String, MatchBehavior> =
            entries.iter().map(|(h, _, b)| (h.to_string(), *b)).collect();
        HeaderSchema::from_definitions(&resolve_range_definitions(&headers, &types, &behaviors))
    }

    fn validate(schema: &HeaderSchema, rows: &[&RuleRow]) -> Vec<RowValidation> {
        RowContext::sequence(rows)
            .iter()
            .map(|context| schema.validate_row(context))
            .collect()
    }

    fn issues(validation: &RowValidation) -> Vec<&Issue> {
        validation.issues().collect()
    }

    #[test]
    fn inverted_range_is_reported_on_high_column() {
        let schema = schema(&[("amount", HeaderType::Number, MatchBehavior::Regular)]);
        let row = RuleRow::root()
            .with_field("amount_min", 20.0)
            .with_field("amount_max", 10.0);
        let result = &validate(&schema, &[&row])[0];
        assert!(matches!(
            result.fields["amount_max"].as_slice(),
            [Issue::HeaderRange { .. }]
        ));
    }

    #[test]
    fn inverted_date_range_is_reported() {
        let schema = schema(&[("start", HeaderType::Date, MatchBehavior::Regular)]);
        let row = RuleRow::root()
            .with_field("start_min", "2025-01-01")
            .with_field("start_max", "2024-12-31");
        let result = &validate(&schema, &[&row])[0];
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn regular_bounds_are_optional_but_typed() {
        let schema = schema(&[("amount", HeaderType::Number, MatchBehavior::Regular)]);
        let open = RuleRow::root().with_field("amount_min", 5.0);
        assert!(validate(&schema, &[&open])[0].is_empty());

        let wrong = RuleRow::root().with_field("amount_max", "lots");
        let result = &validate(&schema, &[&wrong])[0];
        assert!(matches!(
            issues(result).as_slice(),
            [Issue::InvalidValueType { expected: HeaderType::Number, .. }]
        ));
    }

    #[test]
    fn ratio_values_are_required_non_zero_and_bounded() {
        let schema = schema(&[("wi", HeaderType::Percent, MatchBehavior::Ratio)]);
        let empty = RuleRow::root();
        let zero = RuleRow::root().with_field("wi", 0.0);
        let over = RuleRow::root().with_field("wi", 120.0);
        let fine = RuleRow::root().with_field("wi", 37.5);

        let results = validate(&schema, &[&empty]);
        assert!(matches!(
            issues(&results[0]).as_slice(),
            [Issue::RequiredValue { reason: RequiredReason::EmptyValue, .. }]
        ));
        assert!(matches!(
            issues(&validate(&schema, &[&zero])[0]).as_slice(),
            [Issue::NonZeroValue { .. }]
        ));
        assert!(matches!(
            issues(&validate(&schema, &[&over])[0]).as_slice(),
            [Issue::PercentOutOfBounds { .. }]
        ));
        assert!(validate(&schema, &[&fine])[0].is_empty());
    }

    #[test]
    fn ratio_checks_skip_nested_rows() {
        let schema = schema(&[("wi", HeaderType::Percent, MatchBehavior::Ratio)]);
        let root = RuleRow::root().with_field("wi", 50.0);
        let nested = RuleRow::nested(NestedBehavior::Interpolation);
        let results = validate(&schema, &[&root, &nested]);
        assert!(results.iter().all(RowValidation::is_empty));
    }

    #[test]
    fn duplicate_interpolation_point_is_reported_on_nested_row() {
        let schema = schema(&[("rate", HeaderType::Number, MatchBehavior::Interpolation)]);
        let root = RuleRow::root().with_field("rate", 5.0);
        let same = RuleRow::nested(NestedBehavior::Interpolation).with_field("rate", 5.0);
        let results = validate(&schema, &[&root, &same]);
        assert!(results[0].is_empty());
        assert!(matches!(
            issues(&results[1]).as_slice(),
            [Issue::DuplicateInterpolationValue { .. }]
        ));

        let next = RuleRow::nested(NestedBehavior::Interpolation).with_field("rate", 7.0);
        let results = validate(&schema, &[&root, &next]);
        assert!(results.iter().all(RowValidation::is_empty));
    }

    #[test]
    fn lone_interpolation_root_is_too_short() {
        let schema = schema(&[("rate", HeaderType::Number, MatchBehavior::Interpolation)]);
        let first = RuleRow::root().with_field("rate", 5.0);
        let second = RuleRow::root().with_field("rate", 6.0);
        let results = validate(&schema, &[&first, &second]);
        for result in &results {
            assert!(matches!(
                issues(result).as_slice(),
                [Issue::RequiredValue { reason: RequiredReason::ChainTooShort, .. }]
            ));
        }
    }

    #[test]
    fn orphan_nested_point_misses_previous_point() {
        let schema = schema(&[("rate", HeaderType::Number, MatchBehavior::Interpolation)]);
        let orphan = RuleRow::nested(NestedBehavior::Interpolation).with_field("rate", 5.0);
        let result = &validate(&schema, &[&orphan])[0];
        assert!(matches!(
            issues(result).as_slice(),
            [Issue::RequiredValue { reason: RequiredReason::MissingPreviousPoint, .. }]
        ));
    }

    #[test]
    fn empty_interpolation_step_is_required() {
        let schema = schema(&[("rate", HeaderType::Number, MatchBehavior::Interpolation)]);
        let root = RuleRow::root().with_field("rate", 5.0);
        let blank = RuleRow::nested(NestedBehavior::Interpolation).with_field("rate", "");
        let results = validate(&schema, &[&root, &blank]);
        assert!(matches!(
            issues(&results[1]).as_slice(),
            [Issue::RequiredValue { reason: RequiredReason::EmptyValue, .. }]
        ));
    }
}
