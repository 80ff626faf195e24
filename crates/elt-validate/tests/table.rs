//! Loading, validating, matching and materializing a whole table.

use elt_map::{DefaultShaping, to_row_model};
use elt_model::{
    CellValue, Combination, Configuration, HeaderTypes, Issue, Line, RequiredReason, Rule,
};
use elt_validate::{DefaultPolicy, RuleTable, materialize_group, virtual_line_issues};

const PRICE: &str = "6f0c7f4e-6a6c-4f0e-9d0e-3c1b4f2d8a11-price";

fn document() -> (Configuration, HeaderTypes, Vec<Line>, Vec<Rule>) {
    let config: Configuration = serde_json::from_value(serde_json::json!({
        "selectedHeaders": ["basin", "rate"],
        "selectedHeadersMatchBehavior": {"rate": "interpolation"},
        "caseInsensitiveMatching": true
    }))
    .expect("configuration");
    let header_types: HeaderTypes = serde_json::from_value(serde_json::json!({
        "basin": "string",
        "rate": "number"
    }))
    .expect("header types");
    let lines: Vec<Line> = serde_json::from_value(serde_json::json!([
        [
            {"key": "description", "value": "Oil price"},
            {"key": "price", "lookup": PRICE}
        ]
    ]))
    .expect("lines");
    let rules: Vec<Rule> = serde_json::from_value(serde_json::json!([
        {
            "conditions": [
                {"key": "basin", "operator": "=", "value": "Permian"},
                {"key": "rate", "operator": "=", "value": 100, "childrenValues": [200]}
            ],
            "values": [{"key": PRICE, "value": 50, "childrenValues": [null]}]
        },
        {
            "conditions": [
                {"key": "basin", "operator": "=", "value": "Bakken"},
                {"key": "rate", "operator": "=", "value": 100, "childrenValues": [100]}
            ],
            "values": [{"key": PRICE, "value": 40, "childrenValues": [45]}]
        }
    ]))
    .expect("rules");
    (config, header_types, lines, rules)
}

fn basin(name: &str) -> Combination {
    Combination::from([("basin".to_string(), CellValue::text(name))])
}

#[test]
fn duplicate_point_blocks_coverage_and_is_reported() {
    let (config, header_types, lines, rules) = document();
    let model =
        to_row_model(&lines, &rules, &config, &header_types, &DefaultShaping).expect("rows");
    let mut table = RuleTable::new(model.rule_groups, model.range_definitions);

    let summary = table.validate(Some(&[basin("Permian")][..]));
    assert_eq!(summary.errors, 1);
    assert!(!summary.coverage_checked);

    let bakken = &table.groups()[1];
    let issues: Vec<&Issue> = bakken.nested[0]
        .validation
        .as_ref()
        .expect("annotated")
        .issues()
        .collect();
    assert!(matches!(
        issues.as_slice(),
        [Issue::DuplicateInterpolationValue { .. }]
    ));
}

#[test]
fn fixed_table_reports_unreached_rules() {
    let (config, header_types, lines, rules) = document();
    let model =
        to_row_model(&lines, &rules, &config, &header_types, &DefaultShaping).expect("rows");
    let mut table = RuleTable::new(model.rule_groups, model.range_definitions);
    table.edit(|groups| {
        groups[1].nested[0].set("rate", CellValue::Number(300.0));
    });

    let summary = table.validate(Some(&[basin("permian")][..]));
    assert!(summary.coverage_checked);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.warnings, 1);
    assert_eq!(
        table.groups()[1].root.validation.as_ref().map(|v| v.row.clone()),
        Some(vec![Issue::InvalidCombination])
    );
}

#[test]
fn matched_group_materializes_with_inheritance() {
    let (config, header_types, lines, rules) = document();
    let model =
        to_row_model(&lines, &rules, &config, &header_types, &DefaultShaping).expect("rows");
    let table = RuleTable::new(model.rule_groups, model.range_definitions);

    let group = table.find_match(&basin("PERMIAN")).expect("case-insensitive match");
    let virtual_lines = materialize_group(&model.line_groups, group, &DefaultPolicy);
    assert_eq!(virtual_lines.len(), 2);
    assert_eq!(virtual_lines[0].value("price"), Some(&CellValue::Number(50.0)));
    // The nested point has no own price and inherits the root's.
    assert_eq!(virtual_lines[1].value("price"), Some(&CellValue::Number(50.0)));
    assert!(virtual_line_issues(&virtual_lines).is_empty());

    assert!(table.find_match(&basin("Anadarko")).is_none());
}

#[test]
fn lone_interpolation_root_is_too_short() {
    let (config, header_types, lines, _) = document();
    let rules: Vec<Rule> = serde_json::from_value(serde_json::json!([
        {
            "conditions": [
                {"key": "basin", "operator": "=", "value": "Permian"},
                {"key": "rate", "operator": "=", "value": 100}
            ],
            "values": [{"key": PRICE, "value": 50}]
        }
    ]))
    .expect("rules");
    let model =
        to_row_model(&lines, &rules, &config, &header_types, &DefaultShaping).expect("rows");
    let mut table = RuleTable::new(model.rule_groups, model.range_definitions);
    table.validate(None);

    let validation = table.groups()[0].root.validation.as_ref().expect("annotated");
    assert_eq!(
        validation.fields["rate"],
        vec![Issue::RequiredValue {
            header: "rate".to_string(),
            reason: RequiredReason::ChainTooShort,
        }]
    );
}
