//! Integration tests for the document pipeline.

use std::path::PathBuf;

use elt_cli::document::TableDocument;
use elt_cli::pipeline::{
    CheckOptions, IssueLocation, check, match_rule, normalize, parse_combination,
};
use elt_model::{CellValue, Issue, Operator};

fn fixture() -> TableDocument {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/oil_prices.json");
    TableDocument::load(&path).expect("load fixture")
}

#[test]
fn check_reports_missing_series_step_on_virtual_line() {
    let document = fixture();
    let report = check(&document, CheckOptions::default()).expect("check");

    assert!(report.summary.coverage_checked);
    assert_eq!(report.summary.errors, 0);
    assert_eq!(report.summary.warnings, 0);

    assert_eq!(report.issues.len(), 1);
    let reported = &report.issues[0];
    assert_eq!(
        reported.location,
        IssueLocation::VirtualLine {
            rule: 1,
            step: None,
            line: 0,
            line_step: Some(0),
        }
    );
    assert_eq!(reported.column.as_deref(), Some("price"));
    assert!(matches!(
        reported.issue,
        Issue::MaterializationRequiredValue { .. }
    ));
    assert!(report.has_errors());
}

#[test]
fn check_without_materialization_is_clean() {
    let document = fixture();
    let report = check(&document, CheckOptions { materialize: false }).expect("check");
    assert!(report.issues.is_empty());
    assert!(!report.has_errors());
}

#[test]
fn unreached_rule_is_reported_as_warning() {
    let mut document = fixture();
    document.combinations = Some(
        vec![parse_combination(&["basin=permian".to_string()], &document.header_types)
            .expect("combination")],
    );
    let report = check(&document, CheckOptions { materialize: false }).expect("check");
    assert_eq!(report.warning_count(), 1);
    assert_eq!(
        report.issues[0].location,
        IssueLocation::Rule { rule: 1, step: None }
    );
    assert_eq!(report.issues[0].issue, Issue::InvalidCombination);
}

#[test]
fn normalize_folds_points_into_chains() {
    let document = fixture();
    let normalized = normalize(&document).expect("normalize");

    assert_eq!(normalized.rules.len(), 2);
    let rate = normalized.rules[0].condition("rate").expect("rate condition");
    assert_eq!(rate.operator, Operator::Eq);
    assert_eq!(rate.value, CellValue::Number(100.0));
    assert_eq!(rate.children_values, Some(vec![Some(CellValue::Number(200.0))]));
    assert_eq!(normalized.lines, document.lines);
    assert_eq!(normalized.combinations, document.combinations);

    let again = normalize(&normalized).expect("normalize twice");
    assert_eq!(again, normalized);
}

#[test]
fn normalized_document_survives_json() {
    let normalized = normalize(&fixture()).expect("normalize");
    let text = normalized.to_json().expect("serialize");
    let parsed = TableDocument::from_json(&text).expect("parse");
    assert_eq!(parsed, normalized);
}

#[test]
fn match_materializes_every_step() {
    let document = fixture();
    let combination =
        parse_combination(&["basin=PERMIAN".to_string()], &document.header_types).expect("attrs");
    let outcome = match_rule(&document, &combination)
        .expect("match")
        .expect("a rule matches");

    assert_eq!(outcome.rule, 0);
    assert_eq!(outcome.group.nested.len(), 1);
    let prices: Vec<Option<&CellValue>> = outcome
        .virtual_lines
        .iter()
        .map(|line| line.value("price"))
        .collect();
    assert_eq!(
        prices,
        vec![
            Some(&CellValue::Number(60.0)),
            Some(&CellValue::Number(62.0)),
            Some(&CellValue::Number(55.0)),
            Some(&CellValue::Number(57.0)),
        ]
    );
}

#[test]
fn matched_placeholder_columns_show_field_names() {
    let document = fixture();
    let combination =
        parse_combination(&["basin=Permian".to_string()], &document.header_types).expect("attrs");
    let outcome = match_rule(&document, &combination)
        .expect("match")
        .expect("a rule matches");

    let price = "6f0c7f4e-6a6c-4f0e-9d0e-3c1b4f2d8a11-price";
    assert_eq!(outcome.label(price), "price[1]");
    let mut labels: Vec<&str> = outcome
        .group
        .root
        .fields
        .keys()
        .map(|column| outcome.label(column))
        .collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["basin", "price[1]", "price[2]", "rate"]);
}

#[test]
fn unknown_combination_matches_nothing() {
    let document = fixture();
    let combination =
        parse_combination(&["basin=Anadarko".to_string()], &document.header_types).expect("attrs");
    assert!(match_rule(&document, &combination).expect("match").is_none());
}

#[test]
fn malformed_document_is_an_error() {
    let error = TableDocument::from_json("{\"lines\": []}").unwrap_err();
    assert!(error.to_string().contains("parse table document"));
}
