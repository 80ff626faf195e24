//! Tests for elt-model types.

use elt_model::{
    Configuration, HeaderType, Issue, MatchBehavior, RangeDefinition, RangeDefinitions,
    RequiredReason, RowValidation, Severity,
};

fn definition(header: &str, behavior: MatchBehavior) -> RangeDefinition {
    RangeDefinition {
        header: header.to_string(),
        header_type: HeaderType::Number,
        behavior,
        column_ids: vec![header.to_string()],
    }
}

#[test]
fn configuration_deserializes_from_persisted_shape() {
    let config: Configuration = serde_json::from_str(
        r#"{
            "selectedHeaders": ["basin", "wi"],
            "selectedHeadersMatchBehavior": {"wi": "ratio"},
            "caseInsensitiveMatching": true
        }"#,
    )
    .expect("deserialize configuration");

    assert_eq!(config.selected_headers, vec!["basin", "wi"]);
    assert_eq!(config.behavior("wi"), MatchBehavior::Ratio);
    assert_eq!(config.behavior("basin"), MatchBehavior::Regular);
    assert!(config.case_insensitive_matching);
}

#[test]
fn configuration_defaults_missing_behaviors() {
    let config: Configuration =
        serde_json::from_str(r#"{"selectedHeaders": ["basin"]}"#).expect("deserialize");
    assert!(config.selected_headers_match_behavior.is_empty());
    assert!(!config.case_insensitive_matching);
}

#[test]
fn interpolation_header_requires_exactly_one() {
    let single = RangeDefinitions {
        definitions: vec![
            definition("basin", MatchBehavior::Regular),
            definition("rate", MatchBehavior::Interpolation),
        ],
        case_insensitive: false,
    };
    assert_eq!(
        single.interpolation_header().map(|d| d.header.as_str()),
        Some("rate")
    );
    assert_eq!(single.uniform_value_behavior(), None);

    let double = RangeDefinitions {
        definitions: vec![
            definition("rate", MatchBehavior::Interpolation),
            definition("cut", MatchBehavior::Interpolation),
        ],
        case_insensitive: false,
    };
    assert!(double.interpolation_header().is_none());
    assert_eq!(
        double.uniform_value_behavior(),
        Some(MatchBehavior::Interpolation)
    );
}

#[test]
fn row_validation_counts_by_severity() {
    let mut validation = RowValidation::default();
    assert!(validation.is_empty());

    validation.push_field(
        "wi",
        Issue::RequiredValue {
            header: "wi".to_string(),
            reason: RequiredReason::EmptyValue,
        },
    );
    validation.push_row(Issue::InvalidCombination);

    assert_eq!(validation.error_count(), 1);
    assert_eq!(validation.warning_count(), 1);
    assert!(validation.has_header_errors());
    assert_eq!(Issue::InvalidCombination.severity(), Severity::Warning);
}

#[test]
fn issue_serializes_with_kind_tag() {
    let issue = Issue::DuplicateInterpolationValue {
        header: "rate".to_string(),
        value: "5".to_string(),
    };
    let json = serde_json::to_value(&issue).expect("serialize issue");
    assert_eq!(json["kind"], "duplicateInterpolationValue");
    assert_eq!(issue.rule_id(), "ELT0003");
    assert!(issue.to_string().contains("repeats the previous"));
}
