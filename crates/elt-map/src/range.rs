//! Range definition resolution.

use std::collections::BTreeMap;

use elt_model::{
    Configuration, HeaderType, HeaderTypes, MatchBehavior, RangeDefinition, RangeDefinitions,
};

const MIN_SUFFIX: &str = "_min";
const MAX_SUFFIX: &str = "_max";

/// Column ids of a header's lower and upper bound.
pub fn range_column_ids(header: &str) -> [String; 2] {
    [
        format!("{header}{MIN_SUFFIX}"),
        format!("{header}{MAX_SUFFIX}"),
    ]
}

/// Resolves the storage column(s) of one header.
///
/// Ordered types under `regular` get a `[low, high]` pair; everything else
/// uses a single column named after the header.
pub fn resolve_range_definition(
    header: &str,
    header_type: HeaderType,
    behavior: MatchBehavior,
) -> RangeDefinition {
    let column_ids = if header_type.is_ordered() && behavior == MatchBehavior::Regular {
        range_column_ids(header).to_vec()
    } else {
        vec![header.to_string()]
    };
    RangeDefinition {
        header: header.to_string(),
        header_type,
        behavior,
        column_ids,
    }
}

/// Resolves range definitions for the chosen headers, in order.
///
/// Headers without a type are strings; headers without a behavior are regular.
pub fn resolve_range_definitions(
    headers: &[String],
    header_types: &HeaderTypes,
    behaviors: &BTreeMap<String, MatchBehavior>,
) -> RangeDefinitions {
    let definitions = headers
        .iter()
        .map(|header| {
            let header_type = header_types.get(header).copied().unwrap_or_default();
            let behavior = behaviors.get(header).copied().unwrap_or_default();
            resolve_range_definition(header, header_type, behavior)
        })
        .collect();
    RangeDefinitions {
        definitions,
        case_insensitive: false,
    }
}

/// Resolves range definitions from a table configuration.
pub fn range_definitions_for(config: &Configuration, header_types: &HeaderTypes) -> RangeDefinitions {
    let mut definitions = resolve_range_definitions(
        &config.selected_headers,
        header_types,
        &config.selected_headers_match_behavior,
    );
    definitions.case_insensitive = config.case_insensitive_matching;
    definitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_regular_headers_get_two_columns() {
        for header_type in [HeaderType::Number, HeaderType::Percent, HeaderType::Date] {
            let definition = resolve_range_definition("amount", header_type, MatchBehavior::Regular);
            assert_eq!(definition.column_ids, vec!["amount_min", "amount_max"]);
            assert_eq!(definition.low_column(), Some("amount_min"));
            assert_eq!(definition.high_column(), Some("amount_max"));
        }
    }

    #[test]
    fn value_behaviors_collapse_to_one_column() {
        for behavior in [MatchBehavior::Ratio, MatchBehavior::Interpolation] {
            let definition = resolve_range_definition("wi", HeaderType::Percent, behavior);
            assert_eq!(definition.column_ids, vec!["wi"]);
            assert!(!definition.is_range());
        }
    }

    #[test]
    fn unordered_types_always_use_one_column() {
        let definition = resolve_range_definition("basin", HeaderType::String, MatchBehavior::Regular);
        assert_eq!(definition.column_ids, vec!["basin"]);
        let definition = resolve_range_definition("flag", HeaderType::Boolean, MatchBehavior::Regular);
        assert_eq!(definition.column_ids, vec!["flag"]);
    }

    #[test]
    fn configuration_defaults_and_case_setting() {
        let config = Configuration::new(["basin", "amount"])
            .with_behavior("amount", MatchBehavior::Ratio)
            .with_case_insensitive_matching(true);
        let header_types = HeaderTypes::from([("amount".to_string(), HeaderType::Number)]);

        let definitions = range_definitions_for(&config, &header_types);
        assert!(definitions.case_insensitive);
        let basin = definitions.get("basin").unwrap();
        assert_eq!(basin.header_type, HeaderType::String);
        assert_eq!(basin.behavior, MatchBehavior::Regular);
        assert_eq!(definitions.get("amount").unwrap().column_ids, vec!["amount"]);
    }
}
