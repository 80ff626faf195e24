#![deny(unsafe_code)]
//! Matching, coverage and header validation for lookup table rules.
//!
//! - [`matcher`]: which rule applies to a concrete attribute combination
//! - [`coverage`]: unreachable and overlapping rules
//! - [`schema`]: per-header value checks
//! - [`materialize`]: placeholder substitution into virtual lines
//! - [`validate`]: annotation of whole rule sets
//! - [`table`]: edit session with a stale flag

pub mod coverage;
pub mod matcher;
pub mod materialize;
pub mod schema;
pub mod table;
pub mod validate;

pub use coverage::{CoverageReport, analyze_coverage, overlap_headers, regions_overlap};
pub use matcher::{find_matching_group, find_matching_rule, matches};
pub use materialize::{
    DefaultPolicy, MaterializePolicy, VirtualCell, VirtualLine, materialize, materialize_group,
    virtual_line_issues,
};
pub use schema::{ColumnCheck, HeaderSchema, RowContext};
pub use table::RuleTable;
pub use validate::{ValidationSummary, annotate_rules, validate_rules};
