#![deny(unsafe_code)]
//! Data model for embedded lookup tables.
//!
//! - Persisted shapes: [`Line`], [`Rule`], [`Configuration`]
//! - Editable shapes: [`LineRow`], [`RuleRow`] and their [`RowGroup`]s
//! - Derived shapes: [`RangeDefinition`]s and the [`LookupKeyMapping`]

pub mod config;
pub mod error;
pub mod issue;
pub mod keys;
pub mod row;
pub mod storage;
pub mod value;

pub use config::{Combination, Configuration, HeaderTypes, RangeDefinition, RangeDefinitions};
pub use error::{ModelError, Result};
pub use issue::{Category, Issue, RequiredReason, RowValidation, Severity};
pub use keys::{LookupKeyEntry, LookupKeyMapping, PlaceholderKey};
pub use row::{
    LineGroup, LineRow, NestedBehavior, Row, RowCell, RowGroup, RowId, RuleGroup, RuleRow,
    flatten_groups, group_rows,
};
pub use storage::{Condition, FieldValue, Line, LineField, Operator, Rule, RuleValue, ValueSpec};
pub use value::{
    CellValue, HeaderType, MatchBehavior, compare_values, format_numeric, values_equal,
};
