#![deny(unsafe_code)]
//! Conversion between persisted lookup tables and editable rows.

pub mod error;
pub mod lines;
pub mod model;
pub mod range;
pub mod rules;
pub mod strategy;

pub use error::{MapError, Result};
pub use lines::{LineIssue, LineRowModel, lines_to_rows, rows_to_lines};
pub use model::{RowModel, StorageModel, to_row_model, to_storage_model};
pub use range::{
    range_column_ids, range_definitions_for, resolve_range_definition, resolve_range_definitions,
};
pub use rules::{fold_interpolation_rules, rows_to_rules, rules_to_rows};
pub use strategy::{DefaultShaping, NestedFields, ShapingStrategy};
