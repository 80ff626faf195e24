//! Caller-supplied shaping hooks.
//!
//! Tables embedded in different model assumptions shape their rows
//! differently (unit conversion, derived cells, allowed time-series fields).
//! Those differences are injected through [`ShapingStrategy`].

use elt_model::{CellValue, LineField, LineRow};

/// Hooks run by the line and rule mappers.
///
/// Every method has a pass-through default.
pub trait ShapingStrategy {
    /// Whether a line field may vary across time-series steps.
    ///
    /// Placeholders on fields that may not get a single key on the root row.
    fn allows_nested(&self, _field: &str) -> bool {
        true
    }

    /// Runs on every line row produced from storage.
    fn line_to_row(&self, _row: &mut LineRow) {}

    /// Runs on every persisted line field produced from rows.
    fn row_to_line(&self, _field: &mut LineField) {}

    /// Rewrites a stored rule value before it lands in a rule row.
    fn rule_value_to_row(&self, _field: &str, value: CellValue) -> CellValue {
        value
    }

    /// Rewrites a rule row value before it is persisted.
    fn row_value_to_rule_value(&self, _field: &str, value: CellValue) -> CellValue {
        value
    }
}

/// Pass-through strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShaping;

impl ShapingStrategy for DefaultShaping {}

/// Strategy allowing only the listed fields on nested rows.
#[derive(Debug, Clone, Default)]
pub struct NestedFields {
    fields: Vec<String>,
}

impl NestedFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl ShapingStrategy for NestedFields {
    fn allows_nested(&self, field: &str) -> bool {
        self.fields.iter().any(|allowed| allowed == field)
    }
}
