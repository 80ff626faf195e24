//! Error types for mapping operations.

use thiserror::Error;

use elt_model::PlaceholderKey;

/// Caller contract violations between a lookup key mapping and row shapes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapError {
    /// Rule value references a placeholder no line declares.
    #[error("rule value references unknown placeholder {0}")]
    UnknownPlaceholder(PlaceholderKey),
    /// Rule value has more entries than the placeholder has keys.
    #[error("placeholder {placeholder} maps {expected} key(s) but the rule holds {found} value(s)")]
    SeriesTooLong {
        placeholder: PlaceholderKey,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, MapError>;
