//! Placeholder keys and the lookup key mapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ModelError;

const UUID_LEN: usize = 36;

/// Token marking a line cell as substitutable from a rule.
///
/// Generated keys have the shape `<uuid>-<fieldName>`. Keys loaded from
/// storage are kept verbatim; only [`PlaceholderKey::parse`] enforces the shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderKey(String);

impl PlaceholderKey {
    /// Generates a fresh key for a line field.
    pub fn generate(field: &str) -> Self {
        Self(format!("{}-{field}", Uuid::new_v4()))
    }

    /// Wraps a stored key without checking its shape.
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ModelError::InvalidPlaceholderKey(value));
        }
        Ok(Self(value))
    }

    /// Parses a key, requiring the `<uuid>-<fieldName>` shape.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        if split_key(value).is_none() {
            return Err(ModelError::InvalidPlaceholderKey(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Decodes the field name the key was generated for.
    pub fn field_name(&self) -> Option<&str> {
        split_key(&self.0).map(|(_, field)| field)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn split_key(value: &str) -> Option<(Uuid, &str)> {
    let uuid = Uuid::parse_str(value.get(..UUID_LEN)?).ok()?;
    let field = value.get(UUID_LEN..)?.strip_prefix('-')?;
    if field.is_empty() {
        return None;
    }
    Some((uuid, field))
}

impl fmt::Display for PlaceholderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a placeholder lives on the line side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupKeyEntry {
    /// Line field the placeholder substitutes.
    pub field: String,
    /// Keys per line row; the first is the persisted key.
    pub keys: Vec<PlaceholderKey>,
}

/// Persisted placeholder → ordered per-row keys.
pub type LookupKeyMapping = BTreeMap<PlaceholderKey, LookupKeyEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_decodes_field_name() {
        let key = PlaceholderKey::generate("gas_price");
        assert_eq!(key.field_name(), Some("gas_price"));
        assert!(PlaceholderKey::parse(key.as_str()).is_ok());
    }

    #[test]
    fn field_names_may_contain_hyphens() {
        let key = PlaceholderKey::generate("start-date");
        assert_eq!(key.field_name(), Some("start-date"));
    }

    #[test]
    fn malformed_keys_are_rejected_by_parse() {
        assert!(PlaceholderKey::parse("price").is_err());
        assert!(PlaceholderKey::parse("0f8fad5b-d9cb-469f-a165-70867728950e-").is_err());
        assert!(PlaceholderKey::new("legacy-key").is_ok());
        assert_eq!(PlaceholderKey::new("legacy-key").unwrap().field_name(), None);
        assert!(PlaceholderKey::new("  ").is_err());
    }
}
