//! Values extracted from free-text oracle replies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where a parsed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Found in the reply text.
    Parsed,
    /// Not found; the fallback value was used.
    Defaulted,
}

/// A value paired with its provenance, so "the oracle said 5" can be told
/// apart from "the oracle said nothing and 5 was assumed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedField<T> {
    pub value: T,
    pub source: FieldSource,
}

impl<T> ParsedField<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            source: FieldSource::Parsed,
        }
    }

    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            source: FieldSource::Defaulted,
        }
    }

    /// Use `found` when present, otherwise fall back to `default`.
    pub fn from_option(found: Option<T>, default: T) -> Self {
        match found {
            Some(value) => Self::parsed(value),
            None => Self::defaulted(default),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.source == FieldSource::Parsed
    }

    pub fn is_defaulted(&self) -> bool {
        self.source == FieldSource::Defaulted
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: Copy> ParsedField<T> {
    pub fn get(&self) -> T {
        self.value
    }
}
