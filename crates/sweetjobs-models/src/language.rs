//! Language reference data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Key of the language whose translation is mandatory, unless configured.
pub const DEFAULT_LANGUAGE_KEY: &str = "hu";

/// Key of the optional, lazily created translation, unless configured.
pub const SECONDARY_LANGUAGE_KEY: &str = "en";

/// A language rows can be translated into.
///
/// Seeded by migration; the API never creates languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: i32,
    /// Unique short code, e.g. "hu" or "en".
    pub key: String,
    pub display_name: String,
}

/// The two language keys the localized write protocol works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub default_key: String,
    pub secondary_key: String,
}

impl LanguagePair {
    pub fn new(default_key: impl Into<String>, secondary_key: impl Into<String>) -> Self {
        Self {
            default_key: default_key.into(),
            secondary_key: secondary_key.into(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE_KEY, SECONDARY_LANGUAGE_KEY)
    }
}
