//! Request bodies for localized create and update.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::entity::LocalizedEntity;

/// Parent attributes plus one block of text per language.
///
/// ```json
/// { "companyName": "Bistro", "defaultLanguage": { "title": "Szakács" },
///   "secondaryLanguage": { "title": "Cook" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedPayload<A, T> {
    #[serde(flatten)]
    pub attributes: A,
    #[serde(default)]
    pub default_language: T,
    #[serde(default)]
    pub secondary_language: Option<T>,
}

pub type PayloadOf<E> =
    LocalizedPayload<<E as LocalizedEntity>::Attributes, <E as LocalizedEntity>::Text>;

impl<A: Validate, T: Validate> LocalizedPayload<A, T> {
    /// Validate the attributes and every language block.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.attributes.validate()?;
        self.default_language.validate()?;
        if let Some(secondary) = &self.secondary_language {
            secondary.validate()?;
        }
        Ok(())
    }
}
