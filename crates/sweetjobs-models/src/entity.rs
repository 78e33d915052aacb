//! Parent rows, translation rows and the joined view of both.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::fields::FieldSet;

/// A resource whose free-text content is stored once per language.
///
/// Implementors are zero-sized markers; the associated field sets and table
/// names are everything the stores and the service need.
pub trait LocalizedEntity: Send + Sync + 'static {
    /// Singular name for logs and metrics, e.g. "job".
    const NAME: &'static str;

    /// Route segment under `/api`, e.g. "jobs".
    const RESOURCE: &'static str;

    /// Parent table.
    const TABLE: &'static str;

    /// Translation table.
    const TRANSLATION_TABLE: &'static str;

    /// Column in the translation table referencing the parent.
    const FOREIGN_KEY: &'static str;

    /// Attribute holding the owning user's id, for owned resources.
    const OWNER_COLUMN: Option<&'static str> = None;

    /// Language-independent columns of the parent row.
    type Attributes: FieldSet;

    /// Free-text columns of a translation row.
    type Text: FieldSet;
}

/// A stored parent row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<A> {
    pub id: i32,
    #[serde(flatten)]
    pub attributes: A,
}

impl<'r, A> FromRow<'r, PgRow> for Record<A>
where
    A: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            attributes: A::from_row(row)?,
        })
    }
}

/// A stored translation row.
///
/// The foreign key column is selected as `parent_id` whatever its name in
/// the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation<T> {
    pub id: i32,
    pub parent_id: i32,
    pub language_id: i32,
    #[serde(flatten)]
    pub text: T,
}

impl<'r, T> FromRow<'r, PgRow> for Translation<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            language_id: row.try_get("language_id")?,
            text: T::from_row(row)?,
        })
    }
}

/// A parent row joined with its translations, in no particular language order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Localized<A, T> {
    #[serde(flatten)]
    pub record: Record<A>,
    pub translations: Vec<Translation<T>>,
}

impl<A, T> Localized<A, T> {
    pub fn id(&self) -> i32 {
        self.record.id
    }

    /// The translation for a language, if one exists.
    pub fn translation(&self, language_id: i32) -> Option<&Translation<T>> {
        self.translations
            .iter()
            .find(|t| t.language_id == language_id)
    }

    /// Keep only the translation for one language.
    pub fn retain_language(mut self, language_id: i32) -> Self {
        self.translations.retain(|t| t.language_id == language_id);
        self
    }
}

pub type RecordOf<E> = Record<<E as LocalizedEntity>::Attributes>;
pub type TranslationOf<E> = Translation<<E as LocalizedEntity>::Text>;
pub type LocalizedOf<E> = Localized<<E as LocalizedEntity>::Attributes, <E as LocalizedEntity>::Text>;

/// Group translations under their parents, preserving parent order.
pub fn join_translations<A, T>(
    records: Vec<Record<A>>,
    translations: Vec<Translation<T>>,
) -> Vec<Localized<A, T>> {
    let mut joined: Vec<Localized<A, T>> = Vec::with_capacity(records.len());
    let mut positions: HashMap<i32, usize> = HashMap::with_capacity(records.len());
    for record in records {
        positions.insert(record.id, joined.len());
        joined.push(Localized {
            record,
            translations: Vec::new(),
        });
    }

    for translation in translations {
        if let Some(&position) = positions.get(&translation.parent_id) {
            joined[position].translations.push(translation);
        }
    }

    joined
}
