//! Typed column sets shared by parent rows and translation rows.
//!
//! Every localized resource is described by two field sets: the
//! language-independent attributes of the parent row and the free-text
//! fields of one translation row. All fields are optional so that the same
//! type serves as insert payload (absent = NULL) and as partial update
//! (absent = leave unchanged).

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use validator::Validate;

/// A single column value, typed so that NULLs bind with the right SQL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Int(Option<i32>),
}

impl FieldValue {
    /// True if the field was supplied.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.is_some(),
            FieldValue::Int(v) => v.is_some(),
        }
    }

    /// True if the field is absent or an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.as_deref().map_or(true, str::is_empty),
            FieldValue::Int(v) => v.is_none(),
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) => *v,
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => v.as_deref(),
            FieldValue::Int(_) => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Option<i32>> for FieldValue {
    fn from(value: Option<i32>) -> Self {
        FieldValue::Int(value)
    }
}

/// A fixed set of nullable columns.
///
/// Implemented through [`field_set!`]; `COLUMNS` and `values()` are always
/// in the same order.
pub trait FieldSet:
    Debug
    + Clone
    + Default
    + PartialEq
    + Send
    + Sync
    + Unpin
    + Serialize
    + DeserializeOwned
    + Validate
    + for<'r> FromRow<'r, PgRow>
    + 'static
{
    /// Column names, which are also the struct field names.
    const COLUMNS: &'static [&'static str];

    /// Current values in `COLUMNS` order.
    fn values(&self) -> Vec<FieldValue>;

    /// Overwrite every field that is present in `patch`.
    fn merge(&mut self, patch: &Self);

    /// Columns paired with their values, absent ones included.
    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        Self::COLUMNS.iter().copied().zip(self.values()).collect()
    }

    /// Only the columns that were supplied.
    fn supplied(&self) -> Vec<(&'static str, FieldValue)> {
        self.columns()
            .into_iter()
            .filter(|(_, value)| value.is_present())
            .collect()
    }

    /// Value of a single column, if the column exists.
    fn get(&self, column: &str) -> Option<FieldValue> {
        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// True if every field is absent or empty.
    ///
    /// This is the trigger for creating a secondary-language translation:
    /// a block with at least one non-empty field creates a row.
    fn is_blank(&self) -> bool {
        self.values().iter().all(FieldValue::is_blank)
    }
}

/// Declare a [`FieldSet`] struct.
///
/// ```rust,ignore
/// field_set! {
///     pub struct RoleText {
///         #[validate(length(max = 255))]
///         name: String,
///     }
/// }
/// ```
macro_rules! field_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::sqlx::FromRow,
            ::validator::Validate,
        )]
        #[serde(default, rename_all = "camelCase")]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: ::std::option::Option<$ty>, )*
        }

        impl $crate::fields::FieldSet for $name {
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn values(&self) -> ::std::vec::Vec<$crate::fields::FieldValue> {
                vec![$($crate::fields::FieldValue::from(self.$field.clone())),*]
            }

            fn merge(&mut self, patch: &Self) {
                $(
                    if patch.$field.is_some() {
                        self.$field = patch.$field.clone();
                    }
                )*
            }
        }
    };
}

pub(crate) use field_set;
