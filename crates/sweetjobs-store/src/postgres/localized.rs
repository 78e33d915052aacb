//! Parent and translation rows of every localized resource.
//!
//! SQL is assembled from the entity's table names and field-set columns, so
//! one implementation serves every resource. Identifiers come from
//! compile-time constants only; values are always bound.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use sweetjobs_models::{FieldSet, FieldValue, LocalizedEntity, RecordOf, TranslationOf};

use super::{column_list, push_value, timed, PgTx};
use crate::error::{StoreError, StoreResult};
use crate::traits::{ParentStore, TranslationStore};

/// `id, <attributes>` of the parent table.
fn parent_columns<E: LocalizedEntity>() -> String {
    format!("id, {}", column_list(E::Attributes::COLUMNS.iter().copied()))
}

/// `id, <fk> AS parent_id, language_id, <text>` of the translation table.
fn translation_columns<E: LocalizedEntity>() -> String {
    format!(
        "id, \"{}\" AS parent_id, language_id, {}",
        E::FOREIGN_KEY,
        column_list(E::Text::COLUMNS.iter().copied())
    )
}

/// `UPDATE <table> SET a = $1, b = $2 WHERE id = $3`, or `None` when nothing
/// was supplied.
fn update_query<'a>(
    table: &str,
    id: i32,
    supplied: Vec<(&'static str, FieldValue)>,
) -> Option<QueryBuilder<'a, Postgres>> {
    if supplied.is_empty() {
        return None;
    }
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", table));
    for (i, (column, value)) in supplied.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!("\"{}\" = ", column));
        push_value(&mut qb, value);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    Some(qb)
}

#[async_trait]
impl ParentStore for PgTx {
    async fn insert_parent<E: LocalizedEntity>(
        &mut self,
        attributes: &E::Attributes,
    ) -> StoreResult<RecordOf<E>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE,
            column_list(E::Attributes::COLUMNS.iter().copied())
        ));
        for (i, value) in attributes.values().into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(format!(") RETURNING {}", parent_columns::<E>()));

        let record = timed(
            "insert_parent",
            E::TABLE,
            qb.build_query_as::<RecordOf<E>>().fetch_one(&mut *self.tx),
        )
        .await?;
        debug!(entity = E::NAME, id = record.id, "Inserted parent row");
        Ok(record)
    }

    async fn find_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<Option<RecordOf<E>>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", parent_columns::<E>(), E::TABLE);
        timed(
            "find_parent",
            E::TABLE,
            sqlx::query_as::<_, RecordOf<E>>(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn list_parents<E: LocalizedEntity>(
        &mut self,
        owner_id: Option<i32>,
    ) -> StoreResult<Vec<RecordOf<E>>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {}",
            parent_columns::<E>(),
            E::TABLE
        ));
        if let (Some(owner_id), Some(column)) = (owner_id, E::OWNER_COLUMN) {
            qb.push(format!(" WHERE \"{}\" = ", column));
            qb.push_bind(owner_id);
        }
        qb.push(" ORDER BY id");

        timed(
            "list_parents",
            E::TABLE,
            qb.build_query_as::<RecordOf<E>>().fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn update_parent<E: LocalizedEntity>(
        &mut self,
        id: i32,
        attributes: &E::Attributes,
    ) -> StoreResult<bool> {
        let found = match update_query(E::TABLE, id, attributes.supplied()) {
            Some(mut qb) => {
                qb.push(" RETURNING id");
                timed(
                    "update_parent",
                    E::TABLE,
                    qb.build_query_scalar::<i32>().fetch_optional(&mut *self.tx),
                )
                .await?
            }
            // Nothing to write; still take the row lock.
            None => {
                let sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", E::TABLE);
                timed(
                    "lock_parent",
                    E::TABLE,
                    sqlx::query_scalar::<_, i32>(&sql)
                        .bind(id)
                        .fetch_optional(&mut *self.tx),
                )
                .await?
            }
        };
        Ok(found.is_some())
    }

    async fn delete_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE \"{}\" = $1",
            E::TRANSLATION_TABLE,
            E::FOREIGN_KEY
        );
        let dependents = timed(
            "count_translations",
            E::TRANSLATION_TABLE,
            sqlx::query_scalar::<_, i64>(&sql)
                .bind(id)
                .fetch_one(&mut *self.tx),
        )
        .await?;
        if dependents > 0 {
            return Err(StoreError::referential_integrity(format!(
                "{} {} has {} translation(s)",
                E::NAME,
                id,
                dependents
            )));
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = timed(
            "delete_parent",
            E::TABLE,
            sqlx::query(&sql).bind(id).execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TranslationStore for PgTx {
    async fn find_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
    ) -> StoreResult<Option<TranslationOf<E>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE \"{}\" = $1 AND language_id = $2",
            translation_columns::<E>(),
            E::TRANSLATION_TABLE,
            E::FOREIGN_KEY
        );
        timed(
            "find_translation",
            E::TRANSLATION_TABLE,
            sqlx::query_as::<_, TranslationOf<E>>(&sql)
                .bind(parent_id)
                .bind(language_id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn insert_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
        text: &E::Text,
    ) -> StoreResult<TranslationOf<E>> {
        if self
            .find_translation::<E>(parent_id, language_id)
            .await?
            .is_some()
        {
            return Err(StoreError::conflict(format!(
                "{} {} already has a translation for language {}",
                E::NAME,
                parent_id,
                language_id
            )));
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (\"{}\", language_id, {}) VALUES (",
            E::TRANSLATION_TABLE,
            E::FOREIGN_KEY,
            column_list(E::Text::COLUMNS.iter().copied())
        ));
        qb.push_bind(parent_id);
        qb.push(", ");
        qb.push_bind(language_id);
        for value in text.values() {
            qb.push(", ");
            push_value(&mut qb, value);
        }
        qb.push(format!(") RETURNING {}", translation_columns::<E>()));

        let translation = timed(
            "insert_translation",
            E::TRANSLATION_TABLE,
            qb.build_query_as::<TranslationOf<E>>().fetch_one(&mut *self.tx),
        )
        .await?;
        debug!(
            entity = E::NAME,
            parent_id,
            language_id,
            id = translation.id,
            "Inserted translation row"
        );
        Ok(translation)
    }

    async fn update_translation<E: LocalizedEntity>(
        &mut self,
        id: i32,
        text: &E::Text,
    ) -> StoreResult<()> {
        let affected = match update_query(E::TRANSLATION_TABLE, id, text.supplied()) {
            Some(mut qb) => timed(
                "update_translation",
                E::TRANSLATION_TABLE,
                qb.build().execute(&mut *self.tx),
            )
            .await?
            .rows_affected(),
            None => {
                let sql = format!("SELECT id FROM {} WHERE id = $1", E::TRANSLATION_TABLE);
                let found = timed(
                    "find_translation",
                    E::TRANSLATION_TABLE,
                    sqlx::query_scalar::<_, i32>(&sql)
                        .bind(id)
                        .fetch_optional(&mut *self.tx),
                )
                .await?;
                u64::from(found.is_some())
            }
        };

        if affected == 0 {
            return Err(StoreError::not_found(format!("{} translation {}", E::NAME, id)));
        }
        Ok(())
    }

    async fn list_translations_for<E: LocalizedEntity>(
        &mut self,
        parent_ids: &[i32],
    ) -> StoreResult<Vec<TranslationOf<E>>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE \"{}\" = ANY($1)",
            translation_columns::<E>(),
            E::TRANSLATION_TABLE,
            E::FOREIGN_KEY
        );
        timed(
            "list_translations",
            E::TRANSLATION_TABLE,
            sqlx::query_as::<_, TranslationOf<E>>(&sql)
                .bind(parent_ids.to_vec())
                .fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn delete_translations<E: LocalizedEntity>(&mut self, parent_id: i32) -> StoreResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE \"{}\" = $1",
            E::TRANSLATION_TABLE,
            E::FOREIGN_KEY
        );
        let result = timed(
            "delete_translations",
            E::TRANSLATION_TABLE,
            sqlx::query(&sql).bind(parent_id).execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
