//! Postgres implementation of the store contracts.

mod events;
mod localized;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};

use sweetjobs_models::{FieldValue, Language, User};

use crate::error::StoreResult;
use crate::metrics;
use crate::traits::{LanguageStore, Store, Transaction, UserStore};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, email, first_name, last_name, role";

/// Connection pool handing out [`PgTx`] transactions.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open Postgres transaction. Dropping it rolls back.
pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTx {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        metrics::record_commit();
        Ok(())
    }
}

#[async_trait]
impl LanguageStore for PgTx {
    async fn find_language(&mut self, key: &str) -> StoreResult<Option<Language>> {
        let language = sqlx::query_as::<_, Language>(
            "SELECT id, key, display_name FROM languages WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(language)
    }

    async fn list_languages(&mut self) -> StoreResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>(
            "SELECT id, key, display_name FROM languages ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(languages)
    }
}

#[async_trait]
impl UserStore for PgTx {
    async fn find_user(&mut self, id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_users(&mut self, ids: &[i32]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY id",
            USER_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(users)
    }
}

/// Comma-separated, quoted column list.
fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns
        .into_iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: FieldValue) {
    match value {
        FieldValue::Text(v) => qb.push_bind(v),
        FieldValue::Int(v) => qb.push_bind(v),
    };
}

/// Time a query and record its outcome.
async fn timed<T, F>(operation: &'static str, table: &'static str, query: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let started = Instant::now();
    let result = query.await;
    metrics::record_query(operation, table, result.is_ok(), started);
    if let Err(e) = &result {
        debug!(operation, table, error = %e, "Query failed");
    }
    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_list_quotes_names() {
        assert_eq!(column_list(["key", "admin_name"]), "\"key\", \"admin_name\"");
    }

    #[test]
    fn test_push_value_binds_typed_nulls() {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO t (a, b) VALUES (");
        push_value(&mut qb, FieldValue::Text(None));
        qb.push(", ");
        push_value(&mut qb, FieldValue::Int(Some(3)));
        qb.push(")");
        assert_eq!(qb.sql(), "INSERT INTO t (a, b) VALUES ($1, $2)");
    }
}
