//! Interview events and their invited users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use sweetjobs_models::{Event, NewEvent};

use super::{timed, PgTx};
use crate::error::StoreResult;
use crate::traits::EventStore;

const EVENT_COLUMNS: &str = "id, job_id, owner_id, link, start_date";

#[async_trait]
impl EventStore for PgTx {
    async fn insert_event(&mut self, event: &NewEvent) -> StoreResult<Event> {
        let sql = format!(
            "INSERT INTO events (job_id, owner_id, link, start_date) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            EVENT_COLUMNS
        );
        timed(
            "insert_event",
            "events",
            sqlx::query_as::<_, Event>(&sql)
                .bind(event.job_id)
                .bind(event.owner_id)
                .bind(&event.link)
                .bind(event.start_date)
                .fetch_one(&mut *self.tx),
        )
        .await
    }

    async fn find_event(&mut self, id: i32) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        timed(
            "find_event",
            "events",
            sqlx::query_as::<_, Event>(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn find_event_by_link(&mut self, link: &str) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE link = $1", EVENT_COLUMNS);
        timed(
            "find_event_by_link",
            "events",
            sqlx::query_as::<_, Event>(&sql)
                .bind(link)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn list_events(&mut self, owner_id: Option<i32>) -> StoreResult<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        if let Some(owner_id) = owner_id {
            qb.push(" WHERE owner_id = ");
            qb.push_bind(owner_id);
        }
        qb.push(" ORDER BY start_date, id");
        timed(
            "list_events",
            "events",
            qb.build_query_as::<Event>().fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn update_event(
        &mut self,
        id: i32,
        job_id: i32,
        owner_id: i32,
        start_date: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let updated = timed(
            "update_event",
            "events",
            sqlx::query_scalar::<_, i32>(
                "UPDATE events SET job_id = $1, owner_id = $2, start_date = $3 \
                 WHERE id = $4 RETURNING id",
            )
            .bind(job_id)
            .bind(owner_id)
            .bind(start_date)
            .bind(id)
            .fetch_optional(&mut *self.tx),
        )
        .await?;
        Ok(updated.is_some())
    }

    async fn delete_event(&mut self, id: i32, owner_id: Option<i32>) -> StoreResult<bool> {
        // Invitations cascade with the event.
        let result = timed(
            "delete_event",
            "events",
            sqlx::query("DELETE FROM events WHERE id = $1 AND ($2::INT IS NULL OR owner_id = $2)")
                .bind(id)
                .bind(owner_id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_event_users(&mut self, event_id: i32, user_ids: &[i32]) -> StoreResult<()> {
        timed(
            "clear_event_users",
            "event_users",
            sqlx::query("DELETE FROM event_users WHERE event_id = $1")
                .bind(event_id)
                .execute(&mut *self.tx),
        )
        .await?;

        if user_ids.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO event_users (event_id, user_id) ");
        qb.push_values(user_ids, |mut row, user_id| {
            row.push_bind(event_id).push_bind(*user_id);
        });
        qb.push(" ON CONFLICT DO NOTHING");
        timed(
            "insert_event_users",
            "event_users",
            qb.build().execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn event_user_ids(&mut self, event_id: i32) -> StoreResult<Vec<i32>> {
        timed(
            "event_user_ids",
            "event_users",
            sqlx::query_scalar::<_, i32>(
                "SELECT user_id FROM event_users WHERE event_id = $1 ORDER BY user_id",
            )
            .bind(event_id)
            .fetch_all(&mut *self.tx),
        )
        .await
    }
}
