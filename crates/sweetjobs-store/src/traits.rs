//! Store contracts.
//!
//! Every operation runs inside a [`Transaction`] obtained from a [`Store`].
//! Nothing is visible to other transactions until `commit`; dropping a
//! transaction discards its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sweetjobs_models::{Event, Language, LocalizedEntity, NewEvent, RecordOf, TranslationOf, User};

use crate::error::StoreResult;

/// Entry point: hands out transactions.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    /// Start a transaction.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// A unit of work over every table.
#[async_trait]
pub trait Transaction:
    LanguageStore + ParentStore + TranslationStore + UserStore + EventStore + Send
{
    /// Make every write of this transaction durable.
    async fn commit(self) -> StoreResult<()>;
}

/// Read-only access to seeded languages.
#[async_trait]
pub trait LanguageStore: Send {
    async fn find_language(&mut self, key: &str) -> StoreResult<Option<Language>>;

    async fn list_languages(&mut self) -> StoreResult<Vec<Language>>;
}

/// Language-independent rows of a localized resource.
#[async_trait]
pub trait ParentStore: Send {
    async fn insert_parent<E: LocalizedEntity>(
        &mut self,
        attributes: &E::Attributes,
    ) -> StoreResult<RecordOf<E>>;

    async fn find_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<Option<RecordOf<E>>>;

    /// All rows ordered by id; `owner_id` filters owned resources and is
    /// ignored for resources without an owner column.
    async fn list_parents<E: LocalizedEntity>(
        &mut self,
        owner_id: Option<i32>,
    ) -> StoreResult<Vec<RecordOf<E>>>;

    /// Overwrite the supplied attributes. Returns false if the row does not
    /// exist. The row stays locked until the transaction ends.
    async fn update_parent<E: LocalizedEntity>(
        &mut self,
        id: i32,
        attributes: &E::Attributes,
    ) -> StoreResult<bool>;

    /// Delete a row that has no translations left.
    ///
    /// Fails with `ReferentialIntegrity` while translations reference it.
    /// Returns false if the row does not exist.
    async fn delete_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<bool>;
}

/// Language-scoped rows of a localized resource.
#[async_trait]
pub trait TranslationStore: Send {
    /// Point lookup on (parent, language).
    async fn find_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
    ) -> StoreResult<Option<TranslationOf<E>>>;

    /// Fails with `Conflict` if the (parent, language) pair already has a row.
    async fn insert_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
        text: &E::Text,
    ) -> StoreResult<TranslationOf<E>>;

    /// Overwrite the supplied fields. Fails with `NotFound` for unknown ids.
    async fn update_translation<E: LocalizedEntity>(
        &mut self,
        id: i32,
        text: &E::Text,
    ) -> StoreResult<()>;

    async fn list_translations<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
    ) -> StoreResult<Vec<TranslationOf<E>>> {
        self.list_translations_for::<E>(&[parent_id]).await
    }

    /// Translations of several parents at once, unordered.
    async fn list_translations_for<E: LocalizedEntity>(
        &mut self,
        parent_ids: &[i32],
    ) -> StoreResult<Vec<TranslationOf<E>>>;

    /// Remove every translation of a parent. Returns the number of rows.
    async fn delete_translations<E: LocalizedEntity>(&mut self, parent_id: i32) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserStore: Send {
    async fn find_user(&mut self, id: i32) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;

    /// Users with the given ids; unknown ids are skipped.
    async fn find_users(&mut self, ids: &[i32]) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait EventStore: Send {
    async fn insert_event(&mut self, event: &NewEvent) -> StoreResult<Event>;

    async fn find_event(&mut self, id: i32) -> StoreResult<Option<Event>>;

    async fn find_event_by_link(&mut self, link: &str) -> StoreResult<Option<Event>>;

    async fn list_events(&mut self, owner_id: Option<i32>) -> StoreResult<Vec<Event>>;

    /// Returns false if the event does not exist.
    async fn update_event(
        &mut self,
        id: i32,
        job_id: i32,
        owner_id: i32,
        start_date: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Delete an event and its invitations, optionally only if owned by
    /// `owner_id`. Returns false if nothing was deleted.
    async fn delete_event(&mut self, id: i32, owner_id: Option<i32>) -> StoreResult<bool>;

    /// Replace the invited users of an event.
    async fn set_event_users(&mut self, event_id: i32, user_ids: &[i32]) -> StoreResult<()>;

    async fn event_user_ids(&mut self, event_id: i32) -> StoreResult<Vec<i32>>;
}
