//! In-memory implementation of the store contracts.
//!
//! A transaction holds the table lock for its whole lifetime and works on a
//! copy of every table; `commit` swaps the copy in, dropping discards it.
//! Transactions are therefore fully serialized, which is what the service
//! tests rely on. Parent attributes and translation texts are kept as JSON
//! so one table map serves every resource.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use sweetjobs_models::{
    Event, FieldSet, Language, LocalizedEntity, NewEvent, Record, RecordOf, Translation,
    TranslationOf, User, DEFAULT_LANGUAGE_KEY, SECONDARY_LANGUAGE_KEY,
};

use crate::error::{StoreError, StoreResult};
use crate::metrics;
use crate::traits::{
    EventStore, LanguageStore, ParentStore, Store, Transaction, TranslationStore, UserStore,
};

#[derive(Debug, Clone)]
struct StoredTranslation {
    parent_id: i32,
    language_id: i32,
    text: Value,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    sequences: HashMap<&'static str, i32>,
    languages: Vec<Language>,
    users: BTreeMap<i32, User>,
    parents: HashMap<&'static str, BTreeMap<i32, Value>>,
    translations: HashMap<&'static str, BTreeMap<i32, StoredTranslation>>,
    /// `(parent_id, language_id)` to translation id, per translation table.
    translation_keys: HashMap<&'static str, HashMap<(i32, i32), i32>>,
    events: BTreeMap<i32, Event>,
    event_users: BTreeMap<i32, Vec<i32>>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn parents(&mut self, table: &'static str) -> &mut BTreeMap<i32, Value> {
        self.parents.entry(table).or_default()
    }

    fn translations(&mut self, table: &'static str) -> &mut BTreeMap<i32, StoredTranslation> {
        self.translations.entry(table).or_default()
    }

    fn translation_keys(&mut self, table: &'static str) -> &mut HashMap<(i32, i32), i32> {
        self.translation_keys.entry(table).or_default()
    }
}

/// Store backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    transactions: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// A store seeded with the default and secondary languages.
    pub fn new() -> Self {
        Self::with_languages(&[
            (DEFAULT_LANGUAGE_KEY, "Magyar"),
            (SECONDARY_LANGUAGE_KEY, "English"),
        ])
    }

    /// A store seeded with the given `(key, display name)` languages.
    pub fn with_languages(languages: &[(&str, &str)]) -> Self {
        let mut tables = Tables::default();
        for (key, display_name) in languages {
            let id = tables.next_id("languages");
            tables.languages.push(Language {
                id,
                key: key.to_string(),
                display_name: display_name.to_string(),
            });
        }
        Self {
            tables: Arc::new(Mutex::new(tables)),
            transactions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a user outside any transaction.
    pub async fn add_user(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        role: &str,
    ) -> User {
        let mut tables = self.tables.lock().await;
        let user = User {
            id: tables.next_id("users"),
            email: email.to_string(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            role: role.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        user
    }

    /// Number of transactions started so far.
    pub fn transactions_started(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// An open in-memory transaction.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

fn decode<T: FieldSet>(value: &Value) -> StoreResult<T> {
    Ok(serde_json::from_value(value.clone())?)
}

fn encode<T: FieldSet>(fields: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(fields)?)
}

fn owner_matches<E: LocalizedEntity>(attributes: &E::Attributes, owner_id: i32) -> bool {
    E::OWNER_COLUMN
        .and_then(|column| attributes.get(column))
        .and_then(|value| value.as_int())
        == Some(owner_id)
}

fn translation_of<E: LocalizedEntity>(id: i32, row: &StoredTranslation) -> StoreResult<TranslationOf<E>> {
    Ok(Translation {
        id,
        parent_id: row.parent_id,
        language_id: row.language_id,
        text: decode(&row.text)?,
    })
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(self) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = self;
        *guard = work;
        metrics::record_commit();
        Ok(())
    }
}

#[async_trait]
impl LanguageStore for MemoryTx {
    async fn find_language(&mut self, key: &str) -> StoreResult<Option<Language>> {
        Ok(self.work.languages.iter().find(|l| l.key == key).cloned())
    }

    async fn list_languages(&mut self) -> StoreResult<Vec<Language>> {
        Ok(self.work.languages.clone())
    }
}

#[async_trait]
impl ParentStore for MemoryTx {
    async fn insert_parent<E: LocalizedEntity>(
        &mut self,
        attributes: &E::Attributes,
    ) -> StoreResult<RecordOf<E>> {
        let value = encode(attributes)?;
        let id = self.work.next_id(E::TABLE);
        self.work.parents(E::TABLE).insert(id, value);
        Ok(Record {
            id,
            attributes: attributes.clone(),
        })
    }

    async fn find_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<Option<RecordOf<E>>> {
        match self.work.parents(E::TABLE).get(&id) {
            Some(value) => Ok(Some(Record {
                id,
                attributes: decode(value)?,
            })),
            None => Ok(None),
        }
    }

    async fn list_parents<E: LocalizedEntity>(
        &mut self,
        owner_id: Option<i32>,
    ) -> StoreResult<Vec<RecordOf<E>>> {
        let mut records = Vec::new();
        for (id, value) in self.work.parents(E::TABLE).iter() {
            let attributes: E::Attributes = decode(value)?;
            if let (Some(owner_id), Some(_)) = (owner_id, E::OWNER_COLUMN) {
                if !owner_matches::<E>(&attributes, owner_id) {
                    continue;
                }
            }
            records.push(Record { id: *id, attributes });
        }
        Ok(records)
    }

    async fn update_parent<E: LocalizedEntity>(
        &mut self,
        id: i32,
        attributes: &E::Attributes,
    ) -> StoreResult<bool> {
        let Some(value) = self.work.parents(E::TABLE).get_mut(&id) else {
            return Ok(false);
        };
        let mut current: E::Attributes = decode(value)?;
        current.merge(attributes);
        *value = encode(&current)?;
        Ok(true)
    }

    async fn delete_parent<E: LocalizedEntity>(&mut self, id: i32) -> StoreResult<bool> {
        let dependents = self
            .work
            .translations(E::TRANSLATION_TABLE)
            .values()
            .filter(|t| t.parent_id == id)
            .count();
        if dependents > 0 {
            return Err(StoreError::referential_integrity(format!(
                "{} {} has {} translation(s)",
                E::NAME,
                id,
                dependents
            )));
        }
        Ok(self.work.parents(E::TABLE).remove(&id).is_some())
    }
}

#[async_trait]
impl TranslationStore for MemoryTx {
    async fn find_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
    ) -> StoreResult<Option<TranslationOf<E>>> {
        let Some(id) = self
            .work
            .translation_keys(E::TRANSLATION_TABLE)
            .get(&(parent_id, language_id))
            .copied()
        else {
            return Ok(None);
        };
        match self.work.translations(E::TRANSLATION_TABLE).get(&id) {
            Some(row) => Ok(Some(translation_of::<E>(id, row)?)),
            None => Ok(None),
        }
    }

    async fn insert_translation<E: LocalizedEntity>(
        &mut self,
        parent_id: i32,
        language_id: i32,
        text: &E::Text,
    ) -> StoreResult<TranslationOf<E>> {
        if !self.work.parents(E::TABLE).contains_key(&parent_id) {
            return Err(StoreError::referential_integrity(format!(
                "{} {} does not exist",
                E::NAME,
                parent_id
            )));
        }
        if !self.work.languages.iter().any(|l| l.id == language_id) {
            return Err(StoreError::referential_integrity(format!(
                "language {} does not exist",
                language_id
            )));
        }
        if self
            .work
            .translation_keys(E::TRANSLATION_TABLE)
            .contains_key(&(parent_id, language_id))
        {
            return Err(StoreError::conflict(format!(
                "{} {} already has a translation for language {}",
                E::NAME,
                parent_id,
                language_id
            )));
        }

        let row = StoredTranslation {
            parent_id,
            language_id,
            text: encode(text)?,
        };
        let id = self.work.next_id(E::TRANSLATION_TABLE);
        self.work
            .translations(E::TRANSLATION_TABLE)
            .insert(id, row.clone());
        self.work
            .translation_keys(E::TRANSLATION_TABLE)
            .insert((parent_id, language_id), id);
        translation_of::<E>(id, &row)
    }

    async fn update_translation<E: LocalizedEntity>(
        &mut self,
        id: i32,
        text: &E::Text,
    ) -> StoreResult<()> {
        let Some(row) = self.work.translations(E::TRANSLATION_TABLE).get_mut(&id) else {
            return Err(StoreError::not_found(format!("{} translation {}", E::NAME, id)));
        };
        let mut current: E::Text = decode(&row.text)?;
        current.merge(text);
        row.text = encode(&current)?;
        Ok(())
    }

    async fn list_translations_for<E: LocalizedEntity>(
        &mut self,
        parent_ids: &[i32],
    ) -> StoreResult<Vec<TranslationOf<E>>> {
        self.work
            .translations(E::TRANSLATION_TABLE)
            .iter()
            .filter(|(_, t)| parent_ids.contains(&t.parent_id))
            .map(|(id, t)| translation_of::<E>(*id, t))
            .collect()
    }

    async fn delete_translations<E: LocalizedEntity>(&mut self, parent_id: i32) -> StoreResult<u64> {
        self.work
            .translation_keys(E::TRANSLATION_TABLE)
            .retain(|(parent, _), _| *parent != parent_id);
        let table = self.work.translations(E::TRANSLATION_TABLE);
        let before = table.len();
        table.retain(|_, t| t.parent_id != parent_id);
        Ok((before - table.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryTx {
    async fn find_user(&mut self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&mut self, ids: &[i32]) -> StoreResult<Vec<User>> {
        Ok(self
            .work
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventStore for MemoryTx {
    async fn insert_event(&mut self, event: &NewEvent) -> StoreResult<Event> {
        if self.work.events.values().any(|e| e.link == event.link) {
            return Err(StoreError::conflict(format!("event link {}", event.link)));
        }
        let stored = Event {
            id: self.work.next_id("events"),
            job_id: event.job_id,
            owner_id: event.owner_id,
            link: event.link.clone(),
            start_date: event.start_date,
        };
        self.work.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_event(&mut self, id: i32) -> StoreResult<Option<Event>> {
        Ok(self.work.events.get(&id).cloned())
    }

    async fn find_event_by_link(&mut self, link: &str) -> StoreResult<Option<Event>> {
        Ok(self.work.events.values().find(|e| e.link == link).cloned())
    }

    async fn list_events(&mut self, owner_id: Option<i32>) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .work
            .events
            .values()
            .filter(|e| owner_id.map_or(true, |owner| e.owner_id == owner))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.start_date, e.id));
        Ok(events)
    }

    async fn update_event(
        &mut self,
        id: i32,
        job_id: i32,
        owner_id: i32,
        start_date: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(event) = self.work.events.get_mut(&id) else {
            return Ok(false);
        };
        event.job_id = job_id;
        event.owner_id = owner_id;
        event.start_date = start_date;
        Ok(true)
    }

    async fn delete_event(&mut self, id: i32, owner_id: Option<i32>) -> StoreResult<bool> {
        let owned = match self.work.events.get(&id) {
            Some(event) => owner_id.map_or(true, |owner| event.owner_id == owner),
            None => false,
        };
        if !owned {
            return Ok(false);
        }
        self.work.events.remove(&id);
        self.work.event_users.remove(&id);
        Ok(true)
    }

    async fn set_event_users(&mut self, event_id: i32, user_ids: &[i32]) -> StoreResult<()> {
        if !self.work.events.contains_key(&event_id) {
            return Err(StoreError::referential_integrity(format!(
                "event {} does not exist",
                event_id
            )));
        }
        let mut ids = user_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.work.event_users.insert(event_id, ids);
        Ok(())
    }

    async fn event_user_ids(&mut self, event_id: i32) -> StoreResult<Vec<i32>> {
        Ok(self
            .work
            .event_users
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}
