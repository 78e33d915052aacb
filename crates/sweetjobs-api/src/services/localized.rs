//! Localized entity service: joined reads and per-language upserts.
//!
//! Every write runs in one store transaction. A parent row is never visible
//! without its default-language translation.

use tracing::info;

use sweetjobs_models::{
    join_translations, FieldSet, Language, LanguagePair, Localized, LocalizedEntity, LocalizedOf,
    PayloadOf, RecordOf,
};
use sweetjobs_store::{LanguageStore, ParentStore, Store, Transaction, TranslationStore};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

async fn resolve_language<T: LanguageStore>(tx: &mut T, key: &str) -> ApiResult<Language> {
    tx.find_language(key)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("language '{}'", key)))
}

/// Joined read of one parent inside an open transaction.
async fn load<E, T>(tx: &mut T, id: i32) -> ApiResult<LocalizedOf<E>>
where
    E: LocalizedEntity,
    T: ParentStore + TranslationStore,
{
    let record = tx
        .find_parent::<E>(id)
        .await?
        .ok_or_else(|| not_found::<E>(id))?;
    let translations = tx.list_translations::<E>(id).await?;
    Ok(Localized {
        record,
        translations,
    })
}

fn not_found<E: LocalizedEntity>(id: i32) -> ApiError {
    ApiError::not_found(format!("{} {}", E::NAME, id))
}

/// True if the owner column of the row holds `owner_id`.
pub fn owned_by<E: LocalizedEntity>(record: &RecordOf<E>, owner_id: i32) -> bool {
    E::OWNER_COLUMN
        .and_then(|column| record.attributes.get(column))
        .and_then(|value| value.as_int())
        == Some(owner_id)
}

/// Reads and writes any [`LocalizedEntity`].
#[derive(Clone)]
pub struct LocalizedService<S> {
    store: S,
    languages: LanguagePair,
}

impl<S: Store> LocalizedService<S> {
    pub fn new(store: S, languages: LanguagePair) -> Self {
        Self { store, languages }
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// Create the parent, its default translation and, if any secondary
    /// field is non-empty, its secondary translation.
    pub async fn create<E: LocalizedEntity>(&self, payload: PayloadOf<E>) -> ApiResult<LocalizedOf<E>> {
        let mut tx = self.store.begin().await?;

        let default = resolve_language(&mut tx, &self.languages.default_key).await?;
        let record = tx.insert_parent::<E>(&payload.attributes).await?;
        let mut translations = vec![
            tx.insert_translation::<E>(record.id, default.id, &payload.default_language)
                .await?,
        ];

        if let Some(secondary) = payload
            .secondary_language
            .as_ref()
            .filter(|text| !text.is_blank())
        {
            let language = resolve_language(&mut tx, &self.languages.secondary_key).await?;
            translations.push(
                tx.insert_translation::<E>(record.id, language.id, secondary)
                    .await?,
            );
        }

        tx.commit().await?;

        metrics::record_localized_write(E::NAME, "create");
        info!(
            entity = E::NAME,
            id = record.id,
            translations = translations.len(),
            "Created localized record"
        );
        Ok(Localized {
            record,
            translations,
        })
    }

    /// Update the parent and the default translation, and upsert the
    /// secondary translation when a secondary block is supplied.
    pub async fn update<E: LocalizedEntity>(
        &self,
        id: i32,
        payload: PayloadOf<E>,
    ) -> ApiResult<LocalizedOf<E>> {
        self.update_scoped::<E>(id, None, payload).await
    }

    /// Like [`update`](Self::update), but only for rows owned by `owner_id`.
    pub async fn update_owned<E: LocalizedEntity>(
        &self,
        id: i32,
        owner_id: i32,
        payload: PayloadOf<E>,
    ) -> ApiResult<LocalizedOf<E>> {
        self.update_scoped::<E>(id, Some(owner_id), payload).await
    }

    async fn update_scoped<E: LocalizedEntity>(
        &self,
        id: i32,
        owner_id: Option<i32>,
        payload: PayloadOf<E>,
    ) -> ApiResult<LocalizedOf<E>> {
        let mut tx = self.store.begin().await?;

        if let Some(owner_id) = owner_id {
            let record = tx.find_parent::<E>(id).await?;
            if !record.is_some_and(|r| owned_by::<E>(&r, owner_id)) {
                return Err(not_found::<E>(id));
            }
        }
        // Locks the parent row until commit.
        if !tx.update_parent::<E>(id, &payload.attributes).await? {
            return Err(not_found::<E>(id));
        }

        let default = resolve_language(&mut tx, &self.languages.default_key).await?;
        let row = tx
            .find_translation::<E>(id, default.id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "{} {} has no '{}' translation",
                    E::NAME,
                    id,
                    default.key
                ))
            })?;
        tx.update_translation::<E>(row.id, &payload.default_language)
            .await?;

        if let Some(secondary) = &payload.secondary_language {
            let language = resolve_language(&mut tx, &self.languages.secondary_key).await?;
            match tx.find_translation::<E>(id, language.id).await? {
                Some(row) => tx.update_translation::<E>(row.id, secondary).await?,
                None => {
                    tx.insert_translation::<E>(id, language.id, secondary)
                        .await?;
                }
            }
        }

        let updated = load::<E, _>(&mut tx, id).await?;
        tx.commit().await?;

        metrics::record_localized_write(E::NAME, "update");
        info!(entity = E::NAME, id, "Updated localized record");
        Ok(updated)
    }

    /// Overwrite supplied parent attributes only.
    pub async fn update_attributes<E: LocalizedEntity>(
        &self,
        id: i32,
        attributes: &E::Attributes,
    ) -> ApiResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.update_parent::<E>(id, attributes).await? {
            return Err(not_found::<E>(id));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Parent with every translation.
    pub async fn get<E: LocalizedEntity>(&self, id: i32) -> ApiResult<LocalizedOf<E>> {
        let mut tx = self.store.begin().await?;
        load::<E, _>(&mut tx, id).await
    }

    /// Parent with every translation, only if owned by `owner_id`.
    pub async fn get_owned<E: LocalizedEntity>(
        &self,
        id: i32,
        owner_id: i32,
    ) -> ApiResult<LocalizedOf<E>> {
        let localized = self.get::<E>(id).await?;
        if !owned_by::<E>(&localized.record, owner_id) {
            return Err(not_found::<E>(id));
        }
        Ok(localized)
    }

    /// Parent with the translation for one language key only.
    pub async fn get_in_language<E: LocalizedEntity>(
        &self,
        id: i32,
        language_key: &str,
    ) -> ApiResult<LocalizedOf<E>> {
        let mut tx = self.store.begin().await?;
        let language = resolve_language(&mut tx, language_key).await?;
        let localized = load::<E, _>(&mut tx, id).await?;
        Ok(localized.retain_language(language.id))
    }

    /// Every parent with its translations, ordered by id.
    pub async fn list<E: LocalizedEntity>(&self) -> ApiResult<Vec<LocalizedOf<E>>> {
        self.list_scoped::<E>(None).await
    }

    /// Every parent owned by `owner_id`.
    pub async fn list_owned<E: LocalizedEntity>(
        &self,
        owner_id: i32,
    ) -> ApiResult<Vec<LocalizedOf<E>>> {
        self.list_scoped::<E>(Some(owner_id)).await
    }

    async fn list_scoped<E: LocalizedEntity>(
        &self,
        owner_id: Option<i32>,
    ) -> ApiResult<Vec<LocalizedOf<E>>> {
        let mut tx = self.store.begin().await?;
        let records = tx.list_parents::<E>(owner_id).await?;
        let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
        let translations = tx.list_translations_for::<E>(&ids).await?;
        Ok(join_translations(records, translations))
    }

    /// Delete a parent.
    ///
    /// Without `cascade` this fails with a referential-integrity error while
    /// translations exist; with it, translations and parent go together.
    pub async fn delete<E: LocalizedEntity>(&self, id: i32, cascade: bool) -> ApiResult<()> {
        let mut tx = self.store.begin().await?;
        if tx.find_parent::<E>(id).await?.is_none() {
            return Err(not_found::<E>(id));
        }

        let removed = if cascade {
            tx.delete_translations::<E>(id).await?
        } else {
            0
        };
        tx.delete_parent::<E>(id).await?;
        tx.commit().await?;

        metrics::record_localized_write(E::NAME, "delete");
        info!(entity = E::NAME, id, cascade, translations = removed, "Deleted localized record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetjobs_models::{
        Category, CategoryText, Job, JobAttributes, JobText, KeyedAttributes, LocalizedPayload,
    };
    use sweetjobs_store::MemoryStore;

    const HU: i32 = 1;
    const EN: i32 = 2;

    fn service(store: &MemoryStore) -> LocalizedService<MemoryStore> {
        LocalizedService::new(store.clone(), LanguagePair::default())
    }

    fn title(value: &str) -> JobText {
        JobText {
            title: Some(value.to_string()),
            ..Default::default()
        }
    }

    fn job(default: JobText, secondary: Option<JobText>) -> PayloadOf<Job> {
        LocalizedPayload {
            attributes: JobAttributes {
                user_id: Some(7),
                company_name: Some("Bistro".to_string()),
                ..Default::default()
            },
            default_language: default,
            secondary_language: secondary,
        }
    }

    fn update(secondary: Option<JobText>) -> PayloadOf<Job> {
        LocalizedPayload {
            attributes: JobAttributes::default(),
            default_language: JobText::default(),
            secondary_language: secondary,
        }
    }

    #[tokio::test]
    async fn test_create_writes_mandatory_default_translation() {
        let store = MemoryStore::new();
        let service = service(&store);

        let created = service.create::<Job>(job(title("Szakács"), None)).await.unwrap();
        let read = service.get::<Job>(created.id()).await.unwrap();

        assert_eq!(read.translations.len(), 1);
        assert_eq!(read.translations[0].language_id, HU);
        assert_eq!(read.translations[0].text, title("Szakács"));
        assert_eq!(read.record.attributes.company_name.as_deref(), Some("Bistro"));
    }

    #[tokio::test]
    async fn test_blank_secondary_block_creates_nothing() {
        let store = MemoryStore::new();
        let service = service(&store);

        let blank = JobText {
            title: Some(String::new()),
            about_us: None,
            ..Default::default()
        };
        let created = service.create::<Job>(job(title("Cook"), Some(blank))).await.unwrap();
        let read = service.get::<Job>(created.id()).await.unwrap();
        assert!(read.translation(EN).is_none());

        let created = service
            .create::<Job>(job(title("Cook"), Some(JobText::default())))
            .await
            .unwrap();
        assert_eq!(service.get::<Job>(created.id()).await.unwrap().translations.len(), 1);
    }

    #[tokio::test]
    async fn test_any_secondary_field_creates_one_row() {
        let store = MemoryStore::new();
        let service = service(&store);

        let secondary = JobText {
            payment: Some("1000 EUR".to_string()),
            ..Default::default()
        };
        let created = service
            .create::<Job>(job(title("Szakács"), Some(secondary)))
            .await
            .unwrap();
        let read = service.get::<Job>(created.id()).await.unwrap();

        assert_eq!(read.translations.len(), 2);
        let english = read.translation(EN).unwrap();
        assert_eq!(english.text.payment.as_deref(), Some("1000 EUR"));
        assert_eq!(english.text.title, None);
    }

    #[tokio::test]
    async fn test_cook_cuisinier_chef() {
        let store = MemoryStore::new();
        let service = service(&store);

        let created = service
            .create::<Job>(job(title("Cook"), Some(title(""))))
            .await
            .unwrap();
        let id = created.id();
        let read = service.get::<Job>(id).await.unwrap();
        assert_eq!(read.translations.len(), 1);
        assert_eq!(read.translations[0].language_id, HU);
        assert_eq!(read.translations[0].text.title.as_deref(), Some("Cook"));

        service
            .update::<Job>(id, update(Some(title("Cuisinier"))))
            .await
            .unwrap();
        let read = service.get::<Job>(id).await.unwrap();
        assert_eq!(read.translations.len(), 2);
        assert_eq!(read.translation(EN).unwrap().text.title.as_deref(), Some("Cuisinier"));

        service.update::<Job>(id, update(Some(title("Chef")))).await.unwrap();
        let read = service.get::<Job>(id).await.unwrap();
        assert_eq!(read.translations.len(), 2);
        assert_eq!(read.translation(EN).unwrap().text.title.as_deref(), Some("Chef"));
        assert_eq!(read.translation(HU).unwrap().text.title.as_deref(), Some("Cook"));
    }

    #[tokio::test]
    async fn test_repeated_update_keeps_single_secondary_row() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service.create::<Job>(job(title("Cook"), None)).await.unwrap().id();

        for _ in 0..2 {
            service.update::<Job>(id, update(Some(title("Chef")))).await.unwrap();
        }

        let read = service.get::<Job>(id).await.unwrap();
        let english: Vec<_> = read.translations.iter().filter(|t| t.language_id == EN).collect();
        assert_eq!(english.len(), 1);
        assert_eq!(english[0].text.title.as_deref(), Some("Chef"));
    }

    #[tokio::test]
    async fn test_update_writes_empty_secondary_block() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service.create::<Job>(job(title("Cook"), None)).await.unwrap().id();

        service
            .update::<Job>(id, update(Some(JobText::default())))
            .await
            .unwrap();

        let read = service.get::<Job>(id).await.unwrap();
        assert_eq!(read.translations.len(), 2);
        assert_eq!(read.translation(EN).unwrap().text, JobText::default());
    }

    #[tokio::test]
    async fn test_update_leaves_unspecified_fields() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service.create::<Job>(job(title("Cook"), None)).await.unwrap().id();

        let payload = LocalizedPayload {
            attributes: JobAttributes {
                job_location: Some("Szeged".to_string()),
                ..Default::default()
            },
            default_language: JobText {
                payment: Some("300000 HUF".to_string()),
                ..Default::default()
            },
            secondary_language: None,
        };
        let updated = service.update::<Job>(id, payload).await.unwrap();

        assert_eq!(updated.record.attributes.company_name.as_deref(), Some("Bistro"));
        assert_eq!(updated.record.attributes.job_location.as_deref(), Some("Szeged"));
        let hungarian = updated.translation(HU).unwrap();
        assert_eq!(hungarian.text.title.as_deref(), Some("Cook"));
        assert_eq!(hungarian.text.payment.as_deref(), Some("300000 HUF"));
        assert!(updated.translation(EN).is_none());
    }

    #[tokio::test]
    async fn test_update_missing_parent_is_not_found() {
        let store = MemoryStore::new();
        let service = service(&store);
        let err = service.update::<Job>(42, update(None)).await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn test_update_owned_rejects_other_owner() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service.create::<Job>(job(title("Cook"), None)).await.unwrap().id();

        let err = service
            .update_owned::<Job>(id, 8, update(Some(title("Chef"))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        // Rolled back: nothing was written.
        assert_eq!(service.get::<Job>(id).await.unwrap().translations.len(), 1);

        service
            .update_owned::<Job>(id, 7, update(Some(title("Chef"))))
            .await
            .unwrap();
        assert_eq!(service.get::<Job>(id).await.unwrap().translations.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_create_rolls_back_parent() {
        // Secondary language missing: fails after parent and default row.
        let store = MemoryStore::with_languages(&[("hu", "Magyar")]);
        let service = service(&store);

        let err = service
            .create::<Job>(job(title("Cook"), Some(title("Cook"))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        assert!(service.list::<Job>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_default_language_is_not_found() {
        let store = MemoryStore::with_languages(&[]);
        let service = service(&store);
        let err = service.create::<Job>(job(title("Cook"), None)).await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn test_delete_is_restricted_unless_cascading() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service
            .create::<Job>(job(title("Cook"), Some(title("Cook"))))
            .await
            .unwrap()
            .id();

        let err = service.delete::<Job>(id, false).await.unwrap_err();
        assert_eq!(err.kind(), "ReferentialIntegrityError");
        assert_eq!(service.get::<Job>(id).await.unwrap().translations.len(), 2);

        service.delete::<Job>(id, true).await.unwrap();
        let err = service.get::<Job>(id).await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");

        let err = service.delete::<Job>(id, true).await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn test_list_joins_each_parent() {
        let store = MemoryStore::new();
        let service = service(&store);

        for key in ["kitchen", "office"] {
            service
                .create::<Category>(LocalizedPayload {
                    attributes: KeyedAttributes {
                        key: Some(key.to_string()),
                        admin_name: None,
                    },
                    default_language: CategoryText {
                        name: Some(key.to_uppercase()),
                        description: None,
                    },
                    secondary_language: None,
                })
                .await
                .unwrap();
        }

        let categories = service.list::<Category>().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().all(|c| c.translations.len() == 1));
        assert_eq!(
            categories[1].translations[0].text.name.as_deref(),
            Some("OFFICE")
        );
    }

    #[tokio::test]
    async fn test_get_in_language_and_owned_reads() {
        let store = MemoryStore::new();
        let service = service(&store);
        let id = service
            .create::<Job>(job(title("Szakács"), Some(title("Cook"))))
            .await
            .unwrap()
            .id();

        let english = service.get_in_language::<Job>(id, "en").await.unwrap();
        assert_eq!(english.translations.len(), 1);
        assert_eq!(english.translations[0].text.title.as_deref(), Some("Cook"));

        let err = service.get_in_language::<Job>(id, "de").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");

        assert!(service.get_owned::<Job>(id, 7).await.is_ok());
        assert!(service.get_owned::<Job>(id, 8).await.is_err());
        assert_eq!(service.list_owned::<Job>(7).await.unwrap().len(), 1);
        assert!(service.list_owned::<Job>(8).await.unwrap().is_empty());
    }
}
