//! Video interview events and their notification mail.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use sweetjobs_models::{
    AdminEventRequest, CreateEventRequest, Event, EventDetails, Job, Localized, LocalizedOf,
    NewEvent, SendLinkRequest, User,
};
use sweetjobs_store::{
    EventStore, ParentStore, Store, Transaction, TranslationStore, UserStore,
};

use crate::error::{ApiError, ApiResult};
use crate::mail::{send_best_effort, Mail, MailTransport};

fn event_not_found(id: i32) -> ApiError {
    ApiError::not_found(format!("event {}", id))
}

/// Owner, invited users and the event itself.
async fn details<T: EventStore + UserStore>(
    tx: &mut T,
    event: Event,
    with_owner: bool,
) -> ApiResult<EventDetails> {
    let owner = if with_owner {
        tx.find_user(event.owner_id).await?.map(|u| u.summary())
    } else {
        None
    };
    let ids = tx.event_user_ids(event.id).await?;
    let users = tx
        .find_users(&ids)
        .await?
        .iter()
        .map(User::summary)
        .collect();
    Ok(EventDetails {
        event,
        owner,
        users,
        job: None,
    })
}

/// The event's job with its translations, if the job still exists.
async fn event_job<T: ParentStore + TranslationStore>(
    tx: &mut T,
    job_id: i32,
) -> ApiResult<Option<LocalizedOf<Job>>> {
    let Some(record) = tx.find_parent::<Job>(job_id).await? else {
        return Ok(None);
    };
    let translations = tx.list_translations::<Job>(job_id).await?;
    Ok(Some(Localized {
        record,
        translations,
    }))
}

/// Every requested user, or NotFound naming the first unknown id.
async fn invited_users<T: UserStore>(tx: &mut T, ids: &[i32]) -> ApiResult<Vec<User>> {
    let users = tx.find_users(ids).await?;
    if let Some(missing) = ids.iter().find(|id| !users.iter().any(|u| u.id == **id)) {
        return Err(ApiError::not_found(format!("user {}", missing)));
    }
    Ok(users)
}

/// A link no stored event uses yet.
async fn fresh_link<T: EventStore>(tx: &mut T) -> ApiResult<String> {
    let mut now = Utc::now();
    loop {
        let link = Event::generate_link(now);
        if tx.find_event_by_link(&link).await?.is_none() {
            return Ok(link);
        }
        now += Duration::milliseconds(1);
    }
}

fn invitation_mail(from: &str, user: &User, event: &Event, event_base_url: &str) -> Mail {
    Mail {
        from: from.to_string(),
        to: user.email.clone(),
        subject: format!("Esemény ({})re való meghívás", event.link),
        html_body: format!(
            "Tisztelt {}. Ezúton értesítjük, hogy {} időpontban esemény meghívást kapott. \
             Amint elindult a videóhívás, emailben értesítjük a szükséges további teendőkről. \
             Az esemény a következő címen lesz elérhető: <br> {}/{}",
            user.full_name(),
            event.formatted_start(),
            event_base_url.trim_end_matches('/'),
            event.link
        ),
    }
}

fn join_key_mail(from: &str, user: &User, event: &Event, pwd_id: &str) -> Mail {
    Mail {
        from: from.to_string(),
        to: user.email.clone(),
        subject: format!("Esemény ({}) indulás", event.link),
        html_body: format!(
            "Tisztelt {}. Ezúton értesítjük, hogy {} időpontra megszervezett esemény elkezdődött.<br> \
             Az eseményre való csatlakozáshoz az előző levélben szereplő linken az alábbi kulcsot \
             kell beilleszteni: {}",
            user.full_name(),
            event.formatted_start(),
            pwd_id
        ),
    }
}

#[derive(Clone)]
pub struct EventService<S> {
    store: S,
    mailer: Arc<dyn MailTransport>,
    mail_from: String,
    event_base_url: String,
}

impl<S: Store> EventService<S> {
    pub fn new(
        store: S,
        mailer: Arc<dyn MailTransport>,
        mail_from: impl Into<String>,
        event_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            mail_from: mail_from.into(),
            event_base_url: event_base_url.into(),
        }
    }

    /// Every event with owner and invited users.
    pub async fn list(&self) -> ApiResult<Vec<EventDetails>> {
        let mut tx = self.store.begin().await?;
        let events = tx.list_events(None).await?;
        let mut result = Vec::with_capacity(events.len());
        for event in events {
            result.push(details(&mut tx, event, true).await?);
        }
        Ok(result)
    }

    pub async fn get(&self, id: i32) -> ApiResult<EventDetails> {
        let mut tx = self.store.begin().await?;
        let event = tx.find_event(id).await?.ok_or_else(|| event_not_found(id))?;
        details(&mut tx, event, true).await
    }

    /// Admin create: one invited user, no mail.
    pub async fn create(&self, request: &AdminEventRequest) -> ApiResult<Event> {
        let mut tx = self.store.begin().await?;
        invited_users(&mut tx, &[request.owner_id, request.user_id]).await?;

        let link = fresh_link(&mut tx).await?;
        let event = tx
            .insert_event(&NewEvent {
                job_id: request.job_id,
                owner_id: request.owner_id,
                link,
                start_date: request.start_date,
            })
            .await?;
        tx.set_event_users(event.id, &[request.user_id]).await?;
        tx.commit().await?;

        info!(event_id = event.id, link = %event.link, "Created event");
        Ok(event)
    }

    /// Admin update: replaces the invited user.
    pub async fn update(&self, id: i32, request: &AdminEventRequest) -> ApiResult<()> {
        let mut tx = self.store.begin().await?;
        invited_users(&mut tx, &[request.owner_id, request.user_id]).await?;

        if !tx
            .update_event(id, request.job_id, request.owner_id, request.start_date)
            .await?
        {
            return Err(event_not_found(id));
        }
        tx.set_event_users(id, &[request.user_id]).await?;
        tx.commit().await?;

        info!(event_id = id, "Updated event");
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> ApiResult<()> {
        self.delete_scoped(id, None).await
    }

    /// Delete an event only if `owner` created it.
    pub async fn delete_owned(&self, owner: &User, id: i32) -> ApiResult<()> {
        self.delete_scoped(id, Some(owner.id)).await
    }

    async fn delete_scoped(&self, id: i32, owner_id: Option<i32>) -> ApiResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_event(id, owner_id).await? {
            return Err(event_not_found(id));
        }
        tx.commit().await?;
        info!(event_id = id, "Deleted event");
        Ok(())
    }

    /// Events created by `owner`, with invited users and the job.
    pub async fn list_owned(&self, owner: &User) -> ApiResult<Vec<EventDetails>> {
        let mut tx = self.store.begin().await?;
        let events = tx.list_events(Some(owner.id)).await?;
        let mut result = Vec::with_capacity(events.len());
        for event in events {
            let job = event_job(&mut tx, event.job_id).await?;
            let mut entry = details(&mut tx, event, false).await?;
            entry.job = job;
            result.push(entry);
        }
        Ok(result)
    }

    pub async fn get_by_link(&self, link: &str) -> ApiResult<EventDetails> {
        let mut tx = self.store.begin().await?;
        let event = tx
            .find_event_by_link(link)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("event '{}'", link)))?;
        details(&mut tx, event, false).await
    }

    /// Owner create: invite users and mail each of them the event page.
    pub async fn create_owned(&self, owner: &User, request: &CreateEventRequest) -> ApiResult<Event> {
        let mut tx = self.store.begin().await?;
        let users = invited_users(&mut tx, &request.users).await?;

        let link = fresh_link(&mut tx).await?;
        let event = tx
            .insert_event(&NewEvent {
                job_id: request.job_id,
                owner_id: owner.id,
                link,
                start_date: request.start_date,
            })
            .await?;
        tx.set_event_users(event.id, &request.users).await?;
        tx.commit().await?;

        info!(
            event_id = event.id,
            owner_id = owner.id,
            invited = users.len(),
            "Created event"
        );

        for user in &users {
            let mail = invitation_mail(&self.mail_from, user, &event, &self.event_base_url);
            send_best_effort(self.mailer.as_ref(), mail).await;
        }
        Ok(event)
    }

    /// Mail the join key of a started event to the given users.
    pub async fn send_link(&self, owner: &User, request: &SendLinkRequest) -> ApiResult<()> {
        let mut tx = self.store.begin().await?;
        let event = tx
            .find_event(request.event_id)
            .await?
            .filter(|e| e.owner_id == owner.id)
            .ok_or_else(|| event_not_found(request.event_id))?;
        let users = invited_users(&mut tx, &request.users).await?;
        drop(tx);

        for user in &users {
            let mail = join_key_mail(&self.mail_from, user, &event, &request.pwd_id);
            send_best_effort(self.mailer.as_ref(), mail).await;
        }
        info!(event_id = event.id, recipients = users.len(), "Sent event join key");
        Ok(())
    }
}
