//! Application state.

use std::sync::Arc;

use axum::extract::FromRef;

use sweetjobs_store::Store;

use crate::auth::AccessGate;
use crate::config::ApiConfig;
use crate::files::FileStore;
use crate::mail::MailTransport;
use crate::services::{EventService, LocalizedService, UserService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState<S> {
    pub config: ApiConfig,
    pub store: S,
    pub gate: AccessGate,
    pub files: Arc<dyn FileStore>,
    pub localized: LocalizedService<S>,
    pub events: EventService<S>,
    pub users: UserService<S>,
}

impl<S: Store> AppState<S> {
    /// Wire the services around one store.
    pub fn new(
        config: ApiConfig,
        store: S,
        files: Arc<dyn FileStore>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        let gate = AccessGate::new(&config.jwt_secret);
        let localized = LocalizedService::new(store.clone(), config.languages.clone());
        let events = EventService::new(
            store.clone(),
            mailer,
            config.mail.from.clone(),
            config.event_base_url.clone(),
        );
        let users = UserService::new(store.clone());

        Self {
            config,
            store,
            gate,
            files,
            localized,
            events,
            users,
        }
    }
}

impl<S> FromRef<AppState<S>> for AccessGate {
    fn from_ref(state: &AppState<S>) -> Self {
        state.gate.clone()
    }
}
