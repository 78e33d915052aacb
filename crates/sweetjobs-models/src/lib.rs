//! Shared data models for the SweetJobs backend.
//!
//! This crate provides Serde-serializable types for:
//! - Languages and the default/secondary language pair
//! - Typed field sets for parent and translation rows
//! - Localized resources (jobs, categories, roles, messages, ...)
//! - Users and interview events

pub mod entity;
pub mod event;
pub mod fields;
pub mod language;
pub mod payload;
pub mod resources;
pub mod user;

// Re-export common types
pub use entity::{
    join_translations, Localized, LocalizedEntity, LocalizedOf, Record, RecordOf, Translation,
    TranslationOf,
};
pub use event::{AdminEventRequest, CreateEventRequest, Event, EventDetails, NewEvent, SendLinkRequest};
pub use fields::{FieldSet, FieldValue};
pub use language::{Language, LanguagePair, DEFAULT_LANGUAGE_KEY, SECONDARY_LANGUAGE_KEY};
pub use payload::{LocalizedPayload, PayloadOf};
pub use resources::{
    AppliedUserStatus, Category, CategoryText, ErrorMessage, GeneralMessage, Job, JobAttributes,
    JobText, KeyedAttributes, MessageText, NameText, PagePlace, PublicContent,
    PublicContentAttributes, PublicContentText, Role,
};
pub use user::{PublicProfile, User, UserSummary, ADMIN_ROLE};
