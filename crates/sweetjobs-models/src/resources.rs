//! Every translatable resource exposed by the API.

use crate::entity::LocalizedEntity;
use crate::fields::field_set;

field_set! {
    /// Language-independent job posting attributes.
    pub struct JobAttributes {
        #[validate(range(min = 1))]
        user_id: i32,
        #[validate(range(min = 1))]
        category_id: i32,
        #[validate(length(max = 255))]
        company_name: String,
        #[validate(length(max = 255))]
        company_website: String,
        #[validate(length(max = 1024))]
        logo_url: String,
        #[validate(length(max = 255))]
        job_location: String,
    }
}

field_set! {
    /// Job posting text in one language.
    pub struct JobText {
        #[validate(length(max = 255))]
        title: String,
        #[validate(length(max = 1024))]
        about_us: String,
        #[validate(length(max = 2048))]
        job_description: String,
        #[validate(length(max = 255))]
        payment: String,
        #[validate(length(max = 255))]
        job_type: String,
        #[validate(length(max = 255))]
        experience: String,
        #[validate(length(max = 255))]
        qualification: String,
        #[validate(length(max = 255))]
        language: String,
    }
}

field_set! {
    /// Key and admin label shared by the message-like resources.
    pub struct KeyedAttributes {
        #[validate(length(min = 1, max = 255))]
        key: String,
        #[validate(length(max = 255))]
        admin_name: String,
    }
}

field_set! {
    /// A single translated text.
    pub struct MessageText {
        #[validate(length(max = 2048))]
        text: String,
    }
}

field_set! {
    /// A single translated name.
    pub struct NameText {
        #[validate(length(max = 255))]
        name: String,
    }
}

field_set! {
    pub struct CategoryText {
        #[validate(length(max = 255))]
        name: String,
        #[validate(length(max = 1024))]
        description: String,
    }
}

field_set! {
    pub struct PublicContentAttributes {
        #[validate(length(min = 1, max = 255))]
        key: String,
        #[validate(range(min = 1))]
        page_place_id: i32,
    }
}

field_set! {
    pub struct PublicContentText {
        #[validate(length(max = 255))]
        title: String,
        content: String,
    }
}

/// Job postings, owned by the user who created them.
pub struct Job;

impl LocalizedEntity for Job {
    const NAME: &'static str = "job";
    const RESOURCE: &'static str = "jobs";
    const TABLE: &'static str = "jobs";
    const TRANSLATION_TABLE: &'static str = "job_translations";
    const FOREIGN_KEY: &'static str = "job_id";
    const OWNER_COLUMN: Option<&'static str> = Some("user_id");
    type Attributes = JobAttributes;
    type Text = JobText;
}

/// Job categories.
pub struct Category;

impl LocalizedEntity for Category {
    const NAME: &'static str = "category";
    const RESOURCE: &'static str = "categories";
    const TABLE: &'static str = "categories";
    const TRANSLATION_TABLE: &'static str = "category_translations";
    const FOREIGN_KEY: &'static str = "category_id";
    type Attributes = KeyedAttributes;
    type Text = CategoryText;
}

/// User roles.
pub struct Role;

impl LocalizedEntity for Role {
    const NAME: &'static str = "role";
    const RESOURCE: &'static str = "roles";
    const TABLE: &'static str = "roles";
    const TRANSLATION_TABLE: &'static str = "role_translations";
    const FOREIGN_KEY: &'static str = "role_id";
    type Attributes = KeyedAttributes;
    type Text = NameText;
}

/// Statuses of a user's application to a job.
pub struct AppliedUserStatus;

impl LocalizedEntity for AppliedUserStatus {
    const NAME: &'static str = "applied_user_status";
    const RESOURCE: &'static str = "appliedUserStatuses";
    const TABLE: &'static str = "applied_user_statuses";
    const TRANSLATION_TABLE: &'static str = "applied_user_status_translations";
    const FOREIGN_KEY: &'static str = "applied_user_status_id";
    type Attributes = KeyedAttributes;
    type Text = MessageText;
}

/// Error messages shown by the frontend.
pub struct ErrorMessage;

impl LocalizedEntity for ErrorMessage {
    const NAME: &'static str = "error_message";
    const RESOURCE: &'static str = "errorMessages";
    const TABLE: &'static str = "error_messages";
    const TRANSLATION_TABLE: &'static str = "error_message_translations";
    const FOREIGN_KEY: &'static str = "error_message_id";
    type Attributes = KeyedAttributes;
    type Text = MessageText;
}

/// General (non-error) messages shown by the frontend.
pub struct GeneralMessage;

impl LocalizedEntity for GeneralMessage {
    const NAME: &'static str = "general_message";
    const RESOURCE: &'static str = "generalMessages";
    const TABLE: &'static str = "general_messages";
    const TRANSLATION_TABLE: &'static str = "general_message_translations";
    const FOREIGN_KEY: &'static str = "general_message_id";
    type Attributes = KeyedAttributes;
    type Text = MessageText;
}

/// Places on a page where public content can be shown.
pub struct PagePlace;

impl LocalizedEntity for PagePlace {
    const NAME: &'static str = "page_place";
    const RESOURCE: &'static str = "pagePlaces";
    const TABLE: &'static str = "page_places";
    const TRANSLATION_TABLE: &'static str = "page_place_translations";
    const FOREIGN_KEY: &'static str = "page_place_id";
    type Attributes = KeyedAttributes;
    type Text = NameText;
}

/// Static public page content.
pub struct PublicContent;

impl LocalizedEntity for PublicContent {
    const NAME: &'static str = "public_content";
    const RESOURCE: &'static str = "publicContents";
    const TABLE: &'static str = "public_contents";
    const TRANSLATION_TABLE: &'static str = "public_content_translations";
    const FOREIGN_KEY: &'static str = "public_content_id";
    type Attributes = PublicContentAttributes;
    type Text = PublicContentText;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldSet, FieldValue};

    #[test]
    fn test_owner_column_is_a_job_attribute() {
        let column = Job::OWNER_COLUMN.unwrap();
        assert!(JobAttributes::COLUMNS.contains(&column));

        let attributes = JobAttributes {
            user_id: Some(7),
            ..Default::default()
        };
        assert_eq!(attributes.get(column), Some(FieldValue::Int(Some(7))));
    }

    #[test]
    fn test_job_text_columns() {
        assert_eq!(
            JobText::COLUMNS,
            &[
                "title",
                "about_us",
                "job_description",
                "payment",
                "job_type",
                "experience",
                "qualification",
                "language",
            ]
        );
    }

    #[test]
    fn test_keyed_attributes_require_non_empty_key() {
        use validator::Validate;

        let attributes = KeyedAttributes {
            key: Some(String::new()),
            admin_name: None,
        };
        assert!(attributes.validate().is_err());
    }
}
