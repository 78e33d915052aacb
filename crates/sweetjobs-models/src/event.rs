//! Video interview events attached to a job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::entity::LocalizedOf;
use crate::resources::Job;
use crate::user::UserSummary;

/// Prefix of generated event links.
pub const EVENT_LINK_PREFIX: &str = "esemeny";

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub job_id: i32,
    pub owner_id: i32,
    /// Public, unique slug of the event page.
    pub link: String,
    pub start_date: DateTime<Utc>,
}

impl Event {
    /// Link slug derived from the creation time, e.g. `esemeny1700000000000`.
    pub fn generate_link(now: DateTime<Utc>) -> String {
        format!("{}{}", EVENT_LINK_PREFIX, now.timestamp_millis())
    }

    /// Start time as shown in notification mail.
    pub fn formatted_start(&self) -> String {
        self.start_date.format("%Y.%m.%d. %H:%M").to_string()
    }
}

/// Values for a new event row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub job_id: i32,
    pub owner_id: i32,
    pub link: String,
    pub start_date: DateTime<Utc>,
}

/// An event with its owner and invited users.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    pub users: Vec<UserSummary>,
    /// The job with its translations, on the owner's event list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<LocalizedOf<Job>>,
}

/// Admin create/update body: one invited user per event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminEventRequest {
    #[validate(range(min = 1))]
    pub job_id: i32,
    #[validate(range(min = 1))]
    pub owner_id: i32,
    #[validate(range(min = 1))]
    pub user_id: i32,
    pub start_date: DateTime<Utc>,
}

/// Owner create body: invite any number of users.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(range(min = 1))]
    pub job_id: i32,
    #[validate(length(max = 100))]
    pub users: Vec<i32>,
    pub start_date: DateTime<Utc>,
}

/// Owner request to mail the join key of a started event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendLinkRequest {
    #[validate(range(min = 1))]
    pub event_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub pwd_id: String,
    #[validate(length(max = 100))]
    pub users: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_link_uses_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(Event::generate_link(now), "esemeny1700000000123");
    }

    #[test]
    fn test_formatted_start() {
        let event = Event {
            id: 1,
            job_id: 1,
            owner_id: 1,
            link: "event1".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap(),
        };
        assert_eq!(event.formatted_start(), "2024.03.05. 14:07");
    }

    #[test]
    fn test_create_request_camel_case() {
        let request: CreateEventRequest = serde_json::from_str(
            r#"{"jobId": 3, "users": [1, 2], "startDate": "2024-03-05T14:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(request.job_id, 3);
        assert_eq!(request.users, vec![1, 2]);
    }
}
