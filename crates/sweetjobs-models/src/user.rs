//! Users of the job board.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role name that passes the admin gate.
pub const ADMIN_ROLE: &str = "admin";

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// "Last First", the way names are addressed in notification mail.
    pub fn full_name(&self) -> String {
        match (&self.last_name, &self.first_name) {
            (Some(last), Some(first)) => format!("{} {}", last, first),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.email.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
        }
    }

    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Id and email, as shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
}

/// What anonymous visitors may see of a job's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
