use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - a registered author/commenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_names(mut self, first_name: String, last_name: String) -> Self {
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// The public face of a user attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// Self-service profile changes. Password and identity are not editable here.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}
