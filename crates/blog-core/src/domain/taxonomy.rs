//! Out-of-band managed tags that posts reference: categories and locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category a post can be filed under. Addressed publicly by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}

/// Optional place tag on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}
