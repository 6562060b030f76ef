use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Location, UserSummary};

/// Post entity - a blog entry, possibly scheduled for a future `pub_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author-editable fields of a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_published: bool,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            image: draft.image,
            location_id: draft.location_id,
            category_id: draft.category_id,
            is_published: draft.is_published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields. Author and creation time never change.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.image = draft.image;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
        self.is_published = draft.is_published;
        self.updated_at = Utc::now();
    }
}

/// A post together with its resolved relations and derived comment count.
///
/// This is the snapshot the visibility policy and every listing work on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub post: Post,
    pub author: UserSummary,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
