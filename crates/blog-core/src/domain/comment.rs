use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserSummary;

/// Maximum comment length, in characters.
pub const COMMENT_MAX_CHARS: usize = 250;

/// Comment entity. Bound to exactly one post for its whole life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        }
    }
}

/// A comment with its author resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment: Comment,
    pub author: UserSummary,
}
