//! Visibility and ownership policy.
//!
//! Every function here is pure: the viewer and the clock are passed in, and
//! nothing is read from request state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentRecord, Post, PostRecord};

/// Who is looking at (or acting on) the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    /// True iff the viewer is the authenticated user `user_id`.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

/// Effective public visibility of a post.
///
/// `category` must be the category `post.category_id` points at. A dangling
/// reference counts as an unpublished category.
pub fn is_public(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category_allows(post, category)
}

fn category_allows(post: &Post, category: Option<&Category>) -> bool {
    match (post.category_id, category) {
        (None, _) => true,
        (Some(id), Some(category)) if category.id == id => category.is_published,
        (Some(_), _) => false,
    }
}

impl PostRecord {
    pub fn is_public(&self, now: DateTime<Utc>) -> bool {
        is_public(&self.post, self.category.as_ref(), now)
    }
}

/// Whether `viewer` may see `record`: authors always see their own posts.
pub fn is_visible(record: &PostRecord, viewer: &Viewer, now: DateTime<Utc>) -> bool {
    viewer.is(record.post.author_id) || record.is_public(now)
}

/// Anything with a single owning author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for PostRecord {
    fn author_id(&self) -> Uuid {
        self.post.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for CommentRecord {
    fn author_id(&self) -> Uuid {
        self.comment.author_id
    }
}

/// Ownership guard for edit/delete.
pub fn can_mutate<E: Authored + ?Sized>(entity: &E, viewer: &Viewer) -> bool {
    viewer.is(entity.author_id())
}

/// Result of a mutation that went through the ownership guard.
///
/// A denied mutation is not an error: the requester is sent back to the
/// read-only view of the post involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Applied(T),
    Redirect { post_id: Uuid },
}

impl<T> Guarded<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Guarded::Applied(_))
    }
}
