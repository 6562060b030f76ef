use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentRecord, Location, Post, PostRecord, User};
use crate::error::RepoError;
use crate::listing::{ListingQuery, Page};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Load a post with author, category, location and comment count.
    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Run a listing query, evaluating publication against `now`.
    async fn list(
        &self,
        query: &ListingQuery,
        now: DateTime<Utc>,
    ) -> Result<Page<PostRecord>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first, with their authors.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;
}

/// Category repository. Categories are managed out of band.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn all(&self) -> Result<Vec<Category>, RepoError>;
}

/// Location repository. Locations are managed out of band.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    async fn all(&self) -> Result<Vec<Location>, RepoError>;
}
