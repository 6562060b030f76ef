//! In-memory store - used when no database is configured, and in tests.
//!
//! Mirrors the relational schema: unique usernames, emails and category
//! slugs, foreign keys checked on save, cascading deletes for authors and
//! posts, and `SET NULL` when a category or location goes away.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{
    Category, Comment, CommentRecord, Location, Post, PostRecord, User,
};
use blog_core::error::RepoError;
use blog_core::listing::{ListingQuery, Page, run_listing};
use blog_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blog_core::service::Repositories;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
}

impl Tables {
    fn record(&self, post: &Post) -> Option<PostRecord> {
        let author = self.users.get(&post.author_id)?;
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as u64;

        Some(PostRecord {
            post: post.clone(),
            author: author.summary(),
            category: post.category_id.and_then(|id| self.categories.get(&id).cloned()),
            location: post.location_id.and_then(|id| self.locations.get(&id).cloned()),
            comment_count,
        })
    }

    fn remove_post(&mut self, post_id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&post_id)?;
        self.comments.retain(|_, c| c.post_id != post_id);
        Some(post)
    }
}

fn violation(what: &str) -> RepoError {
    RepoError::Constraint(format!("{what} violates a constraint"))
}

/// HashMap-backed implementation of every repository port.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Hand out this store behind every repository port.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
            categories: self.clone(),
            locations: self.clone(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        let clash = tables.users.values().any(|u| {
            u.id != user.id && (u.username == user.username || u.email == user.email)
        });
        if clash {
            return Err(violation("users.username/users.email"));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&post.author_id) {
            return Err(violation("posts.author_id"));
        }
        if post
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(violation("posts.category_id"));
        }
        if post
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(violation("posts.location_id"));
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_post(id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|post| tables.record(post)))
    }

    async fn list(
        &self,
        query: &ListingQuery,
        now: DateTime<Utc>,
    ) -> Result<Page<PostRecord>, RepoError> {
        let tables = self.tables.read().await;
        let candidates = tables.posts.values().filter_map(|post| tables.record(post));
        Ok(run_listing(candidates, query, now))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&comment.post_id) {
            return Err(violation("comments.post_id"));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(violation("comments.author_id"));
        }

        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let tables = self.tables.read().await;

        let mut comments: Vec<CommentRecord> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?;
                Some(CommentRecord {
                    comment: c.clone(),
                    author: author.summary(),
                })
            })
            .collect();
        comments.sort_by_key(|r| r.comment.created_at);

        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;

        if tables
            .categories
            .values()
            .any(|c| c.id != category.id && c.slug == category.slug)
        {
            return Err(violation("categories.slug"));
        }

        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.categories.remove(&id).ok_or(RepoError::NotFound)?;

        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.locations.remove(&id).ok_or(RepoError::NotFound)?;

        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn all(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}
