//! Blog use cases.
//!
//! Handlers call these with an explicit [`Viewer`]; each use case composes
//! the visibility predicate, the listing query and the ownership guard.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    COMMENT_MAX_CHARS, Category, Comment, CommentRecord, Location, Post, PostDraft, PostRecord,
    ProfileUpdate, User,
};
use crate::error::{DomainError, FieldError};
use crate::listing::{ListingQuery, Page, PageRequest};
use crate::policy::{Guarded, Viewer, can_mutate, is_visible};
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

/// Maximum post title length, in characters.
pub const TITLE_MAX_CHARS: usize = 256;

/// The storage ports the service works against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
}

/// A post page: the post and its comments in display order.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub record: PostRecord,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub page: Page<PostRecord>,
}

#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub profile: User,
    pub page: Page<PostRecord>,
}

/// Values a post form may reference.
#[derive(Debug, Clone)]
pub struct PostChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    // Listings

    pub async fn feed(
        &self,
        viewer: Viewer,
        page: PageRequest,
    ) -> Result<Page<PostRecord>, DomainError> {
        let query = ListingQuery::feed(viewer, page);
        Ok(self.repos.posts.list(&query, Utc::now()).await?)
    }

    /// Posts of a published category. Unpublished categories are not found.
    pub async fn category_posts(
        &self,
        slug: &str,
        viewer: Viewer,
        page: PageRequest,
    ) -> Result<CategoryListing, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let query = ListingQuery::category(category.id, viewer, page);
        let page = self.repos.posts.list(&query, Utc::now()).await?;
        Ok(CategoryListing { category, page })
    }

    pub async fn profile_posts(
        &self,
        username: &str,
        viewer: Viewer,
        page: PageRequest,
    ) -> Result<ProfileListing, DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let query = ListingQuery::profile(profile.id, viewer, page);
        let page = self.repos.posts.list(&query, Utc::now()).await?;
        Ok(ProfileListing { profile, page })
    }

    // Posts

    pub async fn post_detail(
        &self,
        post_id: Uuid,
        viewer: Viewer,
    ) -> Result<PostDetail, DomainError> {
        let record = self.reachable_post(post_id, &viewer, Utc::now()).await?;
        let comments = self.repos.comments.list_for_post(post_id).await?;
        Ok(PostDetail { record, comments })
    }

    pub async fn post_choices(&self) -> Result<PostChoices, DomainError> {
        Ok(PostChoices {
            categories: self.repos.categories.all().await?,
            locations: self.repos.locations.all().await?,
        })
    }

    /// Create a post. The author is always the authenticated requester.
    pub async fn create_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        self.validate_draft(&draft).await?;
        let post = self.repos.posts.save(Post::new(author_id, draft)).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// The post as stored, for its author's edit form.
    pub async fn post_for_edit(
        &self,
        post_id: Uuid,
        viewer: Viewer,
    ) -> Result<Guarded<Post>, DomainError> {
        let post = self.existing_post(post_id).await?;
        if !can_mutate(&post, &viewer) {
            return Ok(deny("post edit form", post_id, &viewer));
        }
        Ok(Guarded::Applied(post))
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        viewer: Viewer,
        draft: PostDraft,
    ) -> Result<Guarded<Post>, DomainError> {
        let mut post = self.existing_post(post_id).await?;
        if !can_mutate(&post, &viewer) {
            return Ok(deny("post update", post_id, &viewer));
        }

        self.validate_draft(&draft).await?;
        post.apply(draft);
        let post = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(Guarded::Applied(post))
    }

    pub async fn delete_post(
        &self,
        post_id: Uuid,
        viewer: Viewer,
    ) -> Result<Guarded<()>, DomainError> {
        let post = self.existing_post(post_id).await?;
        if !can_mutate(&post, &viewer) {
            return Ok(deny("post delete", post_id, &viewer));
        }

        self.repos.posts.delete(post_id).await?;
        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(Guarded::Applied(()))
    }

    // Comments

    /// Attach a comment to a post the author can reach.
    pub async fn attach_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        self.reachable_post(post_id, &Viewer::User(author_id), Utc::now())
            .await?;
        let text = validate_comment_text(text)?;

        let comment = self
            .repos
            .comments
            .save(Comment::new(post_id, author_id, text))
            .await?;
        tracing::info!(post_id = %post_id, comment_id = %comment.id, "Comment attached");
        Ok(comment)
    }

    pub async fn comment_for_edit(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        viewer: Viewer,
    ) -> Result<Guarded<Comment>, DomainError> {
        let comment = self.comment_of_post(post_id, comment_id).await?;
        if !can_mutate(&comment, &viewer) {
            return Ok(deny("comment edit form", post_id, &viewer));
        }
        Ok(Guarded::Applied(comment))
    }

    /// Replace a comment's text. Its post binding never changes.
    pub async fn edit_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        viewer: Viewer,
        text: String,
    ) -> Result<Guarded<Comment>, DomainError> {
        let mut comment = self.comment_of_post(post_id, comment_id).await?;
        if !can_mutate(&comment, &viewer) {
            return Ok(deny("comment edit", post_id, &viewer));
        }

        comment.text = validate_comment_text(text)?;
        let comment = self.repos.comments.save(comment).await?;
        Ok(Guarded::Applied(comment))
    }

    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        viewer: Viewer,
    ) -> Result<Guarded<()>, DomainError> {
        let comment = self.comment_of_post(post_id, comment_id).await?;
        if !can_mutate(&comment, &viewer) {
            return Ok(deny("comment delete", post_id, &viewer));
        }

        self.repos.comments.delete(comment.id).await?;
        tracing::info!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok(Guarded::Applied(()))
    }

    // Profiles

    pub async fn profile(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    /// Self-edit of the requester's own account.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut user = self.profile(user_id).await?;

        if let Some(other) = self.repos.users.find_by_username(&update.username).await? {
            if other.id != user_id {
                return Err(DomainError::Duplicate("Username already taken".to_string()));
            }
        }
        if let Some(other) = self.repos.users.find_by_email(&update.email).await? {
            if other.id != user_id {
                return Err(DomainError::Duplicate("Email already registered".to_string()));
            }
        }

        user.username = update.username;
        user.email = update.email;
        user.first_name = update.first_name;
        user.last_name = update.last_name;
        user.updated_at = Utc::now();
        Ok(self.repos.users.save(user).await?)
    }

    // Helpers

    /// Post detail reachability: visible, or owned by the viewer.
    async fn reachable_post(
        &self,
        post_id: Uuid,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Result<PostRecord, DomainError> {
        self.repos
            .posts
            .find_record(post_id)
            .await?
            .filter(|record| is_visible(record, viewer, now))
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn existing_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn comment_of_post(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    async fn validate_draft(&self, draft: &PostDraft) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        let title_len = draft.title.trim().chars().count();
        if title_len == 0 {
            errors.push(FieldError::new("title", "This field is required."));
        } else if draft.title.chars().count() > TITLE_MAX_CHARS {
            errors.push(FieldError::new(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_CHARS} characters."),
            ));
        }
        if draft.text.trim().is_empty() {
            errors.push(FieldError::new("text", "This field is required."));
        }
        if let Some(id) = draft.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.push(FieldError::new("category", "Select a valid choice."));
            }
        }
        if let Some(id) = draft.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.push(FieldError::new("location", "Select a valid choice."));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

fn deny<T>(action: &'static str, post_id: Uuid, viewer: &Viewer) -> Guarded<T> {
    tracing::debug!(
        action,
        post_id = %post_id,
        viewer = ?viewer.user_id(),
        "Mutation denied, not the author"
    );
    Guarded::Redirect { post_id }
}

/// Trimmed, non-empty and within [`COMMENT_MAX_CHARS`].
pub fn validate_comment_text(text: String) -> Result<String, DomainError> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(DomainError::invalid("text", "This field is required."));
    }
    if text.chars().count() > COMMENT_MAX_CHARS {
        return Err(DomainError::invalid(
            "text",
            format!("Ensure this value has at most {COMMENT_MAX_CHARS} characters."),
        ));
    }
    Ok(text)
}
