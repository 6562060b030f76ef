//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use blog_core::domain::{
    Category, CommentRecord, Location, PostRecord, User, UserSummary,
};
use blog_core::error::RepoError;
use blog_core::listing::{ListingFilter, ListingQuery, Page};
use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }
}

/// SQL rendering of a listing filter.
fn listing_condition(filter: &ListingFilter, now: DateTime<Utc>) -> Condition {
    let mut condition = Condition::all();

    if let Some(author_id) = filter.author_id {
        condition = condition.add(post::Column::AuthorId.eq(author_id));
    }
    if let Some(category_id) = filter.category_id {
        condition = condition.add(post::Column::CategoryId.eq(category_id));
    }
    if filter.public_only {
        let published_categories = Query::select()
            .column(category::Column::Id)
            .from(CategoryEntity)
            .and_where(category::Column::IsPublished.eq(true))
            .to_owned();

        condition = condition
            .add(post::Column::IsPublished.eq(true))
            .add(post::Column::PubDate.lte(now.fixed_offset()))
            .add(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(post::Column::CategoryId.in_subquery(published_categories)),
            );
    }

    condition
}

impl PostgresPostRepository {
    /// Resolve relations and comment counts for a batch of posts, keeping order.
    async fn load_records(&self, models: Vec<post::Model>) -> Result<Vec<PostRecord>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
        let category_ids: Vec<Uuid> = models.iter().filter_map(|m| m.category_id).collect();
        let location_ids: Vec<Uuid> = models.iter().filter_map(|m| m.location_id).collect();

        let authors: HashMap<Uuid, user::Model> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(repo_err)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(repo_err)?
                .into_iter()
                .map(|c| (c.id, c.into()))
                .collect()
        };

        let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(repo_err)?
                .into_iter()
                .map(|l| (l.id, l.into()))
                .collect()
        };

        let counts: HashMap<Uuid, i64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.db)
            .await
            .map_err(repo_err)?
            .into_iter()
            .collect();

        let records = models
            .into_iter()
            .filter_map(|model| {
                let author = authors.get(&model.author_id)?;
                Some(PostRecord {
                    author: UserSummary {
                        id: author.id,
                        username: author.username.clone(),
                    },
                    category: model.category_id.and_then(|id| categories.get(&id).cloned()),
                    location: model.location_id.and_then(|id| locations.get(&id).cloned()),
                    comment_count: counts.get(&model.id).copied().unwrap_or(0) as u64,
                    post: model.into(),
                })
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_record(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
        else {
            return Ok(None);
        };

        Ok(self.load_records(vec![model]).await?.pop())
    }

    async fn list(
        &self,
        query: &ListingQuery,
        now: DateTime<Utc>,
    ) -> Result<Page<PostRecord>, RepoError> {
        let filter = query.filter();
        tracing::debug!(scope = ?query.scope, ?filter, "Listing posts");

        let paginator = PostEntity::find()
            .filter(listing_condition(&filter, now))
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, query.page_size);

        let totals = paginator.num_items_and_pages().await.map_err(repo_err)?;
        let number = query.page.resolve(totals.number_of_pages);
        let models = paginator.fetch_page(number - 1).await.map_err(repo_err)?;
        let records = self.load_records(models).await?;

        Ok(Page::new(
            records,
            number,
            query.page_size,
            totals.number_of_items,
        ))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, author)| {
                let author = author?;
                Some(CommentRecord {
                    author: UserSummary {
                        id: author.id,
                        username: author.username,
                    },
                    comment: comment.into(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn all(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
