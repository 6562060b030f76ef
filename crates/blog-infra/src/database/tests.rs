use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseBackend, MockDatabase};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use blog_core::domain::{Category, Comment, Location, Post, PostDraft, User};
use blog_core::error::RepoError;
use blog_core::listing::{ListingQuery, PageRequest};
use blog_core::policy::Viewer;
use blog_core::ports::BaseRepository;
use blog_core::service::Repositories;

use crate::database::entity::post;
use crate::database::postgres_repo::PostgresPostRepository;
use crate::database::{DatabaseConnections, Migrator};

async fn setup() -> Repositories {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    DatabaseConnections { main: db }.repositories()
}

async fn user(repos: &Repositories, username: &str) -> User {
    let user = User::new(
        username.to_string(),
        format!("{username}@example.com"),
        "hash".to_string(),
    );
    repos.users.save(user).await.unwrap()
}

fn draft(offset: Duration) -> PostDraft {
    PostDraft {
        title: "Title".to_string(),
        text: "Body".to_string(),
        pub_date: Utc::now() + offset,
        image: None,
        location_id: None,
        category_id: None,
        is_published: true,
    }
}

async fn post(repos: &Repositories, author: &User, draft: PostDraft) -> Post {
    repos.posts.save(Post::new(author.id, draft)).await.unwrap()
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            author_id,
            title: "Test Post".to_owned(),
            text: "Content".to_owned(),
            pub_date: now.into(),
            image: None,
            location_id: None,
            category_id: None,
            is_published: true,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = <PostgresPostRepository as BaseRepository<Post, Uuid>>::find_by_id(&repo, post_id)
        .await
        .unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_save_updates_existing_row() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let mut saved = post(&repos, &author, draft(-Duration::hours(1))).await;

    saved.title = "Edited".to_string();
    repos.posts.save(saved.clone()).await.unwrap();

    let found = repos.posts.find_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Edited");
}

#[tokio::test]
async fn test_duplicate_username_is_constraint_violation() {
    let repos = setup().await;
    user(&repos, "alice").await;

    let clash = User::new(
        "alice".to_string(),
        "other@example.com".to_string(),
        "hash".to_string(),
    );
    let result = repos.users.save(clash).await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_feed_filters_hidden_posts_and_counts_comments() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let reader = user(&repos, "bob").await;

    let open = repos
        .categories
        .save(Category::new("Open".into(), "d".into(), "open".into()))
        .await
        .unwrap();
    let closed = repos
        .categories
        .save(Category::new("Closed".into(), "d".into(), "closed".into()).unpublished())
        .await
        .unwrap();

    let plain = post(&repos, &author, draft(-Duration::hours(3))).await;
    let mut in_open = draft(-Duration::hours(2));
    in_open.category_id = Some(open.id);
    let in_open = post(&repos, &author, in_open).await;
    let mut in_closed = draft(-Duration::hours(1));
    in_closed.category_id = Some(closed.id);
    post(&repos, &author, in_closed).await;
    post(&repos, &author, draft(Duration::hours(1))).await;
    let mut hidden = draft(-Duration::hours(4));
    hidden.is_published = false;
    post(&repos, &author, hidden).await;

    for text in ["first", "second"] {
        repos
            .comments
            .save(Comment::new(plain.id, reader.id, text.to_string()))
            .await
            .unwrap();
    }

    let query = ListingQuery::feed(Viewer::User(author.id), PageRequest::default());
    let page = repos.posts.list(&query, Utc::now()).await.unwrap();

    let ids: Vec<Uuid> = page.items.iter().map(|r| r.post.id).collect();
    assert_eq!(ids, vec![in_open.id, plain.id]);
    assert_eq!(page.total_items, 2);
    assert_eq!(page.items[1].comment_count, 2);
    assert_eq!(page.items[0].comment_count, 0);
    assert_eq!(page.items[0].category.as_ref().map(|c| c.id), Some(open.id));
    assert_eq!(page.items[0].author.username, "alice");
}

#[tokio::test]
async fn test_profile_listing_for_owner_is_unfiltered() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;

    post(&repos, &author, draft(-Duration::hours(1))).await;
    post(&repos, &author, draft(Duration::days(1))).await;
    let mut hidden = draft(-Duration::hours(2));
    hidden.is_published = false;
    post(&repos, &author, hidden).await;

    let own = ListingQuery::profile(author.id, Viewer::User(author.id), PageRequest::default());
    let public = ListingQuery::profile(author.id, Viewer::Anonymous, PageRequest::default());

    assert_eq!(repos.posts.list(&own, Utc::now()).await.unwrap().total_items, 3);
    assert_eq!(repos.posts.list(&public, Utc::now()).await.unwrap().total_items, 1);
}

#[tokio::test]
async fn test_listing_pages_degrade_to_last_page() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    for i in 1..=25 {
        post(&repos, &author, draft(-Duration::minutes(i))).await;
    }

    let mut sizes = Vec::new();
    for n in 1..=4 {
        let query = ListingQuery::feed(Viewer::Anonymous, PageRequest::Number(n));
        let page = repos.posts.list(&query, Utc::now()).await.unwrap();
        sizes.push((page.number, page.items.len()));
    }

    assert_eq!(sizes, vec![(1, 10), (2, 10), (3, 5), (3, 5)]);
}

#[tokio::test]
async fn test_deleting_category_and_location_detaches_posts() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let category = repos
        .categories
        .save(Category::new("c".into(), "d".into(), "c".into()))
        .await
        .unwrap();
    let location = repos
        .locations
        .save(Location::new("Moscow".into()))
        .await
        .unwrap();

    let mut d = draft(-Duration::hours(1));
    d.category_id = Some(category.id);
    d.location_id = Some(location.id);
    let saved = post(&repos, &author, d).await;

    repos.categories.delete(category.id).await.unwrap();
    repos.locations.delete(location.id).await.unwrap();

    let found = repos.posts.find_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(found.category_id, None);
    assert_eq!(found.location_id, None);
}

#[tokio::test]
async fn test_deleting_post_cascades_to_comments() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let saved = post(&repos, &author, draft(-Duration::hours(1))).await;
    let comment = repos
        .comments
        .save(Comment::new(saved.id, author.id, "hi".to_string()))
        .await
        .unwrap();

    repos.posts.delete(saved.id).await.unwrap();

    assert!(repos.comments.find_by_id(comment.id).await.unwrap().is_none());
    assert!(matches!(
        repos.posts.delete(saved.id).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_comments_listed_oldest_first_with_author() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let reader = user(&repos, "bob").await;
    let saved = post(&repos, &author, draft(-Duration::hours(1))).await;

    let mut older = Comment::new(saved.id, reader.id, "older".to_string());
    older.created_at = Utc::now() - Duration::minutes(5);
    let newer = Comment::new(saved.id, author.id, "newer".to_string());
    repos.comments.save(newer).await.unwrap();
    repos.comments.save(older).await.unwrap();

    let comments = repos.comments.list_for_post(saved.id).await.unwrap();
    let texts: Vec<&str> = comments.iter().map(|c| c.comment.text.as_str()).collect();
    assert_eq!(texts, vec!["older", "newer"]);
    assert_eq!(comments[0].author.username, "bob");
}

#[tokio::test]
async fn test_find_record_resolves_relations() {
    let repos = setup().await;
    let author = user(&repos, "alice").await;
    let location = repos
        .locations
        .save(Location::new("Kazan".into()))
        .await
        .unwrap();
    let mut d = draft(-Duration::hours(1));
    d.location_id = Some(location.id);
    let saved = post(&repos, &author, d).await;

    let record = repos.posts.find_record(saved.id).await.unwrap().unwrap();
    assert_eq!(record.location.map(|l| l.name), Some("Kazan".to_string()));
    assert_eq!(record.author.id, author.id);
    assert!(repos.posts.find_record(Uuid::new_v4()).await.unwrap().is_none());
}
