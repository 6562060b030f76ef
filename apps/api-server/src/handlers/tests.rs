use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use blog_core::domain::User;
use blog_core::ports::{PasswordService, RateLimiter, TokenService};
use blog_infra::{
    Argon2PasswordService, InMemoryRateLimiter, JwtConfig, JwtTokenService, RateLimitConfig,
};

use super::configure_routes;
use crate::observability::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::state::AppState;

struct TestContext {
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
    limiter: Arc<dyn RateLimiter>,
}

impl TestContext {
    fn new() -> Self {
        Self::with_rate_limit(100)
    }

    fn with_rate_limit(max_requests: u32) -> Self {
        Self {
            state: AppState::in_memory(),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                expiration_hours: 1,
                issuer: "blog-api".to_string(),
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
            limiter: Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
                max_requests,
                window: StdDuration::from_secs(60),
            })),
        }
    }

    /// Create a user directly in the store and return a bearer header value.
    async fn login_as(&self, username: &str) -> (Uuid, String) {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused".to_string(),
        );
        let user = self.state.users.save(user).await.unwrap();
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (user.id, format!("Bearer {token}"))
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($ctx.state.clone()))
                .app_data(web::Data::new($ctx.tokens.clone()))
                .app_data(web::Data::new($ctx.passwords.clone()))
                .configure(configure_routes($ctx.limiter.clone())),
        )
        .await
    };
}

fn post_body(offset: Duration) -> Value {
    json!({
        "title": "Kazan at dawn",
        "text": "Cold and bright.",
        "pub_date": Utc::now() + offset,
    })
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_health_check_tags_request_id() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
}

#[actix_web::test]
async fn test_request_id_is_propagated() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((REQUEST_ID_HEADER, "trace-me"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-me");
}

#[actix_web::test]
async fn test_empty_feed_has_one_page() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/?page=last").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["number"], 1);
    assert_eq!(body["data"]["total_pages"], 1);
    assert_eq!(body["data"]["items"], json!([]));
}

#[actix_web::test]
async fn test_unauthenticated_mutation_redirects_to_login() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .set_json(post_body(-Duration::hours(1)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/posts/create/");
}

#[actix_web::test]
async fn test_login_redirect_encodes_next() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let post_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/edit/?from=feed&page=2"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=/posts/{post_id}/edit/%3Ffrom%3Dfeed%26page%3D2")
    );
}

#[actix_web::test]
async fn test_create_post_then_read_it() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.login_as("alice").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, bearer))
        .set_json(post_body(-Duration::hours(1)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(location(&resp), "/profile/alice/");
    let body: Value = test::read_body_json(resp).await;
    let post_id = body["data"]["post"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["post"]["author"]["username"], "alice");

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_items"], 1);
}

#[actix_web::test]
async fn test_invalid_post_reports_fields() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.login_as("alice").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, bearer))
        .set_json(json!({
            "title": "",
            "text": "body",
            "pub_date": Utc::now(),
            "category_id": Uuid::new_v4(),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 422);
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(body["errors"][1]["field"], "category");
}

#[actix_web::test]
async fn test_scheduled_post_hidden_from_others() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, alice) = ctx.login_as("alice").await;
    let (_, bob) = ctx.login_as("bob").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, alice.clone()))
        .set_json(post_body(Duration::days(2)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/posts/{}/", body["data"]["post"]["id"].as_str().unwrap());

    let anonymous = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, anonymous).await.status(),
        StatusCode::NOT_FOUND
    );

    let other = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, other).await.status(),
        StatusCode::NOT_FOUND
    );

    let author = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, alice))
        .to_request();
    assert_eq!(test::call_service(&app, author).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_non_author_delete_redirects_to_post() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, alice) = ctx.login_as("alice").await;
    let (_, bob) = ctx.login_as("bob").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, bob))
        .set_json(post_body(-Duration::hours(1)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = body["data"]["post"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/delete/"))
        .insert_header((header::AUTHORIZATION, alice))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{post_id}/"));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_comment_flow() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, alice) = ctx.login_as("alice").await;
    let (_, bob) = ctx.login_as("bob").await;

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, bob.clone()))
        .set_json(post_body(-Duration::hours(1)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = body["data"]["post"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment/"))
        .insert_header((header::AUTHORIZATION, alice.clone()))
        .set_json(json!({ "text": "Lovely light" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(location(&resp), format!("/posts/{post_id}/"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["author"]["username"], "alice");
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    // The post author may not edit someone else's comment
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment/{comment_id}/edit/"))
        .insert_header((header::AUTHORIZATION, bob))
        .set_json(json!({ "text": "Edited by bob" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["post"]["comment_count"], 1);
    assert_eq!(body["data"]["comments"][0]["text"], "Lovely light");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment/{comment_id}/delete/"))
        .insert_header((header::AUTHORIZATION, alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_post_and_bad_id_are_not_found() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/posts/not-a-uuid/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/category/nope/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_register_then_login() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "correct horse",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({
            "username": "carol",
            "email": "other@example.com",
            "password": "correct horse",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "carol", "password": "correct horse" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let req = test::TestRequest::get()
        .uri("/edit_profile/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["email"], "carol@example.com");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "carol", "password": "wrong" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_register_rejects_invalid_fields() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({
            "username": "no spaces",
            "email": "nope",
            "password": "short",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_profile_update_conflict() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let (_, alice) = ctx.login_as("alice").await;
    ctx.login_as("bob").await;

    let req = test::TestRequest::post()
        .uri("/edit_profile/")
        .insert_header((header::AUTHORIZATION, alice.clone()))
        .set_json(json!({ "username": "bob", "email": "alice@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/edit_profile/")
        .insert_header((header::AUTHORIZATION, alice))
        .set_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "first_name": "Alice",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["first_name"], "Alice");
}

#[actix_web::test]
async fn test_auth_scope_is_rate_limited() {
    let ctx = TestContext::with_rate_limit(1);
    let app = init_app!(ctx);

    let login = || {
        test::TestRequest::post()
            .uri("/auth/login/")
            .peer_addr("10.0.0.7:4000".parse().unwrap())
            .set_json(json!({ "username": "ghost", "password": "whatever" }))
            .to_request()
    };

    let first = test::call_service(&app, login()).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = test::call_service(&app, login()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));

    // Listings are not throttled
    let req = test::TestRequest::get().uri("/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
