//! Post listings: the feed, category pages and profile pages.

use actix_web::{HttpResponse, web};

use blog_core::listing::PageRequest;
use blog_shared::ApiResponse;
use blog_shared::dto::{CategoryPageResponse, PageQuery, ProfilePageResponse};

use super::convert;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / - public posts, newest first.
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .feed(identity.viewer(), PageRequest::parse(query.page.as_deref()))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(convert::page(page, convert::post))))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .category_posts(
            &slug,
            identity.viewer(),
            PageRequest::parse(query.page.as_deref()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CategoryPageResponse {
        category: convert::category(listing.category),
        posts: convert::page(listing.page, convert::post),
    })))
}

/// GET /profile/{username}/ - the owner also sees drafts and scheduled posts.
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .profile_posts(
            &username,
            identity.viewer(),
            PageRequest::parse(query.page.as_deref()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfilePageResponse {
        profile: convert::profile(listing.profile),
        posts: convert::page(listing.page, convert::post),
    })))
}
