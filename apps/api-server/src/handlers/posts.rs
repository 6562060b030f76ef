//! Post handlers.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use blog_core::policy::{Guarded, Viewer};
use blog_shared::ApiResponse;
use blog_shared::dto::{PostDetailResponse, PostFormResponse, PostRequest};

use super::{convert, post_url, profile_url, redirect_to_post};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn detail_response(
    state: &AppState,
    post_id: Uuid,
    viewer: Viewer,
) -> AppResult<PostDetailResponse> {
    let detail = state.blog.post_detail(post_id, viewer).await?;

    Ok(PostDetailResponse {
        post: convert::post(detail.record),
        comments: detail.comments.into_iter().map(convert::comment).collect(),
    })
}

/// GET /posts/{post_id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let body = detail_response(&state, post_id.into_inner(), identity.viewer()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /posts/create/ - choices for an empty form.
pub async fn create_form(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let choices = state.blog.post_choices().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(convert::choices(choices))))
}

/// POST /posts/create/ - the author is always the requester.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = convert::draft(body.into_inner());
    let post = state.blog.create_post(identity.user_id, draft).await?;

    let body = detail_response(&state, post.id, identity.viewer()).await?;
    let location = profile_url(&body.post.author.username);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location))
        .json(ApiResponse::ok_with_message(body, "Post created")))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = match state
        .blog
        .post_for_edit(post_id.into_inner(), identity.viewer())
        .await?
    {
        Guarded::Applied(post) => post,
        Guarded::Redirect { post_id } => return Ok(redirect_to_post(post_id)),
    };

    let choices = state.blog.post_choices().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostFormResponse {
        id: post.id,
        values: convert::post_form(post),
        choices: convert::choices(choices),
    })))
}

/// POST /posts/{post_id}/edit/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = convert::draft(body.into_inner());
    let post = match state
        .blog
        .update_post(post_id.into_inner(), identity.viewer(), draft)
        .await?
    {
        Guarded::Applied(post) => post,
        Guarded::Redirect { post_id } => return Ok(redirect_to_post(post_id)),
    };

    let body = detail_response(&state, post.id, identity.viewer()).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, post_url(post.id)))
        .json(ApiResponse::ok_with_message(body, "Post updated")))
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();

    match state.blog.delete_post(post_id, identity.viewer()).await? {
        Guarded::Applied(()) => Ok(HttpResponse::Ok()
            .insert_header((header::LOCATION, "/"))
            .json(ApiResponse::ok_with_message(post_id, "Post deleted"))),
        Guarded::Redirect { post_id } => Ok(redirect_to_post(post_id)),
    }
}
