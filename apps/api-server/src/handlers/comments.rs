//! Comment handlers. Comments are always addressed through their post.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use blog_core::policy::Guarded;
use blog_shared::ApiResponse;
use blog_shared::dto::CommentRequest;

use super::{convert, post_url, redirect_to_post};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    let comment = state
        .blog
        .attach_comment(post_id, identity.user_id, body.into_inner().text)
        .await?;
    let author = state.blog.profile(identity.user_id).await?.summary();

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, post_url(post_id)))
        .json(ApiResponse::ok(convert::comment_by(comment, author))))
}

/// GET /posts/{post_id}/comment/{comment_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    match state
        .blog
        .comment_for_edit(post_id, comment_id, identity.viewer())
        .await?
    {
        Guarded::Applied(comment) => {
            Ok(HttpResponse::Ok().json(ApiResponse::ok(CommentRequest { text: comment.text })))
        }
        Guarded::Redirect { post_id } => Ok(redirect_to_post(post_id)),
    }
}

/// POST /posts/{post_id}/comment/{comment_id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let comment = match state
        .blog
        .edit_comment(post_id, comment_id, identity.viewer(), body.into_inner().text)
        .await?
    {
        Guarded::Applied(comment) => comment,
        Guarded::Redirect { post_id } => return Ok(redirect_to_post(post_id)),
    };
    let author = state.blog.profile(identity.user_id).await?.summary();

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, post_url(post_id)))
        .json(ApiResponse::ok(convert::comment_by(comment, author))))
}

/// POST /posts/{post_id}/comment/{comment_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    match state
        .blog
        .delete_comment(post_id, comment_id, identity.viewer())
        .await?
    {
        Guarded::Applied(()) => Ok(HttpResponse::Ok()
            .insert_header((header::LOCATION, post_url(post_id)))
            .json(ApiResponse::ok_with_message(comment_id, "Comment deleted"))),
        Guarded::Redirect { post_id } => Ok(redirect_to_post(post_id)),
    }
}
