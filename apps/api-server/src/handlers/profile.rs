//! Self-service profile editing.

use actix_web::{HttpResponse, web};
use validator::Validate;

use blog_core::domain::ProfileUpdate;
use blog_shared::ApiResponse;
use blog_shared::dto::ProfileUpdateRequest;

use super::convert;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /edit_profile/
pub async fn edit_form(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.blog.profile(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(convert::account(user))))
}

/// POST /edit_profile/ - always edits the requester, never another user.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let user = state
        .blog
        .update_profile(
            identity.user_id,
            ProfileUpdate {
                username: req.username,
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        convert::account(user),
        "Profile updated",
    )))
}
