//! Authentication handlers.

use actix_web::{HttpResponse, http::header, web};
use std::sync::Arc;
use validator::Validate;

use blog_core::domain::User;
use blog_core::ports::{PasswordService, TokenService};
use blog_shared::ApiResponse;
use blog_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::profile_url;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(token_service: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/register/
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;

    let user = User::new(req.username, req.email, password_hash)
        .with_names(req.first_name, req.last_name);
    let saved_user = state.users.save(user).await?;
    tracing::info!(user_id = %saved_user.id, "User registered");

    let auth = issue_token(token_service.get_ref().as_ref(), &saved_user)?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, profile_url(&saved_user.username)))
        .json(ApiResponse::ok(auth)))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    let auth = issue_token(token_service.get_ref().as_ref(), &user)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(auth)))
}
