//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod convert;
mod health;
mod listings;
mod posts;
mod profile;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use blog_core::ports::RateLimiter;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// The `/auth` scope is throttled per client with `limiter`.
pub fn configure_routes(limiter: Arc<dyn RateLimiter>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            web::PathConfig::default()
                .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
        )
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default()
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        .route("/health", web::get().to(health::health_check))
        // Listings
        .route("/", web::get().to(listings::index))
        .route("/category/{slug}/", web::get().to(listings::category_posts))
        .route("/profile/{username}/", web::get().to(listings::profile))
        // Own profile
        .service(
            web::resource("/edit_profile/")
                .route(web::get().to(profile::edit_form))
                .route(web::post().to(profile::update)),
        )
        // Posts and their comments
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create)),
                )
                .route("/{post_id}/", web::get().to(posts::detail))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::update)),
                )
                .route("/{post_id}/delete/", web::post().to(posts::delete))
                .route("/{post_id}/comment/", web::post().to(comments::add))
                .service(
                    web::resource("/{post_id}/comment/{comment_id}/edit/")
                        .route(web::get().to(comments::edit_form))
                        .route(web::post().to(comments::edit)),
                )
                .route(
                    "/{post_id}/comment/{comment_id}/delete/",
                    web::post().to(comments::delete),
                ),
        )
        // Accounts
        .service(
            web::scope("/auth")
                .wrap(RateLimitMiddleware::new(limiter))
                .route("/register/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login)),
        );
    }
}

/// `303 See Other` back to a post's read view.
fn redirect_to_post(post_id: Uuid) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, post_url(post_id)))
        .finish()
}

fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}
