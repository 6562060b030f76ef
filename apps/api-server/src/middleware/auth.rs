//! Authentication middleware and extractors.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, http::StatusCode,
    http::header, web,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::future::{Ready, ready};
use std::sync::Arc;

use blog_core::policy::Viewer;
use blog_core::ports::{AuthError, TokenClaims, TokenService};
use blog_shared::ErrorResponse;

/// Where unauthenticated requests to protected routes are sent.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Characters left as-is in the `next` parameter; `/` stays readable.
const NEXT_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Login URL that returns to `next` after signing in.
fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", utf8_percent_encode(next, NEXT_SAFE))
}

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl Identity {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.user_id)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Authentication failure on a protected route.
///
/// Rendered as a redirect to the login page carrying the original path.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AuthenticationError {
    pub error: AuthError,
    pub next: String,
}

impl AuthenticationError {
    fn new(error: AuthError, req: &HttpRequest) -> Self {
        let next = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path(), |pq| pq.as_str());

        Self {
            error,
            next: next.to_string(),
        }
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AuthError::HashingError(msg) = &self.error {
            tracing::error!("Authentication backend error: {}", msg);
            return HttpResponse::InternalServerError().json(ErrorResponse::internal_error());
        }

        tracing::debug!(reason = %self.error, next = %self.next, "Login required");
        HttpResponse::Found()
            .insert_header((header::LOCATION, login_url(&self.next)))
            .finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(token_service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let token = bearer_token(req)?;
    token_service.validate_token(token).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|e| AuthenticationError::new(e, req)))
    }
}

/// Optional identity extractor - anonymous when no valid token is present.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map_or(Viewer::Anonymous, Identity::viewer)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_keeps_plain_paths_readable() {
        assert_eq!(login_url("/posts/create/"), "/auth/login/?next=/posts/create/");
    }

    #[test]
    fn test_login_url_encodes_query_and_unicode() {
        assert_eq!(
            login_url("/posts/1/edit/?a=1&b=2"),
            "/auth/login/?next=/posts/1/edit/%3Fa%3D1%26b%3D2"
        );
        assert_eq!(
            login_url("/profile/jos\u{e9}/"),
            "/auth/login/?next=/profile/jos%C3%A9/"
        );
    }
}
