//! Bearer tokens for blog sessions.
//!
//! A token names its author twice: `sub` carries the user id that ownership
//! checks compare against, `username` is display data for profile links. Only
//! `sub` is trusted for authorization; a rename does not invalidate tokens.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blog_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const DEFAULT_ISSUER: &str = "blog-api";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        if config.uses_default_secret() {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        config
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Wire form of a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    username: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 token service used by the login and register handlers.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        if claims.username.is_empty() {
            return Err(AuthError::InvalidToken("missing username".to_string()));
        }

        Ok(TokenClaims {
            user_id: claims.sub,
            username: claims.username,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "blog-test".to_string(),
        }
    }

    #[test]
    fn test_token_identifies_author() {
        let service = JwtTokenService::new(test_config());
        let author_id = Uuid::new_v4();

        let token = service.generate_token(author_id, "alice").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, author_id);
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let service = JwtTokenService::new(test_config());

        assert!(matches!(
            service.validate_token("not-a-token"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_issuer_is_rejected() {
        let ours = JwtTokenService::new(test_config());
        let theirs = JwtTokenService::new(JwtConfig {
            issuer: "some-other-blog".to_string(),
            ..test_config()
        });

        let token = theirs.generate_token(Uuid::new_v4(), "bob").unwrap();

        assert!(ours.validate_token(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let service = JwtTokenService::new(test_config());
        let forger = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });

        let token = forger.generate_token(Uuid::new_v4(), "mallory").unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_stale_session_reports_expiry() {
        let expired = JwtTokenService::new(JwtConfig {
            expiration_hours: -1,
            ..test_config()
        });

        let token = expired.generate_token(Uuid::new_v4(), "carol").unwrap();

        assert!(matches!(
            expired.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_without_username_is_rejected() {
        let service = JwtTokenService::new(test_config());

        let token = service.generate_token(Uuid::new_v4(), "").unwrap();

        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_expiration_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: 24,
            ..test_config()
        });

        assert_eq!(service.expiration_seconds(), 86400);
    }

    #[test]
    fn test_default_secret_is_detected() {
        assert!(JwtConfig::default().uses_default_secret());
        assert!(!test_config().uses_default_secret());
    }
}
