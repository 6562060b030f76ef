//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::response::FieldViolation;

/// Letters, digits and `@.+-_`, as accepted for usernames.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let ok = username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));

    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

/// Flatten `validator` output into a stable, field-sorted list.
pub fn field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldViolation {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

// Accounts

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 chars"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// A user's own account, as shown on the profile edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Self-edit of the requester's profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 chars"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
}

/// Public face of a profile page. Never carries the email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

// Posts

fn default_published() -> bool {
    true
}

/// Post create/edit form. Also returned as the edit form's current values.
///
/// Field rules are enforced by the post service, after the ownership check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub text: String,

    pub pub_date: DateTime<Utc>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub location_id: Option<Uuid>,

    #[serde(default)]
    pub category_id: Option<Uuid>,

    #[serde(default = "default_published")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub author: AuthorResponse,
    pub category: Option<CategoryResponse>,
    pub location: Option<LocationResponse>,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Categories and locations a post form may reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostChoicesResponse {
    pub categories: Vec<CategoryResponse>,
    pub locations: Vec<LocationResponse>,
}

/// Edit form: the stored values plus the available choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    pub id: Uuid,
    pub values: PostRequest,
    pub choices: PostChoicesResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

// Comments

/// Comment add/edit form. Trimmed, 1 to 250 characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: AuthorResponse,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// Listings

/// `?page=` query parameter; kept as text so `last` and garbage both parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPageResponse {
    pub category: CategoryResponse,
    pub posts: PageResponse<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePageResponse {
    pub profile: ProfileResponse,
    pub posts: PageResponse<PostResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[test]
    fn test_register_request_accepts_valid_input() {
        let request = register("alice.b+c@x_y-z", "alice@example.com", "long-enough");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_reports_each_field() {
        let request = register("bad name!", "not-an-email", "short");

        let errors = request.validate().unwrap_err();
        let fields: Vec<String> = field_violations(&errors)
            .into_iter()
            .map(|v| v.field)
            .collect();

        assert_eq!(fields, vec!["email", "password", "username"]);
    }

    #[test]
    fn test_profile_update_rejects_long_names() {
        let request = ProfileUpdateRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "x".repeat(151),
            last_name: String::new(),
        };

        let errors = request.validate().unwrap_err();

        assert_eq!(field_violations(&errors)[0].field, "first_name");
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        let request = LoginRequest {
            username: String::new(),
            password: String::new(),
        };

        let errors = request.validate().unwrap_err();

        assert_eq!(field_violations(&errors).len(), 2);
    }

    #[test]
    fn test_post_request_defaults_to_published() {
        let request: PostRequest = serde_json::from_str(
            r#"{"title":"t","text":"b","pub_date":"2026-10-19T12:00:00Z"}"#,
        )
        .unwrap();

        assert!(request.is_published);
        assert!(request.category_id.is_none());
        assert!(request.image.is_none());
    }

    #[test]
    fn test_violation_message_falls_back_to_code() {
        let mut errors = ValidationErrors::new();
        errors.add("title", ValidationError::new("length"));

        let violations = field_violations(&errors);

        assert_eq!(violations[0].field, "title");
        assert_eq!(violations[0].message, "length");
    }
}
