// Authentication error types and their HTTP representation

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

pub const USER_EXISTS_MESSAGE: &str = "User already exists";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const UNAUTHENTICATED_MESSAGE: &str = "You need to be logged in";
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "email")]
    pub field: String,
    #[schema(example = "Please include a valid email")]
    pub msg: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            msg: msg.into(),
        }
    }
}

/// Body of a `400` validation response
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorBody {
    pub errors: Vec<FieldError>,
}

/// Body of every other error response
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    #[schema(example = "Invalid credentials")]
    pub msg: String,
}

/// Authentication error types
///
/// Messages sent to clients are fixed strings. Detail carried by
/// `Dependency` is only ever written to the server log.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("user already exists")]
    UserExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::UserExists => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build a validation error from the `validator` crate's report
    ///
    /// Fields are sorted by name so the response order is stable.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| *name);

        let details = fields
            .into_iter()
            .flat_map(|(name, failures)| {
                failures.iter().map(move |failure| {
                    let msg = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", failure.code));
                    FieldError::new(name, msg)
                })
            })
            .collect();

        AuthError::Validation(details)
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::from_validation(errors)
    }
}

/// Short label for a body rejection
///
/// serde's messages echo the offending values, so only the kind is logged.
pub(crate) fn rejection_kind(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "invalid JSON data",
        JsonRejection::JsonSyntaxError(_) => "malformed JSON",
        JsonRejection::MissingJsonContentType(_) => "missing JSON content type",
        JsonRejection::BytesRejection(_) => "unreadable body",
        _ => "unknown body rejection",
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(
            "Rejected request body: {} ({})",
            rejection_kind(&rejection),
            rejection.status()
        );
        AuthError::Validation(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )])
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AuthError::Validation(errors) => {
                debug!("Validation error: {:?}", errors);
                json!({ "errors": errors })
            }
            AuthError::UserExists => json!({ "msg": USER_EXISTS_MESSAGE }),
            AuthError::InvalidCredentials => json!({ "msg": INVALID_CREDENTIALS_MESSAGE }),
            AuthError::Unauthenticated => {
                warn!("Unauthenticated access to protected resource");
                json!({ "msg": UNAUTHENTICATED_MESSAGE })
            }
            AuthError::Dependency(detail) => {
                error!("Dependency failure in auth flow: {}", detail);
                json!({ "msg": SERVER_ERROR_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request, Json};
    use validator::Validate;

    async fn reject_body(content_type: &str, body: &'static str) -> JsonRejection {
        let request = Request::builder()
            .method("POST")
            .header(axum::http::header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        Json::<crate::auth::models::LoginRequest>::from_request(request, &())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_rejection_kind_does_not_echo_values() {
        let rejection = reject_body(
            "application/json",
            r#"{"email":"a@x.com","password":123456}"#,
        )
        .await;
        assert!(rejection.body_text().contains("123456"));

        let kind = rejection_kind(&rejection);
        assert_eq!(kind, "invalid JSON data");
        assert!(!kind.contains("123456"));
    }

    #[tokio::test]
    async fn test_rejection_kinds() {
        let syntax = reject_body("application/json", "{not json").await;
        assert_eq!(rejection_kind(&syntax), "malformed JSON");

        let content_type = reject_body("text/plain", "{}").await;
        assert_eq!(rejection_kind(&content_type), "missing JSON content type");

        match AuthError::from(content_type) {
            AuthError::Validation(errors) => assert_eq!(
                errors,
                vec![FieldError::new("body", "Request body must be a JSON object")]
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    async fn body_json(error: AuthError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_user_exists_shape() {
        let (status, body) = body_json(AuthError::UserExists).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "msg": "User already exists" }));
    }

    #[tokio::test]
    async fn test_invalid_credentials_shape() {
        let (status, body) = body_json(AuthError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "msg": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn test_dependency_detail_is_not_exposed() {
        let (status, body) =
            body_json(AuthError::Dependency("connection refused on 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "msg": "Server error" }));
    }

    #[tokio::test]
    async fn test_unauthenticated_is_401() {
        let (status, body) = body_json(AuthError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "You need to be logged in");
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Please include a valid email"))]
        email: String,
        #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
        password: String,
    }

    #[tokio::test]
    async fn test_validation_errors_listed_per_field() {
        let sample = Sample {
            email: "nope".to_string(),
            password: "abc".to_string(),
        };
        let error = AuthError::from(sample.validate().unwrap_err());

        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "errors": [
                    { "field": "email", "msg": "Please include a valid email" },
                    { "field": "password", "msg": "Password must be at least 6 characters long" }
                ]
            })
        );
    }
}
