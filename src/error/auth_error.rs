use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Convenience alias used across the crate.
pub type AuthResult<T> = Result<T, AuthError>;

/// Every way authentication can fail, from a garbled `Authorization`
/// header all the way to the Auth0 tenant being unreachable.
///
/// The `Display` form may contain internals and is meant for logs;
/// [`AuthError::public_message`] is what goes over the wire.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthorized,

    #[error("malformed bearer token")]
    MalformedToken,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not yet valid")]
    ImmatureToken,

    #[error("token issuer does not match the configured tenant")]
    InvalidIssuer,

    #[error("token audience does not match the configured API identifier")]
    InvalidAudience,

    #[error("no signing key with kid {0} in the tenant JWKS")]
    UnknownKeyId(String),

    #[error("token is missing required claim {0}")]
    MissingClaim(String),

    #[error("JWKS fetch failed: {0}")]
    JwksUnavailable(String),

    #[error("Auth0 is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("rate limited by Auth0")]
    RateLimited,

    #[error("{service} is unavailable: {message}")]
    ServiceUnavailable { service: String, message: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Stable machine-readable code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::ImmatureToken => "TOKEN_NOT_YET_VALID",
            Self::InvalidIssuer => "WRONG_ISSUER",
            Self::InvalidAudience => "WRONG_AUDIENCE",
            Self::UnknownKeyId(_) => "UNKNOWN_KEY_ID",
            Self::MissingClaim(_) => "MISSING_CLAIM",
            Self::JwksUnavailable(_) => "JWKS_UNAVAILABLE",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short label attached to `auth_failure_category` log fields so
    /// rejections can be counted without parsing messages.
    pub fn failure_category(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "expired",
            Self::ImmatureToken => "immature",
            Self::InvalidIssuer => "wrong_issuer",
            Self::InvalidAudience => "wrong_audience",
            Self::UnknownKeyId(_) => "unknown_kid",
            Self::MissingClaim(_) => "missing_claim",
            Self::JwksUnavailable(_) => "jwks_fetch_failed",
            Self::NotConfigured(_) => "not_configured",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable { .. } => "auth0_unavailable",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }

    /// Short human-readable label for the response body's `error` field.
    pub fn error_label(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::MalformedToken
            | Self::InvalidSignature
            | Self::InvalidIssuer
            | Self::InvalidAudience
            | Self::UnknownKeyId(_)
            | Self::MissingClaim(_) => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::ImmatureToken => "Token not yet valid",
            Self::RateLimited => "Too many requests",
            Self::JwksUnavailable(_) | Self::ServiceUnavailable { .. } => "Service unavailable",
            Self::BadRequest(_) => "Bad request",
            Self::NotConfigured(_) | Self::Internal(_) => "Internal server error",
        }
    }

    /// Message safe to return to the caller. Anything that could leak
    /// tenant configuration or internals is flattened to a generic text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => "Authentication required".to_string(),
            Self::MalformedToken
            | Self::InvalidSignature
            | Self::InvalidIssuer
            | Self::InvalidAudience
            | Self::UnknownKeyId(_)
            | Self::MissingClaim(_) => "Invalid authentication token".to_string(),
            Self::TokenExpired => "Authentication token has expired".to_string(),
            Self::ImmatureToken => "Authentication token is not yet valid".to_string(),
            Self::JwksUnavailable(_) => {
                "Authentication service temporarily unavailable".to_string()
            }
            Self::RateLimited => "Too many requests, please try again later".to_string(),
            Self::ServiceUnavailable { service, .. } => {
                format!("{service} is temporarily unavailable")
            }
            Self::BadRequest(message) => message.clone(),
            Self::NotConfigured(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::ImmatureToken
            | Self::InvalidIssuer
            | Self::InvalidAudience
            | Self::UnknownKeyId(_)
            | Self::MissingClaim(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::JwksUnavailable(_) | Self::ServiceUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.error_label(),
            "message": self.public_message(),
            "code": self.error_code(),
        }))
    }
}
