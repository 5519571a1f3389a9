use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lgn_oauth::OAuthError;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("The requested resource was not found")]
    NotFound,
    #[error("Provider not available: {0}")]
    ProviderNotFound(String),
    #[error("Invalid OAuth callback: {0}")]
    OAuthState(String),
    #[error("Sign-in denied by provider: {0}")]
    OAuthDenied(String),
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),
    #[error("Authentication service error: {0}")]
    Authenticator(#[from] AuthError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::ProviderNotFound(_) | Self::OAuth(OAuthError::UnknownProvider(_)) => {
                (StatusCode::NOT_FOUND, "PROVIDER_NOT_FOUND")
            }
            Self::OAuthState(_) => (StatusCode::BAD_REQUEST, "INVALID_OAUTH_STATE"),
            Self::OAuthDenied(_) => (StatusCode::BAD_REQUEST, "OAUTH_DENIED"),
            Self::OAuth(OAuthError::TokenExchange(_)) => {
                (StatusCode::BAD_GATEWAY, "TOKEN_EXCHANGE_FAILED")
            }
            Self::Authenticator(AuthError::Rejected { .. }) => {
                (StatusCode::UNAUTHORIZED, "SIGN_IN_REJECTED")
            }
            Self::Authenticator(_) => (StatusCode::BAD_GATEWAY, "AUTH_SERVICE_UNAVAILABLE"),
            Self::OAuth(_) | Self::Jwt(_) | Self::Template(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        // Upstream and internal details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetails { code, message },
        };

        (status, Json(body)).into_response()
    }
}
