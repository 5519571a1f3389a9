use std::{fmt, time::Duration};

use async_trait::async_trait;
use lgn_oauth::{Provider, ProviderTokens};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the authentication service sends users after a successful sign-in
pub const CALLBACK_URL: &str = "/dashboard";

/// User account as known by the authentication service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
}

#[derive(Clone)]
pub struct EmailCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Sign-in rejected: {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },
    #[error("Authentication service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid authentication service URL: {0}")]
    InvalidUrl(String),
}

impl AuthError {
    /// Message that can be shown to the user as is, if the service gave one
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } => message.as_deref().filter(|m| !m.is_empty()),
            Self::Transport(_) | Self::InvalidUrl(_) => None,
        }
    }
}

/// External service owning user accounts and credentials
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check an email and password
    async fn sign_in_email(
        &self,
        credentials: &EmailCredentials,
    ) -> Result<AuthenticatedUser, AuthError>;

    /// Resolve the account behind tokens issued by an identity provider
    async fn sign_in_social(
        &self,
        provider: Provider,
        tokens: &ProviderTokens,
    ) -> Result<AuthenticatedUser, AuthError>;
}

/// [`Authenticator`] backed by the authentication service's HTTP API
#[derive(Clone, Debug)]
pub struct RemoteAuthenticator {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct EmailSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "callbackURL")]
    callback_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SocialSignInRequest<'a> {
    provider: Provider,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(rename = "callbackURL")]
    callback_url: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
    user: AuthenticatedUser,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Upper bound for one request to the authentication service
pub const AUTH_SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

impl RemoteAuthenticator {
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        Self::with_timeout(base_url, AUTH_SERVICE_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        // Keep the last path segment when joining relative endpoints
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)
        } else {
            Url::parse(&format!("{base_url}/"))
        }
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            base_url,
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn sign_in<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<AuthenticatedUser, AuthError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            let body: SignInResponse = response.json().await?;
            return Ok(body.user);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);

        tracing::debug!(%status, endpoint, "Authentication service rejected sign-in");

        Err(AuthError::Rejected { message })
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn sign_in_email(
        &self,
        credentials: &EmailCredentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        let body = EmailSignInRequest {
            email: &credentials.email,
            password: &credentials.password,
            callback_url: CALLBACK_URL,
        };

        self.sign_in("sign-in/email", &body).await
    }

    async fn sign_in_social(
        &self,
        provider: Provider,
        tokens: &ProviderTokens,
    ) -> Result<AuthenticatedUser, AuthError> {
        let body = SocialSignInRequest {
            provider,
            access_token: &tokens.access_token,
            refresh_token: tokens.refresh_token.as_deref(),
            callback_url: CALLBACK_URL,
        };

        self.sign_in("sign-in/social", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let error = AuthError::Rejected {
            message: Some("Invalid password".to_string()),
        };
        assert_eq!(error.user_message(), Some("Invalid password"));

        let error = AuthError::Rejected { message: None };
        assert_eq!(error.user_message(), None);

        let error = AuthError::Rejected {
            message: Some(String::new()),
        };
        assert_eq!(error.user_message(), None);
    }

    #[test]
    fn test_base_url_keeps_path() {
        let authenticator = RemoteAuthenticator::new("http://localhost:4000/api/auth").unwrap();
        assert_eq!(
            authenticator.base_url().join("sign-in/email").unwrap().as_str(),
            "http://localhost:4000/api/auth/sign-in/email"
        );

        let authenticator = RemoteAuthenticator::new("http://localhost:4000/api/auth/").unwrap();
        assert_eq!(
            authenticator.base_url().join("sign-in/social").unwrap().as_str(),
            "http://localhost:4000/api/auth/sign-in/social"
        );
    }

    #[tokio::test]
    async fn test_unresponsive_service_times_out() {
        // Connections complete in the backlog but nothing ever answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api/auth", listener.local_addr().unwrap());

        let authenticator =
            RemoteAuthenticator::with_timeout(&base_url, Duration::from_millis(200)).unwrap();
        let credentials = EmailCredentials {
            email: "m@example.com".to_string(),
            password: "secret123".to_string(),
        };

        let result = authenticator.sign_in_email(&credentials).await;

        assert!(
            matches!(&result, Err(AuthError::Transport(e)) if e.is_timeout()),
            "{result:?}"
        );
        drop(listener);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RemoteAuthenticator::new("not a url"),
            Err(AuthError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_email_request_shape() {
        let body = EmailSignInRequest {
            email: "m@example.com",
            password: "secret123",
            callback_url: CALLBACK_URL,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "m@example.com");
        assert_eq!(json["callbackURL"], "/dashboard");
    }

    #[test]
    fn test_social_request_shape() {
        let body = SocialSignInRequest {
            provider: Provider::GitHub,
            access_token: "gho_token",
            refresh_token: None,
            callback_url: CALLBACK_URL,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["provider"], "github");
        assert_eq!(json["accessToken"], "gho_token");
        assert!(json.get("refreshToken").is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = EmailCredentials {
            email: "m@example.com".to_string(),
            password: "hunter22".to_string(),
        };

        assert!(!format!("{credentials:?}").contains("hunter22"));
    }
}
