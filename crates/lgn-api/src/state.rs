use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{
    ApiConfig,
    auth::{Authenticator, ProviderRegistry, RemoteAuthenticator},
    config::Environment,
};

/// Settings for the session token
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

/// Attributes shared by every cookie the API writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieConfig {
    /// Send cookies over HTTPS only
    pub secure: bool,
}

#[derive(Clone)]
pub struct ApiState {
    pub providers: Arc<ProviderRegistry>,
    pub authenticator: Arc<dyn Authenticator>,
    pub auth: AuthConfig,
    pub cookies: CookieConfig,
    pub cookie_key: Key,
    pub oauth_flow_expiry: time::Duration,
    pub environment: Environment,
}

impl ApiState {
    /// Build the state, talking to the authentication service over HTTP
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let authenticator = RemoteAuthenticator::new(&config.auth_service_url)?;
        Self::with_authenticator(config, Arc::new(authenticator))
    }

    pub fn with_authenticator(
        config: ApiConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> anyhow::Result<Self> {
        let cookie_key = Key::from(config.cookie_secret.as_bytes());

        let providers = ProviderRegistry::from_credentials(config.providers.clone())?;
        if providers.is_empty() {
            tracing::warn!("No OAuth provider configured, only email sign-in is available");
        }

        Ok(Self {
            providers: Arc::new(providers),
            authenticator,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                jwt_expiry_hours: config.jwt_expiry_hours,
            },
            cookies: CookieConfig {
                secure: config.secure_cookies(),
            },
            cookie_key,
            oauth_flow_expiry: time::Duration::minutes(config.oauth_flow_expiry_minutes),
            environment: config.env,
        })
    }
}

impl FromRef<ApiState> for Key {
    fn from_ref(state: &ApiState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}
