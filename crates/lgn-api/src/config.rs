use std::fmt;

use lgn_oauth::{Provider, ProviderCredentials};
use serde::Deserialize;
use thiserror::Error;

/// Minimum length accepted by the private cookie key derivation
const MIN_COOKIE_SECRET_LEN: usize = 64;
const MIN_JWT_SECRET_LEN: usize = 32;

/// One year
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;
/// One day
pub const MAX_OAUTH_FLOW_EXPIRY_MINUTES: i64 = 24 * 60;

/// Deployment mode, read from `APP_ENV`
///
/// Anything other than `production` is treated as development.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing or invalid environment variable: {0}")]
    Env(#[from] envy::Error),
    #[error("COOKIE_SECRET must be at least 64 bytes long")]
    CookieSecretTooShort,
    #[error("JWT_SECRET must be at least 32 bytes long")]
    JwtSecretTooShort,
    #[error("AUTH_SERVICE_URL is not a valid URL: {0}")]
    InvalidAuthServiceUrl(String),
    #[error("{0} must be between 1 and {1}")]
    DurationOutOfRange(&'static str, i64),
}

/// Application configuration, loaded once at startup
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default, rename = "app_env")]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub cookie_secret: String,
    /// Force the Secure attribute outside production (e.g. staging behind TLS)
    #[serde(default)]
    pub cookie_secure: bool,
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
    #[serde(default = "default_oauth_flow_expiry_minutes")]
    pub oauth_flow_expiry_minutes: i64,
    pub auth_service_url: String,
    /// Providers with a complete set of `{PROVIDER}_CLIENT_ID`,
    /// `{PROVIDER}_CLIENT_SECRET` and `{PROVIDER}_REDIRECT_URL`, plus the
    /// optional `{PROVIDER}_AUTH_URL` / `{PROVIDER}_TOKEN_URL` overrides
    #[serde(skip)]
    pub providers: Vec<(Provider, ProviderCredentials)>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_jwt_expiry_hours() -> i64 {
    24
}

const fn default_oauth_flow_expiry_minutes() -> i64 {
    10
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Load the configuration from an explicit list of variables
    pub fn from_vars(vars: Vec<(String, String)>) -> Result<Self, ConfigError> {
        let mut config: Self = envy::from_iter(vars.clone())?;

        for provider in Provider::ALL {
            let prefix = provider.env_prefix();
            let configured = vars
                .iter()
                .any(|(key, _)| key.strip_prefix(&prefix) == Some("CLIENT_ID"));

            if configured {
                // A partially configured provider is a startup error
                let credentials = envy::prefixed(prefix)
                    .from_iter::<_, ProviderCredentials>(vars.clone())?;
                config.providers.push((provider, credentials));
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::CookieSecretTooShort);
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::JwtSecretTooShort);
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.jwt_expiry_hours) {
            return Err(ConfigError::DurationOutOfRange(
                "JWT_EXPIRY_HOURS",
                MAX_JWT_EXPIRY_HOURS,
            ));
        }
        if !(1..=MAX_OAUTH_FLOW_EXPIRY_MINUTES).contains(&self.oauth_flow_expiry_minutes) {
            return Err(ConfigError::DurationOutOfRange(
                "OAUTH_FLOW_EXPIRY_MINUTES",
                MAX_OAUTH_FLOW_EXPIRY_MINUTES,
            ));
        }
        reqwest::Url::parse(&self.auth_service_url)
            .map_err(|e| ConfigError::InvalidAuthServiceUrl(e.to_string()))?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether cookies get the Secure attribute
    pub const fn secure_cookies(&self) -> bool {
        self.env.is_production() || self.cookie_secure
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("env", &self.env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cookie_secure", &self.cookie_secure)
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("oauth_flow_expiry_minutes", &self.oauth_flow_expiry_minutes)
            .field("auth_service_url", &self.auth_service_url)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
