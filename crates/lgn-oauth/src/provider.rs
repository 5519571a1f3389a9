use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::OAuthError;

/// Identity providers users can sign in with
///
/// Every provider goes through the same initiation procedure: a state token
/// and a PKCE verifier are stored in two cookies named after the provider,
/// then the browser is redirected to the provider's authorization endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Discord,
    GitHub,
    Google,
}

impl Provider {
    /// All supported providers, in the order their buttons are shown
    pub const ALL: [Self; 3] = [Self::Discord, Self::GitHub, Self::Google];

    /// Path segment and cookie prefix (`discord`, `github`, `google`)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }

    /// Human readable name used on sign-in buttons
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Discord => "Discord",
            Self::GitHub => "GitHub",
            Self::Google => "Google",
        }
    }

    /// Scopes requested on every authorization request
    pub const fn scopes(&self) -> &'static [&'static str] {
        match self {
            Self::Discord => &["identify", "email"],
            Self::GitHub => &["read:user", "user:email"],
            Self::Google => &["openid", "email", "profile"],
        }
    }

    pub const fn auth_url(&self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/oauth2/authorize",
            Self::GitHub => "https://github.com/login/oauth/authorize",
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    pub const fn token_url(&self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/api/oauth2/token",
            Self::GitHub => "https://github.com/login/oauth/access_token",
            Self::Google => "https://oauth2.googleapis.com/token",
        }
    }

    /// Name of the cookie carrying the anti-CSRF state token
    pub fn state_cookie_name(&self) -> String {
        format!("{}_oauth_state", self.as_str())
    }

    /// Name of the cookie carrying the PKCE code verifier
    pub fn verifier_cookie_name(&self) -> String {
        format!("{}_code_verifier", self.as_str())
    }

    /// Prefix of the provider's environment variables (`DISCORD_`, ...)
    pub fn env_prefix(&self) -> String {
        format!("{}_", self.as_str().to_uppercase())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| OAuthError::UnknownProvider(s.to_string()))
    }
}
