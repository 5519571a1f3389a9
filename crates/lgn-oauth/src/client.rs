use std::fmt;

use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
    basic::BasicClient, url::Url,
};
use serde::Deserialize;

use crate::{error::OAuthError, handshake::Handshake, provider::Provider};

pub type OAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Application credentials registered with a provider
#[derive(Clone, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Replaces the provider's authorization endpoint
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Replaces the provider's token endpoint
    #[serde(default)]
    pub token_url: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_url", &self.redirect_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Tokens returned by a provider's token endpoint
#[derive(Clone)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<std::time::Duration>,
}

impl fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Upper bound for one token exchange
pub const TOKEN_EXCHANGE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// OAuth client bound to one provider
#[derive(Clone, Debug)]
pub struct ProviderClient {
    provider: Provider,
    client: OAuthClient,
    http: reqwest::Client,
}

impl ProviderClient {
    /// Create a client for `provider`
    ///
    /// `http` is used for the token exchange only. It should not follow
    /// redirects, see [`ProviderClient::http_client`].
    pub fn new(
        provider: Provider,
        credentials: ProviderCredentials,
        http: reqwest::Client,
    ) -> Result<Self, OAuthError> {
        let auth_url = credentials
            .auth_url
            .unwrap_or_else(|| provider.auth_url().to_string());
        let token_url = credentials
            .token_url
            .unwrap_or_else(|| provider.token_url().to_string());

        let client = BasicClient::new(ClientId::new(credentials.client_id))
            .set_client_secret(ClientSecret::new(credentials.client_secret))
            .set_auth_uri(AuthUrl::new(auth_url)?)
            .set_token_uri(TokenUrl::new(token_url)?)
            .set_redirect_uri(RedirectUrl::new(credentials.redirect_url)?);

        // GitHub expects the client credentials in the form body
        let client = match provider {
            Provider::GitHub => client.set_auth_type(AuthType::RequestBody),
            Provider::Discord | Provider::Google => client,
        };

        Ok(Self {
            provider,
            client,
            http,
        })
    }

    /// HTTP client suitable for token exchanges
    pub fn http_client() -> Result<reqwest::Client, OAuthError> {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(TOKEN_EXCHANGE_TIMEOUT)
            .build()
            .map_err(|e| OAuthError::TokenExchange(format!("Failed to build HTTP client: {e}")))
    }

    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Provider authorization URL for `handshake`
    ///
    /// Carries the client id, redirect URI, the provider's scopes, the
    /// handshake's state and its S256 PKCE challenge.
    pub fn authorization_url(&self, handshake: &Handshake) -> Url {
        let state = CsrfToken::new(handshake.state().to_string());

        let (url, _) = self
            .client
            .authorize_url(move || state)
            .add_scopes(
                self.provider
                    .scopes()
                    .iter()
                    .map(|scope| Scope::new((*scope).to_string())),
            )
            .set_pkce_challenge(handshake.challenge())
            .url();

        url
    }

    /// Exchange an authorization code, proving possession of the verifier
    pub async fn exchange_code(
        &self,
        code: String,
        verifier: String,
    ) -> Result<ProviderTokens, OAuthError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        tracing::debug!(provider = %self.provider, "Authorization code exchanged");

        Ok(ProviderTokens {
            access_token: response.access_token().secret().clone(),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expires_in: response.expires_in(),
        })
    }
}
