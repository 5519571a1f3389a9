use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use cookie::{Cookie, CookieJar as RawCookieJar, Key as RawKey};
use http_body_util::BodyExt;
use lgn_api::{
    ApiConfig, ApiState,
    auth::{AuthError, AuthenticatedUser, Authenticator, EmailCredentials, jwt},
};
use lgn_oauth::{Provider, ProviderTokens};
use serde::Deserialize;
use tower::ServiceExt;

pub const TEST_EMAIL: &str = "m@example.com";
pub const TEST_PASSWORD: &str = "secret123";
/// Known to the authentication service, which refuses it without a reason
pub const SILENT_EMAIL: &str = "silent@example.com";

/// In-memory stand-in for the authentication service
#[derive(Debug, Default)]
pub struct MockAuthenticator {
    passwords: HashMap<String, String>,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        let mut passwords = HashMap::new();
        passwords.insert(TEST_EMAIL.to_string(), TEST_PASSWORD.to_string());
        Self { passwords }
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn sign_in_email(
        &self,
        credentials: &EmailCredentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        if credentials.email == SILENT_EMAIL {
            return Err(AuthError::Rejected { message: None });
        }

        match self.passwords.get(&credentials.email) {
            Some(password) if *password == credentials.password => Ok(AuthenticatedUser {
                id: format!("user:{}", credentials.email),
                email: credentials.email.clone(),
            }),
            _ => Err(AuthError::Rejected {
                message: Some("Invalid password".to_string()),
            }),
        }
    }

    async fn sign_in_social(
        &self,
        provider: Provider,
        _tokens: &ProviderTokens,
    ) -> Result<AuthenticatedUser, AuthError> {
        Ok(AuthenticatedUser {
            id: format!("{provider}:1"),
            email: format!("{provider}@example.com"),
        })
    }
}

/// Test state builder for creating an ApiState without external services
pub struct TestStateBuilder {
    vars: Vec<(String, String)>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        let vars = [
            (
                "COOKIE_SECRET",
                "test_cookie_secret_minimum_64_characters_long_for_secure_encryption".to_string(),
            ),
            (
                "JWT_SECRET",
                "test_jwt_secret_minimum_32_characters_long".to_string(),
            ),
            ("AUTH_SERVICE_URL", "http://localhost:4000/api/auth".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { vars }.with_providers(&[Provider::Discord, Provider::Google])
    }

    /// Enable `providers` with fake credentials
    pub fn with_providers(mut self, providers: &[Provider]) -> Self {
        for provider in providers {
            let prefix = provider.env_prefix();
            self.vars.extend([
                (format!("{prefix}CLIENT_ID"), format!("{provider}_client_id")),
                (
                    format!("{prefix}CLIENT_SECRET"),
                    format!("{provider}_client_secret"),
                ),
                (
                    format!("{prefix}REDIRECT_URL"),
                    format!("http://localhost:3000/api/auth/{provider}/callback"),
                ),
            ]);
        }
        self
    }

    /// Send `provider`'s token exchange to `token_url`
    pub fn with_token_url(mut self, provider: Provider, token_url: &str) -> Self {
        self.vars.push((
            format!("{}TOKEN_URL", provider.env_prefix()),
            token_url.to_string(),
        ));
        self
    }

    pub fn production(mut self) -> Self {
        self.vars
            .push(("APP_ENV".to_string(), "production".to_string()));
        self
    }

    pub fn build(self) -> anyhow::Result<ApiState> {
        let config = ApiConfig::from_vars(self.vars)?;
        ApiState::with_authenticator(config, Arc::new(MockAuthenticator::new()))
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Session token for `email`, as the sign-in handlers would issue it
pub fn session_token(state: &ApiState, email: &str) -> String {
    let user = AuthenticatedUser {
        id: format!("user:{email}"),
        email: email.to_string(),
    };
    jwt::generate_jwt_token(&user, &state.auth).expect("Failed to create token")
}

/// Encrypt `value` the way the private cookie jar does, as `name=value`
pub fn encrypted_cookie(name: &str, value: &str, cookie_key: &Key) -> String {
    let raw_key = RawKey::try_from(cookie_key.master()).expect("Invalid key");
    let mut raw_jar = RawCookieJar::new();
    raw_jar
        .private_mut(&raw_key)
        .add(Cookie::new(name.to_string(), value.to_string()));

    let encrypted = raw_jar.get(name).expect("Cookie should exist");
    encrypted.encoded().stripped().to_string()
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Client for the full application built from `state`
    pub fn app(state: ApiState) -> Self {
        Self::new(lgn_api::router::app(state))
    }

    /// Send a request and get the response
    pub async fn request(&self, mut request: Request<Body>) -> TestResponse {
        // Add ConnectInfo extension for rate limiting to work in tests
        let test_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        request.extensions_mut().insert(ConnectInfo(test_addr));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    /// Send a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.get_with_cookies(uri, None).await
    }

    /// Send a GET request with a raw `Cookie` header
    pub async fn get_with_cookies(&self, uri: &str, cookies: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-forwarded-for", "127.0.0.1"); // Required for rate limiting in tests

        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }

        self.request(builder.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    /// Send a urlencoded form, as the sign-in page does
    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookies: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "127.0.0.1"); // Required for rate limiting in tests

        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }

        self.request(builder.body(Body::from(body)).expect("Failed to build request"))
            .await
    }
}

/// Minimal form encoding, enough for the values the tests send
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .expect("Response has no Location header")
            .to_str()
            .expect("Location is not valid UTF-8")
    }

    /// Every `Set-Cookie` of the response, parsed
    pub fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| {
                let value = value.to_str().expect("Set-Cookie is not valid UTF-8");
                // The jar percent-encodes what it writes
                Cookie::parse_encoded(value.to_string()).expect("Invalid Set-Cookie")
            })
            .collect()
    }

    /// The `Set-Cookie` named `name`, if any
    pub fn set_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies().into_iter().find(|c| c.name() == name)
    }

    /// Decrypted value of a private cookie set by the response
    pub fn private_cookie_value(&self, name: &str, cookie_key: &Key) -> Option<String> {
        let raw_key = RawKey::try_from(cookie_key.master()).expect("Invalid key");
        let mut raw_jar = RawCookieJar::new();
        raw_jar.add_original(self.set_cookie(name)?);

        raw_jar
            .private(&raw_key)
            .get(name)
            .map(|c| c.value().to_string())
    }

    /// `Cookie` header replaying every non-removal cookie of the response
    pub fn cookie_header(&self) -> String {
        self.set_cookies()
            .iter()
            .filter(|c| !is_removal(c))
            .map(|c| c.encoded().stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Whether a `Set-Cookie` expires the cookie
pub fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.max_age() == Some(time::Duration::ZERO)
}
