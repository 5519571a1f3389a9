use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2::{PkceCodeChallenge, PkceCodeVerifier};
use rand::{RngCore, rngs::OsRng};
use time::{Duration, OffsetDateTime};

use crate::{error::OAuthError, provider::Provider};

/// Random bytes behind each token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Not part of the base64url alphabet
const FIELD_SEPARATOR: char = '.';

/// State carried by the browser between the authorization redirect and the
/// provider's callback
///
/// A handshake is created once per login attempt and never mutated. The
/// state token and the PKCE verifier share the same expiry, so both cookies
/// written from it disappear together.
#[derive(Clone, PartialEq, Eq)]
pub struct Handshake {
    provider: Provider,
    state: String,
    verifier: String,
    issued_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl Handshake {
    /// Start a new handshake for `provider` valid for `ttl`
    ///
    /// Both tokens come from the operating system's CSPRNG. If it cannot be
    /// read the error is returned as is: there is no weaker fallback.
    pub fn generate(provider: Provider, ttl: Duration) -> Result<Self, OAuthError> {
        let state = random_token()?;
        let verifier = random_token()?;
        // Whole seconds, the precision kept in the cookie
        let now = OffsetDateTime::now_utc();
        let issued_at = now.replace_nanosecond(0).unwrap_or(now);

        Ok(Self {
            provider,
            state,
            verifier,
            issued_at,
            expires_at: issued_at + ttl,
        })
    }

    /// Rebuild the handshake stored by [`Handshake::verifier_cookie_value`]
    ///
    /// `verifier_cookie` must come from a cookie the server encrypted itself:
    /// the timestamps are trusted as they are.
    pub fn restore(
        provider: Provider,
        state: String,
        verifier_cookie: &str,
    ) -> Result<Self, OAuthError> {
        let mut parts = verifier_cookie.split(FIELD_SEPARATOR);
        let (Some(verifier), Some(issued_at), Some(expires_at), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OAuthError::MalformedHandshake);
        };

        if state.is_empty() || verifier.is_empty() {
            return Err(OAuthError::MalformedHandshake);
        }

        Ok(Self {
            provider,
            state,
            verifier: verifier.to_string(),
            issued_at: parse_timestamp(issued_at)?,
            expires_at: parse_timestamp(expires_at)?,
        })
    }

    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Anti-CSRF state token, round-tripped through the provider
    pub fn state(&self) -> &str {
        &self.state
    }

    /// PKCE code verifier, sent only with the token exchange
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// S256 challenge derived from the verifier
    pub fn challenge(&self) -> PkceCodeChallenge {
        PkceCodeChallenge::from_code_verifier_sha256(&PkceCodeVerifier::new(
            self.verifier.clone(),
        ))
    }

    /// Verifier cookie payload: the verifier with the handshake's lifetime
    /// (`<verifier>.<issued_at>.<expires_at>`, Unix seconds)
    pub fn verifier_cookie_value(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.verifier,
            self.issued_at.unix_timestamp(),
            self.expires_at.unix_timestamp()
        )
    }

    pub const fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    pub const fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Remaining lifetime, used as the cookies' Max-Age
    pub fn ttl(&self) -> Duration {
        self.expires_at - self.issued_at
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("provider", &self.provider)
            .field("state", &"[redacted]")
            .field("verifier", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Compare the state stored in the cookie with the one the provider echoed
///
/// Runs in time independent of where the inputs differ.
pub fn states_match(expected: &str, received: &str) -> bool {
    let (expected, received) = (expected.as_bytes(), received.as_bytes());
    if expected.len() != received.len() || expected.is_empty() {
        return false;
    }

    expected
        .iter()
        .zip(received)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, OAuthError> {
    let seconds = value
        .parse::<i64>()
        .map_err(|_| OAuthError::MalformedHandshake)?;
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| OAuthError::MalformedHandshake)
}

fn random_token() -> Result<String, OAuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
