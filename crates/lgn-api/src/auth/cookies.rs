use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use lgn_oauth::{Handshake, Provider};

use crate::state::CookieConfig;

/// Name of the session cookie
pub const AUTH_COOKIE: &str = "auth_token";

/// Create the two cookies carrying an OAuth handshake
///
/// The state token and the PKCE verifier are written with identical
/// attributes. The verifier cookie also carries the handshake's lifetime
/// (see [`Handshake::verifier_cookie_value`]) so the callback can refuse an
/// expired attempt even when the browser kept the cookies.
///
/// - `Path=/`, `HttpOnly`, `SameSite=Lax` so they come back on the
///   provider's top-level redirect to the callback
/// - `Max-Age` and `Expires` both bound to the handshake's expiry
/// - `Secure` when the configuration asks for it (always in production)
pub fn handshake_cookies(handshake: &Handshake, config: &CookieConfig) -> [Cookie<'static>; 2] {
    let provider = handshake.provider();

    [
        (provider.state_cookie_name(), handshake.state().to_string()),
        (provider.verifier_cookie_name(), handshake.verifier_cookie_value()),
    ]
    .map(|(name, value)| {
        Cookie::build((name, value))
            .path("/")
            .max_age(handshake.ttl())
            .expires(handshake.expires_at())
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.secure)
            .build()
    })
}

/// Drop both handshake cookies of `provider` from the jar
pub fn clear_handshake(jar: PrivateCookieJar, provider: Provider) -> PrivateCookieJar {
    jar.remove(removal_cookie(provider.state_cookie_name()))
        .remove(removal_cookie(provider.verifier_cookie_name()))
}

/// Create the session cookie holding the JWT
pub fn create_auth_cookie(
    token: String,
    config: &CookieConfig,
    expiry_hours: i64,
) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .max_age(time::Duration::hours(expiry_hours))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .build()
}

/// Cookie matching `name` on path `/`, used to expire it
pub fn removal_cookie(name: impl Into<String>) -> Cookie<'static> {
    Cookie::build((name.into(), "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake() -> Handshake {
        Handshake::generate(Provider::Discord, time::Duration::minutes(10)).unwrap()
    }

    #[test]
    fn test_handshake_cookies_development() {
        let handshake = handshake();
        let [state, verifier] = handshake_cookies(&handshake, &CookieConfig { secure: false });

        assert_eq!(state.name(), "discord_oauth_state");
        assert_eq!(state.value(), handshake.state());
        assert_eq!(verifier.name(), "discord_code_verifier");
        assert_eq!(verifier.value(), handshake.verifier_cookie_value());
        assert_eq!(
            Handshake::restore(
                Provider::Discord,
                state.value().to_string(),
                verifier.value()
            )
            .unwrap(),
            handshake
        );

        for cookie in [&state, &verifier] {
            assert_eq!(cookie.path(), Some("/"));
            assert!(cookie.http_only().unwrap_or(false));
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
            assert_eq!(cookie.max_age(), Some(time::Duration::seconds(600)));
            assert_eq!(
                cookie.expires_datetime(),
                Some(handshake.expires_at()),
                "Should expire with the handshake"
            );
            assert!(
                !cookie.secure().unwrap_or(true),
                "Should not be secure in development"
            );
        }
    }

    #[test]
    fn test_handshake_cookies_production() {
        let [state, verifier] = handshake_cookies(&handshake(), &CookieConfig { secure: true });

        assert!(
            state.secure().unwrap_or(false),
            "Should be secure in production"
        );
        assert!(
            verifier.secure().unwrap_or(false),
            "Should be secure in production"
        );
    }

    #[test]
    fn test_handshake_cookies_follow_provider() {
        let handshake = Handshake::generate(Provider::GitHub, time::Duration::minutes(5)).unwrap();
        let [state, verifier] = handshake_cookies(&handshake, &CookieConfig { secure: false });

        assert_eq!(state.name(), "github_oauth_state");
        assert_eq!(verifier.name(), "github_code_verifier");
        assert_eq!(state.max_age(), Some(time::Duration::minutes(5)));
    }

    #[test]
    fn test_create_auth_cookie() {
        let cookie = create_auth_cookie("test_token".to_string(), &CookieConfig { secure: true }, 24);

        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "test_token");
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.http_only().unwrap_or(false));
        assert!(cookie.secure().unwrap_or(false));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }
}
