use axum::{
    Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use lgn_oauth::{Handshake, ProviderClient, handshake::states_match};
use time::OffsetDateTime;
use serde::Deserialize;

use super::{cookies, jwt};
use crate::{
    ApiState,
    error::ApiError,
    metrics,
    middleware::rate_limit::{self, RateLimit},
    redirect::{self, DASHBOARD_PATH, SIGNIN_PATH},
};

pub fn routes() -> Router<ApiState> {
    let oauth_routes = Router::new()
        .route("/api/auth/{provider}", get(start_authorization))
        .route("/api/auth/{provider}/callback", get(complete_authorization))
        .route("/api/auth/signout", post(sign_out));

    rate_limit::apply_rate_limit(oauth_routes, RateLimit::OAUTH)
}

/// Begin a sign-in with an identity provider
///
/// Stores a fresh state token and PKCE verifier in private cookies and
/// redirects (302) to the provider's authorization page. Nothing is kept
/// server side: the callback reads the same cookies back.
async fn start_authorization(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), ApiError> {
    let client = state.providers.resolve(&provider)?;
    let provider = client.provider();

    let handshake = Handshake::generate(provider, state.oauth_flow_expiry)?;
    let auth_url = client.authorization_url(&handshake);

    let [state_cookie, verifier_cookie] = cookies::handshake_cookies(&handshake, &state.cookies);
    let jar = jar.add(state_cookie).add(verifier_cookie);

    metrics::record_auth_event("oauth_start", provider.as_str(), true);
    tracing::info!(%provider, expires_at = %handshake.expires_at(), "OAuth sign-in started");

    Ok((jar, redirect::found(auth_url.as_str())))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Provider redirect back after the user signed in (or refused)
///
/// The handshake cookies are cleared whatever the outcome, so a callback
/// can be attempted only once per handshake.
async fn complete_authorization(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    jar: PrivateCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(PrivateCookieJar, Result<Response, ApiError>), ApiError> {
    let client = state.providers.resolve(&provider)?;
    let provider = client.provider();

    let stored_state = jar
        .get(&provider.state_cookie_name())
        .map(|c| c.value().to_owned());
    let verifier = jar
        .get(&provider.verifier_cookie_name())
        .map(|c| c.value().to_owned());
    let jar = cookies::clear_handshake(jar, provider);

    match finish_authorization(&state, client, query, stored_state, verifier).await {
        Ok(session_cookie) => {
            metrics::record_auth_event("oauth_callback", provider.as_str(), true);
            Ok((jar.add(session_cookie), Ok(redirect::found(DASHBOARD_PATH))))
        }
        Err(e) => {
            metrics::record_auth_event("oauth_callback", provider.as_str(), false);
            tracing::warn!(%provider, error = %e, "OAuth sign-in failed");
            Ok((jar, Err(e)))
        }
    }
}

async fn finish_authorization(
    state: &ApiState,
    client: &ProviderClient,
    query: CallbackQuery,
    stored_state: Option<String>,
    verifier: Option<String>,
) -> Result<Cookie<'static>, ApiError> {
    if let Some(error) = query.error {
        return Err(ApiError::OAuthDenied(query.error_description.unwrap_or(error)));
    }

    let (Some(stored_state), Some(verifier)) = (stored_state, verifier) else {
        return Err(ApiError::OAuthState(
            "No sign-in in progress or it has expired".to_string(),
        ));
    };

    let handshake = Handshake::restore(client.provider(), stored_state, &verifier)
        .map_err(|_| ApiError::OAuthState("Malformed sign-in cookies".to_string()))?;

    if handshake.is_expired_at(OffsetDateTime::now_utc()) {
        return Err(ApiError::OAuthState("Sign-in attempt expired".to_string()));
    }

    // A mismatch also happens when a newer attempt overwrote the cookies
    let received_state = query.state.unwrap_or_default();
    if !states_match(handshake.state(), &received_state) {
        return Err(ApiError::OAuthState("State mismatch".to_string()));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::OAuthState("Missing authorization code".to_string()))?;

    let tokens = client
        .exchange_code(code, handshake.verifier().to_string())
        .await?;

    let user = state
        .authenticator
        .sign_in_social(client.provider(), &tokens)
        .await?;

    let token = jwt::generate_jwt_token(&user, &state.auth)?;
    tracing::info!(provider = %client.provider(), user_id = %user.id, "User signed in");

    Ok(cookies::create_auth_cookie(
        token,
        &state.cookies,
        state.auth.jwt_expiry_hours,
    ))
}

/// Drop the session cookie
///
/// POST only: a cross-site GET (an image, a link) must not sign anyone out.
async fn sign_out(jar: PrivateCookieJar) -> (PrivateCookieJar, Response) {
    let jar = jar.remove(cookies::removal_cookie(cookies::AUTH_COOKIE));

    (jar, redirect::found(SIGNIN_PATH))
}
