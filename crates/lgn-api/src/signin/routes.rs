use axum::{
    Form, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::PrivateCookieJar;

use super::{
    form::{LOGIN_FAILED_MESSAGE, SignInForm},
    page::{self, DashboardPage, SignInPage},
};
use crate::{
    ApiState,
    auth::{MaybeAuthUser, cookies, jwt},
    error::ApiError,
    metrics,
    middleware::rate_limit::{self, RateLimit},
    redirect::{self, DASHBOARD_PATH, SIGNIN_PATH},
};

const SIGNIN_SCRIPT: &str = include_str!("../../assets/signin.js");
const SIGNIN_STYLES: &str = include_str!("../../assets/signin.css");

pub fn routes() -> Router<ApiState> {
    // Only submissions are limited
    let submit_routes = rate_limit::apply_rate_limit(
        Router::new().route("/signin", post(submit_signin)),
        RateLimit::SIGN_IN,
    );

    Router::new()
        .route("/signin", get(show_signin))
        .merge(submit_routes)
        .route("/dashboard", get(dashboard))
        .route("/assets/signin.js", get(signin_script))
        .route("/assets/signin.css", get(signin_styles))
}

async fn show_signin(
    State(state): State<ApiState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Response, ApiError> {
    if user.is_some() {
        return Ok(redirect::found(DASHBOARD_PATH));
    }

    let view = SignInPage::new(state.providers.enabled());
    Ok(page::render(&view)?.into_response())
}

/// Email and password sign-in
///
/// Field errors re-render the form with 422, a refusal from the
/// authentication service re-renders it with 401 and a banner. The password
/// is never echoed back.
async fn submit_signin(
    State(state): State<ApiState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: PrivateCookieJar,
    Form(form): Form<SignInForm>,
) -> Result<Response, ApiError> {
    if user.is_some() {
        return Ok(redirect::found(DASHBOARD_PATH));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        let view =
            SignInPage::new(state.providers.enabled()).with_field_errors(form.email, errors);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page::render(&view)?).into_response());
    }

    let email = form.email.clone();
    let credentials = form.into_credentials();

    let user = match state.authenticator.sign_in_email(&credentials).await {
        Ok(user) => user,
        Err(e) => {
            metrics::record_auth_event("email_signin", "email", false);
            tracing::warn!(error = %e, "Email sign-in failed");

            let message = e.user_message().unwrap_or(LOGIN_FAILED_MESSAGE).to_string();
            let view = SignInPage::new(state.providers.enabled()).with_banner(email, message);
            return Ok((StatusCode::UNAUTHORIZED, page::render(&view)?).into_response());
        }
    };

    let token = jwt::generate_jwt_token(&user, &state.auth)?;
    let jar = jar.add(cookies::create_auth_cookie(
        token,
        &state.cookies,
        state.auth.jwt_expiry_hours,
    ));

    metrics::record_auth_event("email_signin", "email", true);
    tracing::info!(user_id = %user.id, "User signed in");

    Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
}

async fn dashboard(MaybeAuthUser(user): MaybeAuthUser) -> Result<Response, ApiError> {
    let Some(user) = user else {
        return Ok(redirect::found(SIGNIN_PATH));
    };

    Ok(page::render(&DashboardPage { email: user.email })?.into_response())
}

async fn signin_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SIGNIN_SCRIPT,
    )
}

async fn signin_styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], SIGNIN_STYLES)
}
