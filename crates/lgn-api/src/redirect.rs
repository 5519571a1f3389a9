use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Landing page for signed-in users
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SIGNIN_PATH: &str = "/signin";

/// `302 Found` to `location`
///
/// `axum::response::Redirect` only offers 303, 307 and 308.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
