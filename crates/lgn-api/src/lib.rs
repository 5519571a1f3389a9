//! Sign-in frontend: the email and password form, and the OAuth
//! authorization code flow with PKCE for Discord, GitHub and Google.
//!
//! Accounts live in an external authentication service reached through
//! [`auth::Authenticator`]. This crate only owns the browser side: the
//! handshake cookies of an OAuth flow and the session cookie.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod redirect;
pub mod router;
pub mod signin;
pub mod state;
pub mod tracing;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig, CookieConfig};
