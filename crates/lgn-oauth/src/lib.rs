//! OAuth handshake library for lgn
//!
//! This crate holds everything about the authorization-code-with-PKCE flow
//! that does not depend on the web framework: the catalogue of supported
//! identity providers, the handshake value carried in cookies between the
//! redirect and the callback, and the `oauth2` clients used to build
//! authorization URLs and exchange codes.

pub mod client;
pub mod error;
pub mod handshake;
pub mod provider;

pub use client::{ProviderClient, ProviderCredentials, ProviderTokens};
pub use error::OAuthError;
pub use handshake::Handshake;
pub use provider::Provider;
