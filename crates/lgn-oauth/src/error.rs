use thiserror::Error;

#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Secure random generator unavailable: {0}")]
    Randomness(#[from] rand::Error),
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),
    #[error("Malformed handshake cookie")]
    MalformedHandshake,
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}
