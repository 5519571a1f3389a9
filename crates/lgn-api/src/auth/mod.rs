pub mod authenticator;
pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod providers;
pub mod routes;

pub use authenticator::{
    AuthError, AuthenticatedUser, Authenticator, EmailCredentials, RemoteAuthenticator,
};
pub use middleware::{AuthUser, MaybeAuthUser};
pub use providers::ProviderRegistry;
pub use routes::routes;
