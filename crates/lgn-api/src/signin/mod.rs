pub mod form;
pub mod page;
pub mod routes;

pub use form::{FieldErrors, SignInForm};
pub use routes::routes;
