use serde::Deserialize;

use crate::auth::EmailCredentials;

/// Banner text when the authentication service gives no usable message
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Submitted sign-in form
///
/// Missing fields deserialize as empty strings so they surface as field
/// errors instead of a rejected request.
#[derive(Clone, Default, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Per-field validation messages
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl FieldErrors {
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl SignInForm {
    /// Run the field validators
    ///
    /// These only catch obvious typos before calling the authentication
    /// service; they are not a security boundary.
    pub fn validate(&self) -> FieldErrors {
        FieldErrors {
            email: validate_email(&self.email),
            password: validate_password(&self.password),
        }
    }

    pub fn into_credentials(self) -> EmailCredentials {
        EmailCredentials {
            email: self.email,
            password: self.password,
        }
    }
}

pub fn validate_email(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("Email is required")
    } else if !email.contains('@') {
        Some("Must be a valid email")
    } else {
        None
    }
}

pub fn validate_password(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.chars().count() < 6 {
        Some("Password must be at least 6 characters")
    } else {
        None
    }
}
