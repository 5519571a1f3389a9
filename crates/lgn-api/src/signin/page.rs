use askama::Template;
use axum::response::Html;
use lgn_oauth::Provider;

use super::form::FieldErrors;
use crate::error::ApiError;

/// Link starting the OAuth flow of one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialButton {
    pub provider: &'static str,
    pub label: &'static str,
}

impl From<Provider> for SocialButton {
    fn from(provider: Provider) -> Self {
        Self {
            provider: provider.as_str(),
            label: provider.label(),
        }
    }
}

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignInPage {
    /// Submitted email, echoed back on errors. The password never is.
    pub email: String,
    pub email_error: Option<&'static str>,
    pub password_error: Option<&'static str>,
    /// Inline error banner above the form
    pub banner: Option<String>,
    /// False while any field validator fails
    pub can_submit: bool,
    pub social_buttons: Vec<SocialButton>,
}

impl SignInPage {
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            email: String::new(),
            email_error: None,
            password_error: None,
            banner: None,
            can_submit: true,
            social_buttons: providers.into_iter().map(SocialButton::from).collect(),
        }
    }

    pub fn with_field_errors(mut self, email: String, errors: FieldErrors) -> Self {
        self.email = email;
        self.can_submit = errors.is_empty();
        self.email_error = errors.email;
        self.password_error = errors.password;
        self
    }

    pub fn with_banner(mut self, email: String, message: impl Into<String>) -> Self {
        self.email = email;
        self.banner = Some(message.into());
        self
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub email: String,
}

pub fn render(page: &impl Template) -> Result<Html<String>, ApiError> {
    Ok(Html(page.render()?))
}
