//! The sign in / sign up page.

use std::time::{Duration, Instant};

use anyhow::{Error, Result};

use super::cache::{CachedUser, UserCache};
use crate::api::ApiClient;
use crate::api::public::AuthResponse;
use crate::core::Route;

/// How long an error banner stays up
pub const AUTH_ERROR_TIMEOUT: Duration = Duration::from_secs(5);

const GENERIC_ERROR: &str = "An error occurred. Please try again.";
const PASSWORD_MISMATCH: &str = "Passwords do not match.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthForm {
    SignIn,
    SignUp,
}

impl AuthForm {
    pub fn title(&self) -> &'static str {
        match self {
            AuthForm::SignIn => "Sign In",
            AuthForm::SignUp => "Sign Up",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub message: String,
    pub shown_at: Instant,
}

impl Banner {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= AUTH_ERROR_TIMEOUT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Redirect(Route),
    /// Nothing submitted or the service said no; see the banner
    Rejected,
}

pub struct AuthController {
    api: ApiClient,
    cache: UserCache,
    form: AuthForm,
    banner: Option<Banner>,
}

impl AuthController {
    pub fn new(api: ApiClient, cache: UserCache) -> Self {
        Self {
            api,
            cache,
            form: AuthForm::SignIn,
            banner: None,
        }
    }

    /// The one form currently shown
    pub fn form(&self) -> AuthForm {
        self.form
    }

    pub fn show_sign_up(&mut self) {
        self.form = AuthForm::SignUp;
    }

    pub fn show_sign_in(&mut self) {
        self.form = AuthForm::SignIn;
    }

    /// The banner as of `now`, unless it has timed out.
    pub fn banner_at(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| !b.is_expired(now))
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner_at(Instant::now())
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    fn show_error(&mut self, message: &str) {
        // Replaces whatever banner was up before
        self.banner = Some(Banner {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }

    pub async fn submit_sign_in(&mut self, email: &str, password: &str) -> AuthOutcome {
        let result = self.api.sign_in(email, password).await;
        self.handle_response(result)
    }

    /// Sign up. The only check made before contacting the service is
    /// that both passwords match.
    pub async fn submit_sign_up(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> AuthOutcome {
        if password != confirm_password {
            self.show_error(PASSWORD_MISMATCH);
            return AuthOutcome::Rejected;
        }
        let result = self.api.sign_up(username, email, password).await;
        self.handle_response(result)
    }

    fn handle_response(&mut self, result: Result<AuthResponse, Error>) -> AuthOutcome {
        match result {
            Ok(resp) if resp.success => {
                let cached = CachedUser {
                    user: resp.user.unwrap_or_default(),
                    session_cookie: self.api.session_cookie(),
                };
                if let Err(e) = self.cache.store(&cached) {
                    tracing::warn!("Unable to cache user: {}", e);
                }
                self.banner = None;
                AuthOutcome::Redirect(Route::Root)
            }
            Ok(resp) => {
                let message = resp.message.unwrap_or_else(|| GENERIC_ERROR.to_string());
                self.show_error(&message);
                AuthOutcome::Rejected
            }
            Err(e) => {
                tracing::error!("Authentication request failed: {}", e);
                self.show_error(GENERIC_ERROR);
                AuthOutcome::Rejected
            }
        }
    }
}
