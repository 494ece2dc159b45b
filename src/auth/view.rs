//! HTML for the auth page.

use std::time::Instant;

use anyhow::{Error, Result};
use serde_json::json;

use super::controller::{AuthController, AuthForm};
use crate::core::templates::{Template, templates};

/// The auth card as of `now`: title, the banner if it is still up, and
/// only the visible form.
pub fn render(controller: &AuthController, now: Instant) -> Result<String, Error> {
    let form = controller.form();
    let data = json!({
        "title": form.title(),
        "banner": controller.banner_at(now).map(|b| b.message.clone()),
        "sign_in": form == AuthForm::SignIn,
    });
    let html = templates().render(&Template::AuthCard.to_string(), &data)?;
    Ok(html)
}
