use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;

use crate::api::ApiClient;
use crate::auth::{AuthController, AuthOutcome, UserCache};

/// Read one trimmed line, using `preset` instead when it was given on
/// the command line.
pub fn ask(rl: &mut DefaultEditor, label: &str, preset: Option<String>) -> Result<String> {
    if let Some(value) = preset {
        return Ok(value.trim().to_string());
    }
    let line = rl.readline(&format!("{}: ", label))?;
    Ok(line.trim().to_string())
}

fn report(controller: &AuthController, outcome: AuthOutcome) -> Result<()> {
    match outcome {
        AuthOutcome::Redirect(_) => {
            println!("Signed in.");
            Ok(())
        }
        AuthOutcome::Rejected => {
            let message = controller
                .banner()
                .map(|b| b.message.clone())
                .unwrap_or_else(|| String::from("Authentication failed"));
            Err(anyhow!(message))
        }
    }
}

pub async fn sign_in(api: ApiClient, cache: UserCache, email: Option<String>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let email = ask(&mut rl, "Email", email)?;
    let password = rl.readline("Password: ")?;

    let mut controller = AuthController::new(api, cache);
    let outcome = controller.submit_sign_in(&email, &password).await;
    report(&controller, outcome)
}

pub async fn sign_up(
    api: ApiClient,
    cache: UserCache,
    username: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let username = ask(&mut rl, "Username", username)?;
    let email = ask(&mut rl, "Email", email)?;
    let password = rl.readline("Password: ")?;
    let confirm_password = rl.readline("Confirm password: ")?;

    let mut controller = AuthController::new(api, cache);
    controller.show_sign_up();
    let outcome = controller
        .submit_sign_up(&username, &email, &password, &confirm_password)
        .await;
    report(&controller, outcome)
}

pub async fn logout(api: ApiClient, cache: UserCache) -> Result<()> {
    // Forget the local user even if the service is unreachable
    let result = api.logout().await;
    cache.clear();
    result?;
    println!("Signed out.");
    Ok(())
}
