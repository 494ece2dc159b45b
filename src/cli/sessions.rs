use anyhow::Result;

use super::chat::print_sessions;
use crate::api::ApiClient;
use crate::chat::{ChatController, view};
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, api: ApiClient, html: bool) -> Result<()> {
    let mut controller = ChatController::new(api, &config.welcome_message);
    controller.load_sessions().await?;

    if html {
        println!("{}", view::render_sidebar(controller.state())?);
    } else {
        print_sessions(&controller);
    }
    Ok(())
}
