use std::fs;

use anyhow::{Result, anyhow};

use crate::api::ApiClient;
use crate::chat::ChatController;
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, api: ApiClient, prompt: &str, out: &str) -> Result<()> {
    let mut controller = ChatController::new(api, &config.welcome_message);
    let Some(bytes) = controller.generate_image(prompt).await else {
        let reason = controller
            .transcript()
            .last()
            .filter(|msg| msg.is_error)
            .map(|msg| msg.content.clone())
            .unwrap_or_else(|| String::from("Nothing to generate"));
        return Err(anyhow!(reason));
    };
    fs::write(out, &bytes)?;
    println!("Image saved to {} ({} bytes)", out, bytes.len());
    Ok(())
}
