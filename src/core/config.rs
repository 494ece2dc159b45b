use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! I'm Mistral 7B Instruct powered by Wafee. Ask me anything and I'll do my best to help you!";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_url: String,
    pub storage_path: String,
    pub user_cache_path: PathBuf,
    pub welcome_message: String,
}

impl AppConfig {
    /// Point the client at a different service, e.g. from a CLI flag.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let base_url =
            env::var("TEACHABLE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let storage_path = env::var("TEACHABLE_STORAGE_PATH").unwrap_or("./".to_string());
        let user_cache_path = PathBuf::from(&storage_path).join("user.json");
        let welcome_message = env::var("TEACHABLE_WELCOME_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_WELCOME_MESSAGE.to_string());

        Self {
            base_url,
            storage_path,
            user_cache_path,
            welcome_message,
        }
    }
}
