//! Typed client for the chat service. One `reqwest::Client` is shared by
//! every call so the service's session cookie set at sign in is sent
//! with everything after it.

use std::sync::Arc;

use anyhow::{Context, Error, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Response, Url};

use super::public::{
    AuthResponse, ChatRequest, ChatsResponse, CreateChatRequest, CreateChatResponse,
    DeleteChatRequest, ImageRequest, RenameChatRequest, SignInRequest, SignUpRequest,
    SuccessResponse, UserInfo,
};

#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    cookies: Arc<Jar>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            base_url,
            http,
            cookies,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&url).with_context(|| format!("Invalid endpoint URL: {}", url))
    }

    /// The cookies the service has set, as a `Cookie` header value.
    pub fn session_cookie(&self) -> Option<String> {
        self.cookies
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    /// Load cookies previously returned by [`ApiClient::session_cookie`].
    pub fn restore_session_cookie(&self, cookie: &str) {
        for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.cookies.add_cookie_str(pair, &self.base_url);
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        tracing::debug!("POST /signin for {}", email);
        let resp = self
            .http
            .post(self.url("/signin")?)
            .json(&SignInRequest { email, password })
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, Error> {
        tracing::debug!("POST /signup for {}", email);
        let resp = self
            .http
            .post(self.url("/signup")?)
            .json(&SignUpRequest {
                username,
                email,
                password,
            })
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    pub async fn get_chats(&self) -> Result<ChatsResponse, Error> {
        let resp = self
            .http
            .get(self.url("/get_chats")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    pub async fn create_chat(&self, name: &str) -> Result<CreateChatResponse, Error> {
        let resp = self
            .http
            .post(self.url("/create_chat")?)
            .json(&CreateChatRequest { name })
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    /// Returns whether the service accepted the new title.
    pub async fn rename_chat(&self, chat_id: &str, new_title: &str) -> Result<bool, Error> {
        let resp = self
            .http
            .post(self.url("/rename_chat")?)
            .json(&RenameChatRequest { chat_id, new_title })
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<SuccessResponse, Error> {
        let resp = self
            .http
            .post(self.url("/delete_chat")?)
            .json(&DeleteChatRequest { chat_id })
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    pub async fn get_user_info(&self) -> Result<UserInfo, Error> {
        let resp = self
            .http
            .get(self.url("/get_user_info")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    /// Send a chat message. The caller reads the streamed body and
    /// handles non-2xx statuses itself.
    pub async fn chat(&self, message: &str, chat_id: Option<&str>) -> Result<Response, Error> {
        tracing::debug!("POST /chat chat_id={:?}", chat_id);
        let resp = self
            .http
            .post(self.url("/chat")?)
            .json(&ChatRequest { message, chat_id })
            .send()
            .await?;
        Ok(resp)
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<Response, Error> {
        let resp = self
            .http
            .post(self.url("/generate_image")?)
            .json(&ImageRequest { prompt })
            .send()
            .await?;
        Ok(resp)
    }

    pub async fn logout(&self) -> Result<(), Error> {
        self.http.get(self.url("/logout")?).send().await?;
        Ok(())
    }
}
