use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, Update, User};

const API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 60;

/// The slice of the Bot API the ingress side needs.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct BotClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

impl BotClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(API_BASE, token)
    }

    pub fn with_base_url(api_base: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call::<(), User>("getMe", None).await
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: Option<&B>) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let request = match body {
            Some(body) => self.http.post(&url).json(body),
            None => self.http.get(&url),
        };

        // error replies carry a JSON body too, so the status code is not checked here
        let response: ApiResponse<T> = request.send().await?.json().await?;

        match response {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{} returned no result", method)),
            )),
        }
    }
}

#[async_trait]
impl ChatApi for BotClient {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: POLL_TIMEOUT_SECS,
        };
        self.call("getUpdates", Some(&body)).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = SendMessage { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", Some(&body)).await?;
        Ok(())
    }
}
