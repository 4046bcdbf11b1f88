//! GigaChat API client
//!
//! One client per analysis task: it is built from the settings handed to
//! the dispatcher, obtains a token, asks a single question and is dropped.

use crate::config::Settings;
use crate::error::HabitError;
use crate::models::AccessToken;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub const AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const CHAT_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "GigaChat";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GigaChatClient {
    client: Client,
    credentials: String,
    scope: String,
}

impl GigaChatClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        if !settings.has_credentials() {
            return Err(HabitError::ConfigError(
                "GigaChat credentials not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!settings.verify_ssl_certs)
            .build()?;

        Ok(Self {
            client,
            credentials: settings.giga_credentials.trim().to_string(),
            scope: settings.scope.as_str().to_string(),
        })
    }

    /// Exchange the authorization key for an access token
    pub async fn get_token(&self) -> Result<AccessToken> {
        info!(scope = %self.scope, "Requesting GigaChat access token");

        let response = self
            .client
            .post(AUTH_URL)
            .header("Authorization", format!("Basic {}", self.credentials))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("GigaChat auth request failed: {}", e);
                HabitError::AnalysisFailure(format!("GigaChat auth error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "GigaChat auth error response: {}", error_text);
            return Err(HabitError::AnalysisFailure(format!(
                "GigaChat auth error ({}): {}",
                status, error_text
            )));
        }

        response.json::<AccessToken>().await.map_err(|e| {
            error!("Failed to parse GigaChat token: {}", e);
            HabitError::AnalysisFailure(format!("GigaChat token parse error: {}", e))
        })
    }

    /// Ask a single question, returning the trimmed answer
    pub async fn chat(&self, token: &AccessToken, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        info!("Calling GigaChat API");

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&token.value)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("GigaChat API request failed: {}", e);
                HabitError::AnalysisFailure(format!("GigaChat API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "GigaChat API error response: {}", error_text);
            return Err(HabitError::AnalysisFailure(format!(
                "GigaChat API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse GigaChat response: {}", e);
            HabitError::AnalysisFailure(format!("GigaChat parse error: {}", e))
        })?;

        let answer = extract_answer(chat_response)?;
        info!(chars = answer.len(), "GigaChat response received");
        Ok(answer)
    }
}

fn extract_answer(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| HabitError::AnalysisFailure("No response from GigaChat API".to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}
