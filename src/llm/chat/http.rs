use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{ build_http_client, status_error, validate_url, ChatClient, CompletionResponse };
use crate::error::BoxError;
use crate::llm::{ LlmConfig, DEFAULT_API_URL, DEFAULT_EXTENDED_API_URL, DEFAULT_MODEL };
use crate::models::chat::CompletionRequest;

/// Posts the whole conversation to a fixed endpoint and reads one JSON answer.
pub struct HttpChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

#[derive(Deserialize)]
struct HttpResponse {
    choices: Vec<HttpChoice>,
}

#[derive(Deserialize)]
struct HttpChoice {
    message: HttpMessage,
}

#[derive(Deserialize)]
struct HttpMessage {
    content: Option<String>,
}

impl HttpChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        api_url: String,
        timeout_secs: u64
    ) -> Result<Self, BoxError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = validate_url(&api_url)?;
        let http = build_http_client(&api_key, timeout_secs)?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            api_url,
        })
    }

    /// Picks the extended-context endpoint when `use_extended_context` is set.
    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        let api_url = if config.use_extended_context {
            config.extended_api_url.clone().unwrap_or_else(|| DEFAULT_EXTENDED_API_URL.to_string())
        } else {
            config.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string())
        };

        Self::new(
            config.api_key.clone().unwrap_or_default(),
            config.completion_model.clone(),
            api_url,
            config.request_timeout_secs
        )
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, BoxError> {
        let req = CompletionRequest { stream: false, ..request.clone() };
        info!("Posting {} message(s) to {}", req.messages.len(), self.api_url);

        let resp = self.http.post(&self.api_url).json(&req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: HttpResponse = serde_json
            ::from_str(&body)
            .map_err(|e| format!("Malformed response from chat completion API: {}", e))?;

        let content = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| "No response from chat completion API".to_string())?;

        Ok(CompletionResponse { response: content })
    }

    fn get_api_key(&self) -> String {
        self.api_key.clone()
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.api_url.clone())
    }
}
