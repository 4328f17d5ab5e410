use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{
    build_http_client,
    http_stream_generate,
    parse_sse_line,
    status_error,
    validate_url,
    ChatClient,
    CompletionResponse,
    TextStream,
};
use crate::error::BoxError;
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL };
use crate::models::chat::CompletionRequest;

/// OpenAI-compatible client that streams `chat.completion.chunk` events.
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout_secs: u64
    ) -> Result<Self, BoxError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = validate_url(&base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))?;
        let http = build_http_client(&api_key, timeout_secs)?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        Self::new(
            config.api_key.clone().unwrap_or_default(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.request_timeout_secs
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, BoxError> {
        let req = CompletionRequest { stream: false, ..request.clone() };

        let resp = self.http.post(self.completions_url()).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let resp = resp.json::<OpenAIResponse>().await?;

        let content = resp.choices
            .into_iter()
            .next()
            .ok_or_else(|| "No response from chat completion API".to_string())?
            .message.content
            .unwrap_or_default();

        Ok(CompletionResponse { response: content })
    }

    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream, BoxError> {
        let req = CompletionRequest { stream: true, ..request.clone() };
        let url = self.completions_url();
        info!("Starting chat stream request to {}", url);
        http_stream_generate(self.http.clone(), url, req, parse_sse_line).await
    }

    fn get_api_key(&self) -> String {
        self.api_key.clone()
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
