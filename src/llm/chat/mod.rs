pub mod http;
pub mod openai;

use async_trait::async_trait;
use futures::{ Stream, StreamExt };
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use super::{ ClientType, LlmConfig };
use self::http::HttpChatClient;
use self::openai::OpenAIChatClient;
use crate::error::BoxError;
use crate::models::chat::CompletionRequest;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, BoxError>> + Send>>;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, BoxError>;

    /// Fragments in arrival order. Clients without native streaming deliver the
    /// whole completion as one fragment.
    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream, BoxError> {
        let resp = self.complete(request).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(resp.response) })))
    }

    fn get_api_key(&self) -> String;
    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

/// What one line of an SSE body means for the fragment stream.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamLine {
    Token(String),
    /// A well-formed event that carries no text, such as the opening role delta.
    Event,
    Done,
    /// Blank lines, comments and anything that is not a parseable event.
    Skip,
}

#[derive(Deserialize)]
struct ChunkResponse {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    #[serde(rename = "finish_reason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Parses one line of an OpenAI-compatible `chat.completion.chunk` stream.
pub fn parse_sse_line(line: &str) -> StreamLine {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') {
        return StreamLine::Skip;
    }
    let Some(data) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<ChunkResponse>(data) {
        Ok(chunk) => {
            let mut token = String::new();
            let mut stop = false;
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content {
                    token.push_str(&content);
                }
                if choice.finish_reason.as_deref() == Some("stop") {
                    stop = true;
                }
            }
            if !token.is_empty() {
                // a final chunk may carry both content and the stop reason;
                // the trailing [DONE] or end of body closes the stream.
                StreamLine::Token(token)
            } else if stop {
                StreamLine::Done
            } else {
                StreamLine::Event
            }
        }
        Err(e) => {
            warn!("JSON parse error: {} for data: {}", e, data);
            StreamLine::Skip
        }
    }
}

/// POSTs `payload` and turns the line-oriented response body into a fragment stream.
///
/// Lines are reassembled across network chunks before `line_parser` sees them,
/// so a JSON event split over two reads is still parsed whole. A body that ends
/// without a single parseable event is reported as a malformed response.
pub async fn http_stream_generate(
    client: HttpClient,
    url: String,
    payload: impl serde::Serialize + Send + 'static,
    line_parser: fn(&str) -> StreamLine
) -> Result<TextStream, BoxError> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let resp = match client.post(&url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                let _ = tx.send(Err(Box::new(e) as _)).await;
                return;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let _ = tx.send(Err(status_error(status, &body))).await;
            return;
        }

        let mut bytes = resp.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut unparsed = UnparsedBody::default();

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(buf) => {
                    pending.extend_from_slice(&buf);
                    while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                        let raw: Vec<u8> = pending.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
                        debug!("Stream line: {}", line);
                        match line_parser(&line) {
                            StreamLine::Token(tok) => {
                                unparsed.saw_event = true;
                                if tx.send(Ok(tok)).await.is_err() {
                                    return;
                                }
                            }
                            StreamLine::Event => {
                                unparsed.saw_event = true;
                            }
                            StreamLine::Done => {
                                return;
                            }
                            StreamLine::Skip => unparsed.record(&line),
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(Box::new(e) as _)).await;
                    return;
                }
            }
        }

        if !pending.is_empty() {
            let line = String::from_utf8_lossy(&pending);
            match line_parser(&line) {
                StreamLine::Token(tok) => {
                    let _ = tx.send(Ok(tok)).await;
                    return;
                }
                StreamLine::Event | StreamLine::Done => {
                    return;
                }
                StreamLine::Skip => unparsed.record(&line),
            }
        }

        if !unparsed.saw_event {
            let _ = tx.send(Err(unparsed.into_error())).await;
        }
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

/// Non-event lines kept for the error message when a stream never produces an event.
#[derive(Default)]
struct UnparsedBody {
    saw_event: bool,
    sample: String,
}

impl UnparsedBody {
    const MAX_SAMPLE_CHARS: usize = 512;

    fn record(&mut self, line: &str) {
        let line = line.trim();
        if self.saw_event || line.is_empty() || line.starts_with(':') {
            return;
        }
        let room = Self::MAX_SAMPLE_CHARS.saturating_sub(self.sample.chars().count());
        if room == 0 {
            return;
        }
        if !self.sample.is_empty() {
            self.sample.push(' ');
        }
        self.sample.extend(line.chars().take(room));
    }

    fn into_error(self) -> BoxError {
        if self.sample.is_empty() {
            "Malformed response from chat completion stream: no events received".into()
        } else {
            format!("Malformed response from chat completion stream: {}", self.sample).into()
        }
    }
}

pub fn status_error(status: reqwest::StatusCode, body: &str) -> BoxError {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP error: {}", status).into()
    } else {
        format!("HTTP error: {}: {}", status, body).into()
    }
}

/// Shared reqwest client with JSON and bearer headers. An empty key sends no
/// `Authorization` header; the session rejects such submissions before any call.
pub fn build_http_client(api_key: &str, timeout_secs: u64) -> Result<HttpClient, BoxError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !api_key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                format!("Invalid API key format: {}", e)
            )?
        );
    }

    let mut builder = HttpClient::builder().default_headers(headers);
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder.build().map_err(|e| Box::new(e) as BoxError)
}

pub fn validate_url(url: &str) -> Result<String, BoxError> {
    Url::parse(url).map_err(|e| format!("Invalid endpoint URL '{}': {}", url, e))?;
    Ok(url.to_string())
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, BoxError> {
    let client: Arc<dyn ChatClient> = match config.client_type {
        ClientType::Stream => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        ClientType::Http => {
            let specific_client = HttpChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
