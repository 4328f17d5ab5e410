#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{ Arc, Mutex };

use doc_chat::agent::{ AgentOptions, ChatAgent };
use doc_chat::error::BoxError;
use doc_chat::llm::chat::{ ChatClient, CompletionResponse, TextStream };
use doc_chat::models::chat::CompletionRequest;

/// One scripted provider answer.
#[derive(Clone, Debug)]
pub enum Reply {
    Fragments(Vec<&'static str>),
    /// Streams the fragments, then fails mid-stream.
    FailAfter(Vec<&'static str>, &'static str),
    /// Fails before any fragment is produced.
    Reject(&'static str),
}

/// Chat client that records every request and plays back scripted replies.
#[derive(Clone)]
pub struct MockChatClient {
    api_key: String,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockChatClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            api_key: "test-key".to_string(),
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn without_key(mut self) -> Self {
        self.api_key.clear();
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        self.replies.lock().unwrap().pop_front().expect("no scripted reply left")
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, BoxError> {
        match self.next_reply(request) {
            Reply::Fragments(parts) => Ok(CompletionResponse { response: parts.concat() }),
            Reply::FailAfter(_, message) | Reply::Reject(message) => Err(message.into()),
        }
    }

    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream, BoxError> {
        let items: Vec<Result<String, BoxError>> = match self.next_reply(request) {
            Reply::Fragments(parts) => parts.into_iter().map(|p| Ok(p.to_string())).collect(),
            Reply::FailAfter(parts, message) => {
                let mut items: Vec<Result<String, BoxError>> = parts
                    .into_iter()
                    .map(|p| Ok(p.to_string()))
                    .collect();
                items.push(Err(message.into()));
                items
            }
            Reply::Reject(message) => {
                return Err(message.into());
            }
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn get_api_key(&self) -> String {
        self.api_key.clone()
    }

    fn get_model(&self) -> String {
        "deepseek-chat".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

pub fn agent_with(client: &MockChatClient) -> ChatAgent {
    ChatAgent::new(Arc::new(client.clone()), AgentOptions::default())
}
