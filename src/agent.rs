use futures::StreamExt;
use log::{ error, info };
use std::sync::Arc;

use crate::cli::Args;
use crate::config::prompt::{ self, PromptOptions };
use crate::error::{ BoxError, ChatError };
use crate::llm::chat::{ new_client as new_chat_client, ChatClient, TextStream };
use crate::llm::{ ClientType, LlmConfig };
use crate::models::chat::{ ChatMessage, CompletionRequest };
use crate::session::SessionState;

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub prompt: PromptOptions,
    /// Ask the provider for incremental fragments instead of one JSON answer.
    pub stream: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            prompt: PromptOptions::default(),
            stream: true,
        }
    }
}

/// Turns a session plus one user message into a completion call.
///
/// The agent holds no per-session data, so one instance is shared by every session.
#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    options: AgentOptions,
}

impl ChatAgent {
    pub fn new(chat_client: Arc<dyn ChatClient>, options: AgentOptions) -> Self {
        Self { chat_client, options }
    }

    pub fn from_args(args: &Args) -> Result<Self, BoxError> {
        let client_type: ClientType = args.chat_client_type.parse()?;
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            client_type,
            api_key: chat_api_key,
            completion_model: Some(args.chat_model.clone()),
            base_url: Some(args.chat_base_url.clone()),
            api_url: Some(args.chat_api_url.clone()),
            extended_api_url: Some(args.chat_extended_api_url.clone()),
            use_extended_context: args.extended_context,
            request_timeout_secs: args.request_timeout_secs,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, URL={}",
            client_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let options = AgentOptions {
            prompt: PromptOptions {
                max_file_context_chars: args.max_file_context_chars,
                file_reader_mode: args.file_reader,
            },
            stream: !args.disable_streaming,
        };
        Ok(Self::new(chat_client, options))
    }

    pub fn model(&self) -> String {
        self.chat_client.get_model()
    }

    /// System message first, then the stored history, then the new user message.
    pub fn build_request(&self, state: &SessionState, user_input: &str) -> CompletionRequest {
        let system_content = prompt::compose(
            state.default_prompt(),
            state.file_context(),
            state.skip_default_prompt(),
            &self.options.prompt
        );

        let mut messages = Vec::with_capacity(state.history().len() + 2);
        messages.push(ChatMessage::system(system_content));
        messages.extend(state.history().iter().cloned());
        messages.push(ChatMessage::user(user_input));

        CompletionRequest {
            model: self.chat_client.get_model(),
            messages,
            temperature: state.temperature(),
            stream: self.options.stream,
        }
    }

    /// Validates the input and dispatches the request. Nothing is recorded in
    /// `state` until [`PendingReply::finish`] succeeds.
    pub async fn begin(
        &self,
        state: &SessionState,
        user_input: &str
    ) -> Result<PendingReply, ChatError> {
        if user_input.trim().is_empty() {
            return Err(ChatError::Validation("Please enter a prompt.".to_string()));
        }
        if self.chat_client.get_api_key().is_empty() {
            return Err(
                ChatError::Configuration(
                    "API key is not set; provide --chat-api-key or DEEPSEEK_API_KEY".to_string()
                )
            );
        }

        let request = self.build_request(state, user_input);
        info!(
            "Submitting {} message(s) to {} (temperature: {:?}, stream: {})",
            request.messages.len(),
            request.model,
            request.temperature,
            request.stream
        );

        let fragments: TextStream = if request.stream {
            self.chat_client.stream_completion(&request).await.map_err(|e| {
                error!("Chat stream request failed: {}", e);
                ChatError::remote(e)
            })?
        } else {
            let resp = self.chat_client.complete(&request).await.map_err(|e| {
                error!("Chat completion request failed: {}", e);
                ChatError::remote(e)
            })?;
            Box::pin(futures::stream::once(async move { Ok(resp.response) }))
        };

        Ok(PendingReply {
            user_input: user_input.to_string(),
            fragments,
            reply: String::new(),
            error: None,
            finished: false,
        })
    }

    /// Runs one full exchange, handing every cumulative partial reply to `on_partial`.
    pub async fn submit<F>(
        &self,
        state: &mut SessionState,
        user_input: &str,
        mut on_partial: F
    ) -> Result<String, ChatError>
        where F: FnMut(&str)
    {
        let mut pending = self.begin(state, user_input).await?;
        while let Some(partial) = pending.next_partial().await {
            on_partial(partial?);
        }
        pending.finish(state).await
    }
}

/// A dispatched request whose reply is still arriving.
///
/// The fragment stream is consumed once; dropping the value abandons the exchange.
pub struct PendingReply {
    user_input: String,
    fragments: TextStream,
    reply: String,
    error: Option<ChatError>,
    finished: bool,
}

impl PendingReply {
    pub fn reply_so_far(&self) -> &str {
        &self.reply
    }

    /// Appends the next fragment and returns the reply received so far.
    pub async fn next_partial(&mut self) -> Option<Result<&str, ChatError>> {
        if self.finished {
            return None;
        }
        match self.fragments.next().await {
            Some(Ok(fragment)) => {
                self.reply.push_str(&fragment);
                Some(Ok(&self.reply))
            }
            Some(Err(e)) => {
                error!("Stream error: {}", e);
                let err = ChatError::remote(e);
                self.error = Some(err.clone());
                self.finished = true;
                Some(Err(err))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Drains the stream and records the exchange in `state`. A failed stream
    /// leaves the history untouched.
    pub async fn finish(mut self, state: &mut SessionState) -> Result<String, ChatError> {
        while let Some(partial) = self.next_partial().await {
            partial?;
        }
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        state.push_exchange(&self.user_input, &self.reply);
        Ok(self.reply)
    }
}
