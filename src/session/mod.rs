use log::info;

use crate::cli::Args;
use crate::config::task::TaskType;
use crate::error::ChatError;
use crate::extract;
use crate::models::chat::ChatMessage;

/// Everything one user's session remembers between submissions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    history: Vec<ChatMessage>,
    file_context: Option<String>,
    default_prompt: String,
    temperature: Option<f32>,
    task: Option<TaskType>,
    skip_default_prompt: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn file_context(&self) -> Option<&str> {
        self.file_context.as_deref()
    }

    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn task(&self) -> Option<TaskType> {
        self.task
    }

    pub fn skip_default_prompt(&self) -> bool {
        self.skip_default_prompt
    }

    pub fn set_default_prompt(&mut self, prompt: impl Into<String>) {
        self.default_prompt = prompt.into();
    }

    pub fn clear_default_prompt(&mut self) {
        self.default_prompt.clear();
    }

    /// Replaces the document text. Empty text leaves the session without file context.
    pub fn set_file_context(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.file_context = if text.is_empty() { None } else { Some(text) };
    }

    pub fn clear_file_context(&mut self) {
        self.file_context = None;
    }

    pub fn set_skip_default_prompt(&mut self, skip: bool) {
        self.skip_default_prompt = skip;
    }

    /// Stores the task's temperature, overriding any earlier choice.
    pub fn select_task(&mut self, task: TaskType) {
        self.task = Some(task);
        self.temperature = Some(task.temperature());
    }

    /// Only the transcript is dropped; file context and default prompt survive.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Extracts `data` into the file context and returns the number of characters loaded.
    ///
    /// On failure the file context is emptied and the error is handed back for
    /// reporting; the session stays usable.
    pub fn load_file(&mut self, data: &[u8], mime_type: &str) -> Result<usize, ChatError> {
        match extract::read_file(data, mime_type) {
            Ok(text) => {
                let chars = text.chars().count();
                info!("Loaded {} characters of file context ({})", chars, mime_type);
                self.set_file_context(text);
                Ok(chars)
            }
            Err(e) => {
                self.clear_file_context();
                Err(e)
            }
        }
    }

    pub(crate) fn push_exchange(&mut self, user_input: &str, reply: &str) {
        self.history.push(ChatMessage::user(user_input));
        self.history.push(ChatMessage::assistant(reply));
    }
}

/// Settings every new session starts from.
#[derive(Debug, Clone, Default)]
pub struct SessionDefaults {
    pub default_prompt: Option<String>,
    pub task: Option<TaskType>,
}

impl SessionDefaults {
    pub fn from_args(args: &Args) -> Result<Self, ChatError> {
        let task = match args.task_type.as_deref() {
            Some(label) if !label.trim().is_empty() => Some(label.parse::<TaskType>()?),
            _ => None,
        };
        Ok(Self {
            default_prompt: args.default_prompt.clone().filter(|p| !p.is_empty()),
            task,
        })
    }

    pub fn new_session(&self) -> SessionState {
        let mut state = SessionState::new();
        if let Some(prompt) = &self.default_prompt {
            state.set_default_prompt(prompt.clone());
        }
        if let Some(task) = self.task {
            state.select_task(task);
        }
        state
    }
}
