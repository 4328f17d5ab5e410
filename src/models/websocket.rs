use serde::{ Serialize, Deserialize };

use super::chat::ChatMessage;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "upload")] Upload {
        filename: String,
        #[serde(default)]
        mime_type: Option<String>,
        /// Base64-encoded file bytes.
        data: String,
    },
    #[serde(rename = "set_default_prompt")] SetDefaultPrompt {
        prompt: String,
    },
    #[serde(rename = "clear_default_prompt")]
    ClearDefaultPrompt,
    #[serde(rename = "select_task")] SelectTask {
        task: String,
    },
    #[serde(rename = "skip_default_prompt")] SkipDefaultPrompt {
        enabled: bool,
    },
    #[serde(rename = "clear_history")]
    ClearHistory,
    #[serde(rename = "get_history")]
    GetHistory,
    #[serde(rename = "get_file")]
    GetFile,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "partial")] Partial {
        content: String,
    },
    #[serde(rename = "response")] Response {
        content: String,
        timestamp: i64,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
    #[serde(rename = "ack")] Ack {
        action: String,
    },
    #[serde(rename = "file_loaded")] FileLoaded {
        filename: String,
        chars: usize,
    },
    #[serde(rename = "history")] History {
        messages: Vec<ChatMessage>,
    },
    #[serde(rename = "file")] File {
        content: String,
    },
}
