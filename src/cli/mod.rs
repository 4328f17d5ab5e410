use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the chat completion provider
    #[arg(long, env = "DEEPSEEK_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Transport used for chat completion (stream, http)
    #[arg(long, env = "CHAT_CLIENT_TYPE", default_value = "stream")]
    pub chat_client_type: String,

    /// Model name for chat completion
    #[arg(long, env = "CHAT_MODEL", default_value = "deepseek-chat")]
    pub chat_model: String,

    /// Base URL for the streaming client; `/chat/completions` is appended
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.deepseek.com")]
    pub chat_base_url: String,

    /// Full endpoint URL for the http client
    #[arg(long, env = "CHAT_API_URL", default_value = "https://api.deepseek.com/chat/completions")]
    pub chat_api_url: String,

    /// Full extended-context endpoint URL for the http client
    #[arg(
        long,
        env = "CHAT_EXTENDED_API_URL",
        default_value = "https://api.deepseek.com/beta/chat/completions"
    )]
    pub chat_extended_api_url: String,

    /// Send http client requests to the extended-context endpoint
    #[arg(long, env = "EXTENDED_CONTEXT", default_value = "false")]
    pub extended_context: bool,

    /// Request one JSON answer instead of a streamed reply
    #[arg(long, env = "DISABLE_STREAMING", default_value = "false")]
    pub disable_streaming: bool,

    /// HTTP request timeout in seconds. 0 means no timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "0")]
    pub request_timeout_secs: u64,

    // --- Prompt Args ---
    /// Answer only from the uploaded file, with a fixed reply when it has no answer
    #[arg(long, env = "FILE_READER_MODE", default_value = "false")]
    pub file_reader: bool,

    /// Maximum number of file characters placed in the system message
    #[arg(long, env = "MAX_FILE_CONTEXT_CHARS", default_value = "5000")]
    pub max_file_context_chars: usize,

    /// Default prompt every new session starts with
    #[arg(long, env = "DEFAULT_PROMPT")]
    pub default_prompt: Option<String>,

    /// Task type every new session starts with (e.g. "Coding/Math Questions")
    #[arg(long, env = "TASK_TYPE")]
    pub task_type: Option<String>,

    // --- General App Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Chat in this terminal instead of starting the WebSocket server
    #[arg(long, env = "INTERACTIVE", default_value = "false")]
    pub interactive: bool,

    /// File (pdf, docx, txt) loaded into the terminal session on start
    #[arg(long, env = "DOC_FILE")]
    pub file: Option<PathBuf>,
}
