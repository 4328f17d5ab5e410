pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_EXTENDED_API_URL: &str = "https://api.deepseek.com/beta/chat/completions";

/// Which transport adapter talks to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Server-sent-event streaming against `{base_url}/chat/completions`.
    Stream,
    /// Single JSON POST to a full endpoint URL.
    Http,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseClientTypeError {
    message: String,
}

impl fmt::Display for ParseClientTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseClientTypeError {}
impl FromStr for ClientType {
    type Err = ParseClientTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stream" | "sdk" => Ok(ClientType::Stream),
            "http" => Ok(ClientType::Http),
            _ =>
                Err(ParseClientTypeError {
                    message: format!("Invalid chat client type: '{}' (expected stream or http)", s),
                }),
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientType::Stream => write!(f, "stream"),
            ClientType::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub client_type: ClientType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub api_url: Option<String>,
    pub extended_api_url: Option<String>,
    pub use_extended_context: bool,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            client_type: ClientType::Stream,
            api_key: None,
            completion_model: None,
            base_url: None,
            api_url: None,
            extended_api_url: None,
            use_extended_context: false,
            request_timeout_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_type_parses_known_names() {
        assert_eq!("stream".parse::<ClientType>().unwrap(), ClientType::Stream);
        assert_eq!("SDK".parse::<ClientType>().unwrap(), ClientType::Stream);
        assert_eq!("Http".parse::<ClientType>().unwrap(), ClientType::Http);
        assert!("grpc".parse::<ClientType>().is_err());
    }
}
